// ============================================================================
// Otica Infrastructure - MySQL Client Repository
// File: crates/otica-infrastructure/src/database/mysql/client_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use otica_core::domain::{Client, ClientInput, ListQuery};
use otica_core::error::DomainError;
use otica_core::repositories::ClientRepository;
use otica_shared::{EntityId, Page};

use super::support::{db_error, like_pattern, push_page, write_error};

const CLIENT_COLUMNS: &str =
    "id, name, cpf, phone, email, birth_date, address, notes, created_at, updated_at";

pub struct MySqlClientRepository {
    pool: MySqlPool,
}

impl MySqlClientRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: i64,
    name: String,
    cpf: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    birth_date: Option<NaiveDate>,
    address: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            cpf: row.cpf,
            phone: row.phone,
            email: row.email,
            birth_date: row.birth_date,
            address: row.address,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_search(builder: &mut QueryBuilder<'_, MySql>, query: &ListQuery) {
    builder.push(" WHERE deleted_at IS NULL");
    if let Some(term) = query.search() {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR cpf LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ClientRepository for MySqlClientRepository {
    async fn list(&self, query: &ListQuery) -> Result<Page<Client>, DomainError> {
        let pagination = query.pagination();

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM clients");
        push_search(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting clients"))?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {} FROM clients", CLIENT_COLUMNS));
        push_search(&mut select, query);
        select.push(" ORDER BY name, id");
        push_page(&mut select, pagination);
        let rows: Vec<ClientRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing clients"))?;

        Ok(Page::new(rows.into_iter().map(Client::from).collect(), total, pagination))
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Client>, DomainError> {
        let row: Option<ClientRow> = sqlx::query_as(&format!(
            "SELECT {} FROM clients WHERE id = ? AND deleted_at IS NULL",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding client by id"))?;

        Ok(row.map(Client::from))
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Client>, DomainError> {
        let row: Option<ClientRow> = sqlx::query_as(&format!(
            "SELECT {} FROM clients WHERE cpf = ? AND deleted_at IS NULL",
            CLIENT_COLUMNS
        ))
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding client by cpf"))?;

        Ok(row.map(Client::from))
    }

    async fn create(&self, input: &ClientInput) -> Result<EntityId, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO clients (name, cpf, phone, email, birth_date, address, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.cpf)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.birth_date)
        .bind(&input.address)
        .bind(&input.notes)
        .execute(&self.pool)
        .await
        .map_err(write_error("creating client", "a client with this CPF already exists"))?;

        Ok(result.last_insert_id() as EntityId)
    }

    async fn update(&self, id: EntityId, input: &ClientInput) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = ?, cpf = ?, phone = ?, email = ?, birth_date = ?, address = ?, notes = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&input.name)
        .bind(&input.cpf)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.birth_date)
        .bind(&input.address)
        .bind(&input.notes)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(write_error("updating client", "a client with this CPF already exists"))?;

        Ok(result.rows_affected() > 0 || self.find_by_id(id).await?.is_some())
    }

    async fn delete(&self, id: EntityId) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE clients SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting client"))?;

        Ok(result.rows_affected() > 0)
    }
}
