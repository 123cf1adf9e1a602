//! MySQL supplier repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use otica_core::domain::{ListQuery, Supplier, SupplierInput};
use otica_core::error::DomainError;
use otica_core::repositories::SupplierRepository;
use otica_shared::{EntityId, Page};

use super::support::{db_error, like_pattern, push_page, write_error};

const SUPPLIER_COLUMNS: &str = "id, name, cnpj, phone, email, contact_name, created_at, updated_at";
const DUPLICATE: &str = "a supplier with this name or CNPJ already exists";

pub struct MySqlSupplierRepository {
    pool: MySqlPool,
}

impl MySqlSupplierRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &'static str, value: &str) -> Result<Option<Supplier>, DomainError> {
        let row: Option<SupplierRow> = sqlx::query_as(&format!(
            "SELECT {} FROM suppliers WHERE {} = ? AND deleted_at IS NULL",
            SUPPLIER_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding supplier"))?;

        Ok(row.map(Supplier::from))
    }
}

#[derive(Debug, FromRow)]
struct SupplierRow {
    id: i64,
    name: String,
    cnpj: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    contact_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            cnpj: row.cnpj,
            phone: row.phone,
            email: row.email,
            contact_name: row.contact_name,
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
            .push(" OR cnpj LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl SupplierRepository for MySqlSupplierRepository {
    async fn list(&self, query: &ListQuery) -> Result<Page<Supplier>, DomainError> {
        let pagination = query.pagination();

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM suppliers");
        push_search(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting suppliers"))?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {} FROM suppliers", SUPPLIER_COLUMNS));
        push_search(&mut select, query);
        select.push(" ORDER BY name, id");
        push_page(&mut select, pagination);
        let rows: Vec<SupplierRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing suppliers"))?;

        Ok(Page::new(rows.into_iter().map(Supplier::from).collect(), total, pagination))
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Supplier>, DomainError> {
        let row: Option<SupplierRow> = sqlx::query_as(&format!(
            "SELECT {} FROM suppliers WHERE id = ? AND deleted_at IS NULL",
            SUPPLIER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding supplier by id"))?;

        Ok(row.map(Supplier::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Supplier>, DomainError> {
        self.find_one("name", name).await
    }

    async fn find_by_cnpj(&self, cnpj: &str) -> Result<Option<Supplier>, DomainError> {
        self.find_one("cnpj", cnpj).await
    }

    async fn create(&self, input: &SupplierInput) -> Result<EntityId, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (name, cnpj, phone, email, contact_name)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.cnpj)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.contact_name)
        .execute(&self.pool)
        .await
        .map_err(write_error("creating supplier", DUPLICATE))?;

        Ok(result.last_insert_id() as EntityId)
    }

    async fn update(&self, id: EntityId, input: &SupplierInput) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?, cnpj = ?, phone = ?, email = ?, contact_name = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&input.name)
        .bind(&input.cnpj)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.contact_name)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(write_error("updating supplier", DUPLICATE))?;

        Ok(result.rows_affected() > 0 || self.find_by_id(id).await?.is_some())
    }

    async fn delete(&self, id: EntityId) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE suppliers SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting supplier"))?;

        Ok(result.rows_affected() > 0)
    }
}
