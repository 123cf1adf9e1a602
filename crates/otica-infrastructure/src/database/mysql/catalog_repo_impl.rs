//! MySQL catalog repository. Table names come from `CatalogKind::table`, never from input.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use otica_core::domain::{CatalogInput, CatalogItem, CatalogKind, ListQuery};
use otica_core::error::DomainError;
use otica_core::repositories::CatalogRepository;
use otica_shared::{EntityId, Page};

use super::support::{db_error, like_pattern, push_id_list, push_page, write_error};

const CATALOG_COLUMNS: &str = "id, name, description, active, created_at, updated_at";

pub struct MySqlCatalogRepository {
    pool: MySqlPool,
}

impl MySqlCatalogRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CatalogRow {
    id: i64,
    name: String,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CatalogRow> for CatalogItem {
    fn from(row: CatalogRow) -> Self {
        CatalogItem {
            id: row.id,
            name: row.name,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn duplicate_name(kind: CatalogKind, name: &str) -> String {
    format!("{} '{}' already exists", kind.label(), name)
}

#[async_trait]
impl CatalogRepository for MySqlCatalogRepository {
    async fn list(&self, kind: CatalogKind, query: &ListQuery) -> Result<Page<CatalogItem>, DomainError> {
        let pagination = query.pagination();
        let pattern = query.search().map(like_pattern);

        let mut count = QueryBuilder::<MySql>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
            kind.table()
        ));
        if let Some(pattern) = &pattern {
            count.push(" AND name LIKE ").push_bind(pattern.clone());
        }
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting catalog items"))?;

        let mut select = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM {} WHERE deleted_at IS NULL",
            CATALOG_COLUMNS,
            kind.table()
        ));
        if let Some(pattern) = pattern {
            select.push(" AND name LIKE ").push_bind(pattern);
        }
        select.push(" ORDER BY name, id");
        push_page(&mut select, pagination);
        let rows: Vec<CatalogRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing catalog items"))?;

        Ok(Page::new(rows.into_iter().map(CatalogItem::from).collect(), total, pagination))
    }

    async fn find_by_id(&self, kind: CatalogKind, id: EntityId) -> Result<Option<CatalogItem>, DomainError> {
        let row: Option<CatalogRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE id = ? AND deleted_at IS NULL",
            CATALOG_COLUMNS,
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding catalog item by id"))?;

        Ok(row.map(CatalogItem::from))
    }

    async fn find_by_name(&self, kind: CatalogKind, name: &str) -> Result<Option<CatalogItem>, DomainError> {
        let row: Option<CatalogRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE name = ? AND deleted_at IS NULL",
            CATALOG_COLUMNS,
            kind.table()
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding catalog item by name"))?;

        Ok(row.map(CatalogItem::from))
    }

    async fn count_existing(&self, kind: CatalogKind, ids: &[EntityId]) -> Result<i64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL AND id IN ",
            kind.table()
        ));
        push_id_list(&mut builder, ids);

        builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting catalog ids"))
    }

    async fn create(&self, kind: CatalogKind, input: &CatalogInput) -> Result<EntityId, DomainError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (name, description, active) VALUES (?, ?, ?)",
            kind.table()
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.active)
        .execute(&self.pool)
        .await
        .map_err(write_error("creating catalog item", duplicate_name(kind, &input.name)))?;

        Ok(result.last_insert_id() as EntityId)
    }

    async fn update(&self, kind: CatalogKind, id: EntityId, input: &CatalogInput) -> Result<bool, DomainError> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET name = ?, description = ?, active = ? WHERE id = ? AND deleted_at IS NULL",
            kind.table()
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.active)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(write_error("updating catalog item", duplicate_name(kind, &input.name)))?;

        Ok(result.rows_affected() > 0 || self.find_by_id(kind, id).await?.is_some())
    }

    async fn delete(&self, kind: CatalogKind, id: EntityId) -> Result<bool, DomainError> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL",
            kind.table()
        ))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error("deleting catalog item"))?;

        Ok(result.rows_affected() > 0)
    }
}
