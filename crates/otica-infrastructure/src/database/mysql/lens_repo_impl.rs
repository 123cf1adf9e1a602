// ============================================================================
// Otica Infrastructure - MySQL Lens Repository
// File: crates/otica-infrastructure/src/database/mysql/lens_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use tracing::info;

use otica_core::domain::{Lens, LensFilter, LensInput, PriceAdjustment};
use otica_core::error::DomainError;
use otica_core::repositories::LensRepository;
use otica_shared::{EntityId, Page, Pagination};

use super::support::{db_error, like_pattern, push_id_list, push_page, write_error};

const LENS_SELECT: &str = r#"
    SELECT
        l.id, l.code, l.description,
        l.family_id, f.name AS family_name,
        l.supplier_id, s.name AS supplier_name,
        l.index_id, i.name AS index_name,
        l.treatment_id, t.name AS treatment_name,
        l.cost_price, l.sale_price, l.active, l.created_at, l.updated_at
    FROM lenses l
    LEFT JOIN lens_families f ON f.id = l.family_id
    LEFT JOIN suppliers s ON s.id = l.supplier_id
    LEFT JOIN lens_indices i ON i.id = l.index_id
    LEFT JOIN lens_treatments t ON t.id = l.treatment_id
"#;

pub struct MySqlLensRepository {
    pool: MySqlPool,
}

impl MySqlLensRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LensRow {
    id: i64,
    code: String,
    description: String,
    family_id: i64,
    family_name: Option<String>,
    supplier_id: Option<i64>,
    supplier_name: Option<String>,
    index_id: Option<i64>,
    index_name: Option<String>,
    treatment_id: Option<i64>,
    treatment_name: Option<String>,
    cost_price: Decimal,
    sale_price: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LensRow> for Lens {
    fn from(row: LensRow) -> Self {
        Lens {
            id: row.id,
            code: row.code,
            description: row.description,
            family_id: row.family_id,
            family_name: row.family_name,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            index_id: row.index_id,
            index_name: row.index_name,
            treatment_id: row.treatment_id,
            treatment_name: row.treatment_name,
            cost_price: row.cost_price,
            sale_price: row.sale_price,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &LensFilter) {
    builder.push(" WHERE l.deleted_at IS NULL");
    if let Some(term) = filter.search() {
        let pattern = like_pattern(&term);
        builder
            .push(" AND (l.code LIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.description LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    let columns = [
        ("l.family_id", filter.family_id),
        ("l.supplier_id", filter.supplier_id),
        ("l.index_id", filter.index_id),
        ("l.treatment_id", filter.treatment_id),
    ];
    for (column, value) in columns {
        if let Some(value) = value {
            builder.push(format!(" AND {} = ", column)).push_bind(value);
        }
    }
    if let Some(active) = filter.active {
        builder.push(" AND l.active = ").push_bind(active);
    }
}

const DUPLICATE_CODE: &str = "a lens with this code already exists";

#[async_trait]
impl LensRepository for MySqlLensRepository {
    async fn list(&self, filter: &LensFilter) -> Result<Page<Lens>, DomainError> {
        let pagination = Pagination::new(filter.page, filter.per_page);

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM lenses l");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting lenses"))?;

        let mut select = QueryBuilder::<MySql>::new(LENS_SELECT);
        push_filter(&mut select, filter);
        select.push(" ORDER BY l.description, l.id");
        push_page(&mut select, pagination);
        let rows: Vec<LensRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing lenses"))?;

        Ok(Page::new(rows.into_iter().map(Lens::from).collect(), total, pagination))
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Lens>, DomainError> {
        let row: Option<LensRow> = sqlx::query_as(&format!(
            "{} WHERE l.id = ? AND l.deleted_at IS NULL",
            LENS_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding lens by id"))?;

        Ok(row.map(Lens::from))
    }

    async fn find_by_ids(&self, ids: &[EntityId]) -> Result<Vec<Lens>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<MySql>::new(LENS_SELECT);
        builder.push(" WHERE l.deleted_at IS NULL AND l.id IN ");
        push_id_list(&mut builder, ids);

        let rows: Vec<LensRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("finding lenses by ids"))?;

        Ok(rows.into_iter().map(Lens::from).collect())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Lens>, DomainError> {
        let row: Option<LensRow> = sqlx::query_as(&format!(
            "{} WHERE l.code = ? AND l.deleted_at IS NULL",
            LENS_SELECT
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding lens by code"))?;

        Ok(row.map(Lens::from))
    }

    async fn create(&self, input: &LensInput) -> Result<EntityId, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO lenses
                (code, description, family_id, supplier_id, index_id, treatment_id,
                 cost_price, sale_price, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.code)
        .bind(&input.description)
        .bind(input.family_id)
        .bind(input.supplier_id)
        .bind(input.index_id)
        .bind(input.treatment_id)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .bind(input.active)
        .execute(&self.pool)
        .await
        .map_err(write_error("creating lens", DUPLICATE_CODE))?;

        Ok(result.last_insert_id() as EntityId)
    }

    async fn update(&self, id: EntityId, input: &LensInput) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE lenses
            SET code = ?, description = ?, family_id = ?, supplier_id = ?, index_id = ?,
                treatment_id = ?, cost_price = ?, sale_price = ?, active = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&input.code)
        .bind(&input.description)
        .bind(input.family_id)
        .bind(input.supplier_id)
        .bind(input.index_id)
        .bind(input.treatment_id)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .bind(input.active)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(write_error("updating lens", DUPLICATE_CODE))?;

        Ok(result.rows_affected() > 0 || self.find_by_id(id).await?.is_some())
    }

    async fn delete(&self, id: EntityId) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE lenses SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting lens"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn adjust_prices(&self, adjustment: &PriceAdjustment) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting price adjustment"))?;

        // 1. Lock the targeted rows
        let mut select = QueryBuilder::<MySql>::new(
            "SELECT id, sale_price FROM lenses WHERE deleted_at IS NULL",
        );
        if !adjustment.lens_ids.is_empty() {
            select.push(" AND id IN ");
            push_id_list(&mut select, &adjustment.lens_ids);
        }
        if let Some(family_id) = adjustment.family_id {
            select.push(" AND family_id = ").push_bind(family_id);
        }
        if let Some(supplier_id) = adjustment.supplier_id {
            select.push(" AND supplier_id = ").push_bind(supplier_id);
        }
        select.push(" ORDER BY id FOR UPDATE");

        let targets: Vec<(i64, Decimal)> = select
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error("selecting lenses to adjust"))?;

        // 2. Compute every new price first; one negative result aborts the batch
        let updates = targets
            .iter()
            .map(|(id, price)| adjustment.new_price(*id, *price).map(|new_price| (*id, new_price)))
            .collect::<Result<Vec<_>, _>>()?;

        // 3. Write
        for (id, new_price) in &updates {
            sqlx::query("UPDATE lenses SET sale_price = ? WHERE id = ?")
                .bind(new_price)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("updating lens price"))?;
        }

        tx.commit().await.map_err(db_error("committing price adjustment"))?;

        info!("Adjusted sale price of {} lenses", updates.len());
        Ok(updates.len() as u64)
    }
}
