//! MySQL adapter for cash registers (caixa)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use tracing::warn;

use otica_core::domain::{
    CashRegister, CashRegisterClosing, CashRegisterStatus, CashRegisterSummary, CloseCashRegisterInput,
    ListQuery, NewCashRegister, PaymentMethodTotal, SaleStatus, SalesAggregate,
};
use otica_core::error::DomainError;
use otica_core::repositories::CashRegisterRepository;
use otica_shared::{EntityId, Page};

use super::support::{db_error, write_error};

const REGISTER_SELECT: &str = r#"
    SELECT
        r.id, r.status, r.opened_by, o.name AS opened_by_name, r.opened_at, r.opening_balance,
        r.closed_by, c.name AS closed_by_name, r.closed_at, r.closing_balance,
        r.expected_balance, r.difference, r.notes, r.created_at, r.updated_at
    FROM cash_registers r
    LEFT JOIN users o ON o.id = r.opened_by
    LEFT JOIN users c ON c.id = r.closed_by
"#;

const ALREADY_OPEN: &str = "a cash register is already open";

pub struct MySqlCashRegisterRepository {
    pool: MySqlPool,
}

impl MySqlCashRegisterRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, clause: &str, id: Option<EntityId>) -> Result<Option<CashRegister>, DomainError> {
        let sql = format!("{} WHERE {}", REGISTER_SELECT, clause);
        let mut query = sqlx::query_as::<_, CashRegisterRow>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        query
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding cash register"))?
            .map(CashRegister::try_from)
            .transpose()
    }
}

#[derive(Debug, FromRow)]
struct CashRegisterRow {
    id: i64,
    status: String,
    opened_by: i64,
    opened_by_name: Option<String>,
    opened_at: DateTime<Utc>,
    opening_balance: Decimal,
    closed_by: Option<i64>,
    closed_by_name: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    closing_balance: Option<Decimal>,
    expected_balance: Option<Decimal>,
    difference: Option<Decimal>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CashRegisterRow> for CashRegister {
    type Error = DomainError;

    fn try_from(row: CashRegisterRow) -> Result<Self, Self::Error> {
        Ok(CashRegister {
            id: row.id,
            status: row.status.parse()?,
            opened_by: row.opened_by,
            opened_by_name: row.opened_by_name,
            opened_at: row.opened_at,
            opening_balance: row.opening_balance,
            closed_by: row.closed_by,
            closed_by_name: row.closed_by_name,
            closed_at: row.closed_at,
            closing_balance: row.closing_balance,
            expected_balance: row.expected_balance,
            difference: row.difference,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PaymentTotalRow {
    payment_method_id: i64,
    payment_method_name: Option<String>,
    total: Decimal,
}

#[async_trait]
impl CashRegisterRepository for MySqlCashRegisterRepository {
    async fn list(&self, query: &ListQuery) -> Result<Page<CashRegister>, DomainError> {
        let pagination = query.pagination();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cash_registers")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting cash registers"))?;

        let rows: Vec<CashRegisterRow> = sqlx::query_as(&format!(
            "{} ORDER BY r.opened_at DESC, r.id DESC LIMIT ? OFFSET ?",
            REGISTER_SELECT
        ))
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing cash registers"))?;

        let registers = rows
            .into_iter()
            .map(CashRegister::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(registers, total, pagination))
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<CashRegister>, DomainError> {
        self.find_one("r.id = ?", Some(id)).await
    }

    async fn find_open(&self) -> Result<Option<CashRegister>, DomainError> {
        self.find_one("r.status = 'open'", None).await
    }

    async fn open(&self, register: &NewCashRegister) -> Result<EntityId, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting cash register opening"))?;

        let open: Option<i64> =
            sqlx::query_scalar("SELECT id FROM cash_registers WHERE status = ? FOR UPDATE")
                .bind(CashRegisterStatus::Open.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("checking open cash register"))?;
        if let Some(open_id) = open {
            warn!("Cash register {} is still open", open_id);
            return Err(DomainError::Conflict(ALREADY_OPEN.to_string()));
        }

        // The unique open_marker column catches a concurrent opening the lock missed
        let result = sqlx::query(
            r#"
            INSERT INTO cash_registers (status, opened_by, opening_balance, notes)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(CashRegisterStatus::Open.as_str())
        .bind(register.opened_by)
        .bind(register.opening_balance)
        .bind(&register.notes)
        .execute(&mut *tx)
        .await
        .map_err(write_error("opening cash register", ALREADY_OPEN))?;

        tx.commit().await.map_err(db_error("committing cash register opening"))?;
        Ok(result.last_insert_id() as EntityId)
    }

    async fn close(
        &self,
        id: EntityId,
        closed_by: EntityId,
        input: &CloseCashRegisterInput,
    ) -> Result<Option<CashRegisterClosing>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting cash register closing"))?;

        // 1. Lock the register; sales take the same lock before inserting
        let locked: Option<(String, Decimal)> =
            sqlx::query_as("SELECT status, opening_balance FROM cash_registers WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("locking cash register"))?;
        let (status, opening_balance) = locked.ok_or_else(|| DomainError::not_found("cash register", id))?;
        if status != CashRegisterStatus::Open.as_str() {
            return Ok(None);
        }

        // 2. Expected balance from the sales committed before the lock
        let aggregate = load_aggregate(&mut tx, id).await?;
        let summary = CashRegisterSummary::new(opening_balance, aggregate);
        let closing = CashRegisterClosing::new(id, closed_by, &summary, input.clone());

        // 3. Close
        sqlx::query(
            r#"
            UPDATE cash_registers
            SET status = ?, closed_by = ?, closed_at = NOW(), closing_balance = ?,
                expected_balance = ?, difference = ?, notes = COALESCE(?, notes)
            WHERE id = ?
            "#,
        )
        .bind(CashRegisterStatus::Closed.as_str())
        .bind(closing.closed_by)
        .bind(closing.closing_balance)
        .bind(closing.expected_balance)
        .bind(closing.difference)
        .bind(&closing.notes)
        .bind(closing.id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("closing cash register"))?;

        tx.commit().await.map_err(db_error("committing cash register closing"))?;
        Ok(Some(closing))
    }

    async fn sales_aggregate(&self, id: EntityId) -> Result<SalesAggregate, DomainError> {
        let mut conn = self.pool.acquire().await.map_err(db_error("acquiring connection"))?;
        load_aggregate(&mut conn, id).await
    }
}

/// Counts and sums the sales of one register on the given connection.
async fn load_aggregate(conn: &mut MySqlConnection, id: EntityId) -> Result<SalesAggregate, DomainError> {
    let (sales_count, cancelled_count, sales_total): (i64, i64, Decimal) = sqlx::query_as(
        r#"
        SELECT
            CAST(COALESCE(SUM(status = ?), 0) AS SIGNED),
            CAST(COALESCE(SUM(status = ?), 0) AS SIGNED),
            CAST(COALESCE(SUM(CASE WHEN status = ? THEN total END), 0) AS DECIMAL(14,2))
        FROM sales
        WHERE cash_register_id = ?
        "#,
    )
    .bind(SaleStatus::Completed.as_str())
    .bind(SaleStatus::Cancelled.as_str())
    .bind(SaleStatus::Completed.as_str())
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error("aggregating cash register sales"))?;

    let rows: Vec<PaymentTotalRow> = sqlx::query_as(
        r#"
        SELECT p.payment_method_id, m.name AS payment_method_name,
               CAST(SUM(p.amount) AS DECIMAL(14,2)) AS total
        FROM sale_payments p
        JOIN sales s ON s.id = p.sale_id
        LEFT JOIN payment_methods m ON m.id = p.payment_method_id
        WHERE s.cash_register_id = ? AND s.status = ?
        GROUP BY p.payment_method_id, m.name
        ORDER BY p.payment_method_id
        "#,
    )
    .bind(id)
    .bind(SaleStatus::Completed.as_str())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("aggregating cash register payments"))?;

    Ok(SalesAggregate {
        sales_count,
        cancelled_count,
        sales_total,
        by_payment_method: rows
            .into_iter()
            .map(|row| PaymentMethodTotal {
                payment_method_id: row.payment_method_id,
                payment_method_name: row.payment_method_name.unwrap_or_default(),
                total: row.total,
            })
            .collect(),
    })
}
