// ============================================================================
// Otica Infrastructure - MySQL Sale Repository
// File: crates/otica-infrastructure/src/database/mysql/sale_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlConnection, MySqlPool, QueryBuilder};
use tracing::warn;

use otica_core::domain::{
    check_locked_order, CashRegisterStatus, NewSale, Sale, SaleFilter, SaleItem, SalePayment, SaleStatus,
    ServiceOrderStatus,
};
use otica_core::error::DomainError;
use otica_core::repositories::SaleRepository;
use otica_shared::{EntityId, Page, Pagination};

use super::support::{db_error, push_page, write_error};

const SALE_SELECT: &str = r#"
    SELECT
        s.id, s.cash_register_id, s.client_id, c.name AS client_name, s.service_order_id,
        s.user_id, u.name AS user_name, s.status, s.subtotal, s.discount, s.total, s.notes,
        s.created_at, s.updated_at
    FROM sales s
    LEFT JOIN clients c ON c.id = s.client_id
    LEFT JOIN users u ON u.id = s.user_id
"#;

pub struct MySqlSaleRepository {
    pool: MySqlPool,
}

impl MySqlSaleRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: i64,
    cash_register_id: i64,
    client_id: Option<i64>,
    client_name: Option<String>,
    service_order_id: Option<i64>,
    user_id: i64,
    user_name: Option<String>,
    status: String,
    subtotal: Decimal,
    discount: Decimal,
    total: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DomainError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(Sale {
            id: row.id,
            cash_register_id: row.cash_register_id,
            client_id: row.client_id,
            client_name: row.client_name,
            service_order_id: row.service_order_id,
            user_id: row.user_id,
            user_name: row.user_name,
            status: row.status.parse()?,
            subtotal: row.subtotal,
            discount: row.discount,
            total: row.total,
            notes: row.notes,
            items: Vec::new(),
            payments: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: i64,
    lens_id: i64,
    lens_code: Option<String>,
    lens_description: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
}

#[derive(Debug, FromRow)]
struct SalePaymentRow {
    id: i64,
    payment_method_id: i64,
    payment_method_name: Option<String>,
    amount: Decimal,
    installments: i32,
}

/// Status of a cash register, row-locked for the rest of the transaction
async fn lock_register_status(conn: &mut MySqlConnection, id: EntityId) -> Result<Option<String>, DomainError> {
    sqlx::query_scalar("SELECT status FROM cash_registers WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(db_error("locking cash register"))
}

fn push_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &SaleFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(cash_register_id) = filter.cash_register_id {
        builder.push(" AND s.cash_register_id = ").push_bind(cash_register_id);
    }
    if let Some(client_id) = filter.client_id {
        builder.push(" AND s.client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND s.status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.from {
        builder.push(" AND s.created_at >= ").push_bind(from.and_time(NaiveTime::MIN));
    }
    if let Some(next_day) = filter.to.and_then(|to| to.succ_opt()) {
        builder.push(" AND s.created_at < ").push_bind(next_day.and_time(NaiveTime::MIN));
    }
}

#[async_trait]
impl SaleRepository for MySqlSaleRepository {
    async fn list(&self, filter: &SaleFilter) -> Result<Page<Sale>, DomainError> {
        let pagination = Pagination::new(filter.page, filter.per_page);

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM sales s");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting sales"))?;

        let mut select = QueryBuilder::<MySql>::new(SALE_SELECT);
        push_filter(&mut select, filter);
        select.push(" ORDER BY s.created_at DESC, s.id DESC");
        push_page(&mut select, pagination);
        let rows: Vec<SaleRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing sales"))?;

        let sales = rows.into_iter().map(Sale::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(sales, total, pagination))
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Sale>, DomainError> {
        let row: Option<SaleRow> = sqlx::query_as(&format!("{} WHERE s.id = ?", SALE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding sale by id"))?;

        let Some(row) = row else { return Ok(None) };
        let mut sale = Sale::try_from(row)?;

        let items: Vec<SaleItemRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.lens_id, l.code AS lens_code, l.description AS lens_description,
                   i.quantity, i.unit_price, i.total
            FROM sale_items i
            LEFT JOIN lenses l ON l.id = i.lens_id
            WHERE i.sale_id = ?
            ORDER BY i.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("loading sale items"))?;

        let payments: Vec<SalePaymentRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.payment_method_id, m.name AS payment_method_name, p.amount, p.installments
            FROM sale_payments p
            LEFT JOIN payment_methods m ON m.id = p.payment_method_id
            WHERE p.sale_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("loading sale payments"))?;

        sale.items = items
            .into_iter()
            .map(|row| SaleItem {
                id: row.id,
                lens_id: row.lens_id,
                lens_code: row.lens_code,
                lens_description: row.lens_description,
                quantity: row.quantity,
                unit_price: row.unit_price,
                total: row.total,
            })
            .collect();
        sale.payments = payments
            .into_iter()
            .map(|row| SalePayment {
                id: row.id,
                payment_method_id: row.payment_method_id,
                payment_method_name: row.payment_method_name,
                amount: row.amount,
                installments: row.installments,
            })
            .collect();
        Ok(Some(sale))
    }

    async fn create(&self, sale: &NewSale) -> Result<EntityId, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting sale"))?;

        // 1. The register must still be open; the lock serializes against closing
        let status = lock_register_status(&mut tx, sale.cash_register_id).await?;
        if status.as_deref() != Some(CashRegisterStatus::Open.as_str()) {
            warn!("Sale refused: cash register {} closed meanwhile", sale.cash_register_id);
            return Err(DomainError::NoOpenCashRegister);
        }

        // 2. Header
        let result = sqlx::query(
            r#"
            INSERT INTO sales
                (cash_register_id, client_id, service_order_id, user_id, status,
                 subtotal, discount, total, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.cash_register_id)
        .bind(sale.client_id)
        .bind(sale.service_order_id)
        .bind(sale.user_id)
        .bind(SaleStatus::Completed.as_str())
        .bind(sale.totals.subtotal)
        .bind(sale.totals.discount)
        .bind(sale.totals.total)
        .bind(&sale.notes)
        .execute(&mut *tx)
        .await
        .map_err(write_error("creating sale", "duplicate sale"))?;
        let sale_id = result.last_insert_id() as EntityId;

        // 3. Items and payments
        for item in &sale.items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, lens_id, quantity, unit_price, total)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(sale_id)
            .bind(item.lens_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total()?)
            .execute(&mut *tx)
            .await
            .map_err(write_error("inserting sale item", "duplicate sale item"))?;
        }
        for payment in &sale.payments {
            sqlx::query(
                r#"
                INSERT INTO sale_payments (sale_id, payment_method_id, amount, installments)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(sale_id)
            .bind(payment.payment_method_id)
            .bind(payment.amount)
            .bind(payment.installments)
            .execute(&mut *tx)
            .await
            .map_err(write_error("inserting sale payment", "duplicate sale payment"))?;
        }

        // 4. Complete the service order, priced as it is now
        if let Some(order_id) = sale.service_order_id {
            let locked: Option<(String, Decimal)> = sqlx::query_as(
                "SELECT status, total FROM service_orders WHERE id = ? AND deleted_at IS NULL FOR UPDATE",
            )
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("locking service order"))?;
            let (status, order_total) = locked.ok_or_else(|| {
                DomainError::InvalidReference(format!("service order {} does not exist", order_id))
            })?;
            check_locked_order(order_id, status.parse()?, order_total, sale.totals.subtotal)?;

            let completed = sqlx::query(
                r#"
                UPDATE service_orders SET status = ?
                WHERE id = ? AND status = ? AND deleted_at IS NULL
                "#,
            )
            .bind(ServiceOrderStatus::Completed.as_str())
            .bind(order_id)
            .bind(ServiceOrderStatus::Open.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("completing service order"))?;

            if completed.rows_affected() == 0 {
                return Err(DomainError::InvalidState(format!(
                    "service order {} is no longer open",
                    order_id
                )));
            }
        }

        tx.commit().await.map_err(db_error("committing sale"))?;
        Ok(sale_id)
    }

    async fn cancel(&self, id: EntityId) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting sale cancellation"))?;

        let row: Option<(i64, Option<i64>, String)> = sqlx::query_as(
            "SELECT cash_register_id, service_order_id, status FROM sales WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("locking sale"))?;
        let (cash_register_id, service_order_id, status) =
            row.ok_or_else(|| DomainError::not_found("sale", id))?;

        if status != SaleStatus::Completed.as_str() {
            return Err(DomainError::InvalidState(format!("sale {} is already {}", id, status)));
        }
        let register_status = lock_register_status(&mut tx, cash_register_id).await?;
        if register_status.as_deref() != Some(CashRegisterStatus::Open.as_str()) {
            return Err(DomainError::InvalidState(format!(
                "cash register {} of sale {} is closed",
                cash_register_id, id
            )));
        }

        sqlx::query("UPDATE sales SET status = ? WHERE id = ?")
            .bind(SaleStatus::Cancelled.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("cancelling sale"))?;

        if let Some(order_id) = service_order_id {
            sqlx::query("UPDATE service_orders SET status = ? WHERE id = ? AND status = ?")
                .bind(ServiceOrderStatus::Open.as_str())
                .bind(order_id)
                .bind(ServiceOrderStatus::Completed.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_error("reopening service order"))?;
        }

        tx.commit().await.map_err(db_error("committing sale cancellation"))?;
        Ok(())
    }
}
