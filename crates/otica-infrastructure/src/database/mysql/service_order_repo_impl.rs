//! MySQL service order repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlConnection, MySqlPool, QueryBuilder};

use otica_core::domain::{
    NewServiceOrder, Prescription, ServiceOrder, ServiceOrderFilter, ServiceOrderItem, ServiceOrderStatus,
};
use otica_core::error::DomainError;
use otica_core::repositories::ServiceOrderRepository;
use otica_shared::{EntityId, Page, Pagination};

use super::support::{db_error, like_pattern, push_page, write_error};

const ORDER_SELECT: &str = r#"
    SELECT
        o.id, o.client_id, c.name AS client_name, o.seller_id, u.name AS seller_name, o.status,
        o.right_sphere, o.right_cylinder, o.right_axis, o.right_addition,
        o.left_sphere, o.left_cylinder, o.left_axis, o.left_addition,
        o.pupillary_distance, o.fitting_height,
        o.notes, o.subtotal, o.discount, o.total, o.created_at, o.updated_at
    FROM service_orders o
    LEFT JOIN clients c ON c.id = o.client_id
    LEFT JOIN users u ON u.id = o.seller_id
"#;

pub struct MySqlServiceOrderRepository {
    pool: MySqlPool,
}

impl MySqlServiceOrderRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ServiceOrderRow {
    id: i64,
    client_id: i64,
    client_name: Option<String>,
    seller_id: i64,
    seller_name: Option<String>,
    status: String,
    right_sphere: Option<Decimal>,
    right_cylinder: Option<Decimal>,
    right_axis: Option<i16>,
    right_addition: Option<Decimal>,
    left_sphere: Option<Decimal>,
    left_cylinder: Option<Decimal>,
    left_axis: Option<i16>,
    left_addition: Option<Decimal>,
    pupillary_distance: Option<Decimal>,
    fitting_height: Option<Decimal>,
    notes: Option<String>,
    subtotal: Decimal,
    discount: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ServiceOrderRow> for ServiceOrder {
    type Error = DomainError;

    fn try_from(row: ServiceOrderRow) -> Result<Self, Self::Error> {
        Ok(ServiceOrder {
            id: row.id,
            client_id: row.client_id,
            client_name: row.client_name,
            seller_id: row.seller_id,
            seller_name: row.seller_name,
            status: row.status.parse()?,
            prescription: Prescription {
                right_sphere: row.right_sphere,
                right_cylinder: row.right_cylinder,
                right_axis: row.right_axis,
                right_addition: row.right_addition,
                left_sphere: row.left_sphere,
                left_cylinder: row.left_cylinder,
                left_axis: row.left_axis,
                left_addition: row.left_addition,
                pupillary_distance: row.pupillary_distance,
                fitting_height: row.fitting_height,
            },
            notes: row.notes,
            subtotal: row.subtotal,
            discount: row.discount,
            total: row.total,
            items: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    lens_id: i64,
    lens_code: Option<String>,
    lens_description: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
}

impl From<ItemRow> for ServiceOrderItem {
    fn from(row: ItemRow) -> Self {
        ServiceOrderItem {
            id: row.id,
            lens_id: row.lens_id,
            lens_code: row.lens_code,
            lens_description: row.lens_description,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total: row.total,
        }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &ServiceOrderFilter) {
    builder.push(" WHERE o.deleted_at IS NULL");
    if let Some(status) = filter.status {
        builder.push(" AND o.status = ").push_bind(status.as_str());
    }
    if let Some(client_id) = filter.client_id {
        builder.push(" AND o.client_id = ").push_bind(client_id);
    }
    if let Some(term) = filter.search() {
        builder.push(" AND c.name LIKE ").push_bind(like_pattern(&term));
    }
}

async fn insert_items(conn: &mut MySqlConnection, order_id: EntityId, order: &NewServiceOrder) -> Result<(), DomainError> {
    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO service_order_items (service_order_id, lens_id, quantity, unit_price, total)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(item.lens_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total()?)
        .execute(&mut *conn)
        .await
        .map_err(write_error("inserting service order item", "duplicate service order item"))?;
    }
    Ok(())
}

#[async_trait]
impl ServiceOrderRepository for MySqlServiceOrderRepository {
    async fn list(&self, filter: &ServiceOrderFilter) -> Result<Page<ServiceOrder>, DomainError> {
        let pagination = Pagination::new(filter.page, filter.per_page);

        let mut count = QueryBuilder::<MySql>::new(
            "SELECT COUNT(*) FROM service_orders o LEFT JOIN clients c ON c.id = o.client_id",
        );
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting service orders"))?;

        let mut select = QueryBuilder::<MySql>::new(ORDER_SELECT);
        push_filter(&mut select, filter);
        select.push(" ORDER BY o.created_at DESC, o.id DESC");
        push_page(&mut select, pagination);
        let rows: Vec<ServiceOrderRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing service orders"))?;

        let items = rows
            .into_iter()
            .map(ServiceOrder::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, pagination))
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<ServiceOrder>, DomainError> {
        let row: Option<ServiceOrderRow> = sqlx::query_as(&format!(
            "{} WHERE o.id = ? AND o.deleted_at IS NULL",
            ORDER_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding service order by id"))?;

        let Some(row) = row else { return Ok(None) };
        let mut order = ServiceOrder::try_from(row)?;

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.lens_id, l.code AS lens_code, l.description AS lens_description,
                   i.quantity, i.unit_price, i.total
            FROM service_order_items i
            LEFT JOIN lenses l ON l.id = i.lens_id
            WHERE i.service_order_id = ?
            ORDER BY i.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("loading service order items"))?;

        order.items = items.into_iter().map(ServiceOrderItem::from).collect();
        Ok(Some(order))
    }

    async fn create(&self, order: &NewServiceOrder) -> Result<EntityId, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting service order"))?;
        let p = &order.prescription;

        let result = sqlx::query(
            r#"
            INSERT INTO service_orders
                (client_id, seller_id, status,
                 right_sphere, right_cylinder, right_axis, right_addition,
                 left_sphere, left_cylinder, left_axis, left_addition,
                 pupillary_distance, fitting_height, notes, subtotal, discount, total)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.client_id)
        .bind(order.seller_id)
        .bind(ServiceOrderStatus::Open.as_str())
        .bind(p.right_sphere)
        .bind(p.right_cylinder)
        .bind(p.right_axis)
        .bind(p.right_addition)
        .bind(p.left_sphere)
        .bind(p.left_cylinder)
        .bind(p.left_axis)
        .bind(p.left_addition)
        .bind(p.pupillary_distance)
        .bind(p.fitting_height)
        .bind(&order.notes)
        .bind(order.totals.subtotal)
        .bind(order.totals.discount)
        .bind(order.totals.total)
        .execute(&mut *tx)
        .await
        .map_err(write_error("creating service order", "duplicate service order"))?;

        let id = result.last_insert_id() as EntityId;
        insert_items(&mut tx, id, order).await?;

        tx.commit().await.map_err(db_error("committing service order"))?;
        Ok(id)
    }

    async fn update(&self, id: EntityId, order: &NewServiceOrder) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting service order update"))?;

        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM service_orders WHERE id = ? AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("locking service order"))?;
        if status.as_deref() != Some(ServiceOrderStatus::Open.as_str()) {
            return Ok(false);
        }

        let p = &order.prescription;
        sqlx::query(
            r#"
            UPDATE service_orders
            SET client_id = ?,
                right_sphere = ?, right_cylinder = ?, right_axis = ?, right_addition = ?,
                left_sphere = ?, left_cylinder = ?, left_axis = ?, left_addition = ?,
                pupillary_distance = ?, fitting_height = ?, notes = ?,
                subtotal = ?, discount = ?, total = ?
            WHERE id = ?
            "#,
        )
        .bind(order.client_id)
        .bind(p.right_sphere)
        .bind(p.right_cylinder)
        .bind(p.right_axis)
        .bind(p.right_addition)
        .bind(p.left_sphere)
        .bind(p.left_cylinder)
        .bind(p.left_axis)
        .bind(p.left_addition)
        .bind(p.pupillary_distance)
        .bind(p.fitting_height)
        .bind(&order.notes)
        .bind(order.totals.subtotal)
        .bind(order.totals.discount)
        .bind(order.totals.total)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("updating service order"))?;

        sqlx::query("DELETE FROM service_order_items WHERE service_order_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("clearing service order items"))?;
        insert_items(&mut tx, id, order).await?;

        tx.commit().await.map_err(db_error("committing service order update"))?;
        Ok(true)
    }

    async fn transition(
        &self,
        id: EntityId,
        from: ServiceOrderStatus,
        to: ServiceOrderStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE service_orders SET status = ? WHERE id = ? AND status = ? AND deleted_at IS NULL",
        )
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("changing service order status"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: EntityId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE service_orders SET deleted_at = NOW()
            WHERE id = ? AND deleted_at IS NULL AND status <> 'completed'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error("deleting service order"))?;

        Ok(result.rows_affected() > 0)
    }
}
