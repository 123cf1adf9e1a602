//! Service order workflow: open → completed (by a sale) or cancelled

use std::sync::Arc;

use tracing::{info, warn};

use otica_shared::{EntityId, Page};

use crate::domain::{
    NewServiceOrder, ServiceOrder, ServiceOrderFilter, ServiceOrderInput, ServiceOrderStatus, Totals,
};
use crate::error::DomainError;
use crate::repositories::{ClientRepository, LensRepository, ServiceOrderRepository};
use crate::services::price_items;

pub struct ServiceOrderService {
    orders: Arc<dyn ServiceOrderRepository>,
    clients: Arc<dyn ClientRepository>,
    lenses: Arc<dyn LensRepository>,
}

impl ServiceOrderService {
    pub fn new(
        orders: Arc<dyn ServiceOrderRepository>,
        clients: Arc<dyn ClientRepository>,
        lenses: Arc<dyn LensRepository>,
    ) -> Self {
        Self { orders, clients, lenses }
    }

    pub async fn list(&self, filter: &ServiceOrderFilter) -> Result<Page<ServiceOrder>, DomainError> {
        self.orders.list(filter).await
    }

    pub async fn get(&self, id: EntityId) -> Result<ServiceOrder, DomainError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("service order", id))
    }

    pub async fn create(&self, input: ServiceOrderInput, seller_id: EntityId) -> Result<ServiceOrder, DomainError> {
        let order = self.resolve(input, seller_id).await?;
        let id = self.orders.create(&order).await?;

        info!("Service order {} created for client {} (total {})", id, order.client_id, order.totals.total);
        self.get(id).await
    }

    /// Replaces client, prescription and items of an open order.
    pub async fn update(&self, id: EntityId, input: ServiceOrderInput) -> Result<ServiceOrder, DomainError> {
        let existing = self.get(id).await?;
        ensure_open(&existing)?;

        let order = self.resolve(input, existing.seller_id).await?;
        if !self.orders.update(id, &order).await? {
            warn!("Service order {} changed state during update", id);
            return Err(DomainError::InvalidState(format!("service order {} is no longer open", id)));
        }
        self.get(id).await
    }

    pub async fn cancel(&self, id: EntityId) -> Result<ServiceOrder, DomainError> {
        let existing = self.get(id).await?;
        ensure_open(&existing)?;

        if !self
            .orders
            .transition(id, ServiceOrderStatus::Open, ServiceOrderStatus::Cancelled)
            .await?
        {
            return Err(DomainError::InvalidState(format!("service order {} is no longer open", id)));
        }
        info!("Service order {} cancelled", id);
        self.get(id).await
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), DomainError> {
        let existing = self.get(id).await?;
        if existing.status == ServiceOrderStatus::Completed {
            return Err(DomainError::InvalidState(format!(
                "service order {} is completed and cannot be deleted",
                id
            )));
        }
        if !self.orders.delete(id).await? {
            return Err(DomainError::not_found("service order", id));
        }
        info!("Service order {} deleted", id);
        Ok(())
    }

    async fn resolve(&self, input: ServiceOrderInput, seller_id: EntityId) -> Result<NewServiceOrder, DomainError> {
        let input = input.normalize()?;

        if self.clients.find_by_id(input.client_id).await?.is_none() {
            return Err(DomainError::InvalidReference(format!(
                "client {} does not exist",
                input.client_id
            )));
        }

        let lines = input
            .items
            .iter()
            .map(|item| (item.lens_id, item.quantity, item.unit_price))
            .collect();
        let items = price_items(self.lenses.as_ref(), lines).await?;
        let totals = Totals::compute(&items, input.discount)?;

        Ok(NewServiceOrder {
            client_id: input.client_id,
            seller_id,
            prescription: input.prescription,
            notes: input.notes,
            totals,
            items,
        })
    }
}

fn ensure_open(order: &ServiceOrder) -> Result<(), DomainError> {
    if !order.is_open() {
        return Err(DomainError::InvalidState(format!(
            "service order {} is {}",
            order.id, order.status
        )));
    }
    Ok(())
}
