// ============================================================================
// Otica Core - Sale Service
// File: crates/otica-core/src/services/sale_service.rs
// ============================================================================
//! Checkout against the open cash register, and cancellation

use std::sync::Arc;

use tracing::{info, warn};

use otica_shared::{EntityId, Page};

use crate::domain::{
    check_payments, CatalogKind, NewSale, Sale, SaleFilter, SaleInput, SaleStatus, Totals,
};
use crate::error::DomainError;
use crate::repositories::{
    CashRegisterRepository, CatalogRepository, ClientRepository, LensRepository, SaleRepository,
    ServiceOrderRepository,
};
use crate::services::{ensure_catalog_ids, price_items};

pub struct SaleService {
    sales: Arc<dyn SaleRepository>,
    cash_registers: Arc<dyn CashRegisterRepository>,
    service_orders: Arc<dyn ServiceOrderRepository>,
    clients: Arc<dyn ClientRepository>,
    lenses: Arc<dyn LensRepository>,
    catalogs: Arc<dyn CatalogRepository>,
}

impl SaleService {
    pub fn new(
        sales: Arc<dyn SaleRepository>,
        cash_registers: Arc<dyn CashRegisterRepository>,
        service_orders: Arc<dyn ServiceOrderRepository>,
        clients: Arc<dyn ClientRepository>,
        lenses: Arc<dyn LensRepository>,
        catalogs: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            sales,
            cash_registers,
            service_orders,
            clients,
            lenses,
            catalogs,
        }
    }

    pub async fn list(&self, filter: &SaleFilter) -> Result<Page<Sale>, DomainError> {
        filter.validate_range()?;
        self.sales.list(filter).await
    }

    pub async fn get(&self, id: EntityId) -> Result<Sale, DomainError> {
        self.sales
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("sale", id))
    }

    pub async fn create(&self, input: SaleInput, user_id: EntityId) -> Result<Sale, DomainError> {
        let input = input.normalize()?;

        // 1. Sales are only registered against the open cash register
        let register = self
            .cash_registers
            .find_open()
            .await?
            .ok_or(DomainError::NoOpenCashRegister)?;

        // 2. Resolve what is being sold
        let (client_id, totals, items) = match input.service_order_id {
            Some(order_id) => {
                let order = self.service_orders.find_by_id(order_id).await?.ok_or_else(|| {
                    DomainError::InvalidReference(format!("service order {} does not exist", order_id))
                })?;
                if !order.is_open() {
                    return Err(DomainError::InvalidState(format!(
                        "service order {} is {}",
                        order.id, order.status
                    )));
                }
                let totals = Totals::from_subtotal(order.total, input.discount)?;
                (Some(order.client_id), totals, Vec::new())
            }
            None => {
                if let Some(client_id) = input.client_id {
                    if self.clients.find_by_id(client_id).await?.is_none() {
                        return Err(DomainError::InvalidReference(format!(
                            "client {} does not exist",
                            client_id
                        )));
                    }
                }
                let lines = input
                    .items
                    .iter()
                    .map(|item| (item.lens_id, item.quantity, item.unit_price))
                    .collect();
                let items = price_items(self.lenses.as_ref(), lines).await?;
                let totals = Totals::compute(&items, input.discount)?;
                (input.client_id, totals, items)
            }
        };

        // 3. Payments
        let method_ids: Vec<EntityId> = input.payments.iter().map(|p| p.payment_method_id).collect();
        ensure_catalog_ids(self.catalogs.as_ref(), CatalogKind::PaymentMethod, &method_ids).await?;
        check_payments(totals.total, &input.payments)?;

        // 4. Persist atomically
        let sale = NewSale {
            cash_register_id: register.id,
            client_id,
            service_order_id: input.service_order_id,
            user_id,
            totals,
            notes: input.notes,
            items,
            payments: input.payments,
        };
        let id = self.sales.create(&sale).await?;

        info!(
            "Sale {} registered in cash register {} (total {})",
            id, register.id, sale.totals.total
        );
        self.get(id).await
    }

    /// Cancels a completed sale while its cash register is still open.
    pub async fn cancel(&self, id: EntityId) -> Result<Sale, DomainError> {
        let sale = self.get(id).await?;
        if sale.status == SaleStatus::Cancelled {
            return Err(DomainError::InvalidState(format!("sale {} is already cancelled", id)));
        }

        let register_open = self
            .cash_registers
            .find_by_id(sale.cash_register_id)
            .await?
            .is_some_and(|r| r.is_open());
        if !register_open {
            warn!("Sale {} cancellation refused: cash register {} is closed", id, sale.cash_register_id);
            return Err(DomainError::InvalidState(format!(
                "cash register {} of sale {} is closed",
                sale.cash_register_id, id
            )));
        }

        self.sales.cancel(id).await?;
        info!("Sale {} cancelled", id);
        self.get(id).await
    }
}
