//! Repository traits (ports)

pub mod client_repository;
pub mod catalog_repository;
pub mod supplier_repository;
pub mod lens_repository;
pub mod service_order_repository;
pub mod sale_repository;
pub mod cash_register_repository;
pub mod user_repository;
pub mod refresh_token_repository;
pub mod health_repository;

pub use client_repository::*;
pub use catalog_repository::*;
pub use supplier_repository::*;
pub use lens_repository::*;
pub use service_order_repository::*;
pub use sale_repository::*;
pub use cash_register_repository::*;
pub use user_repository::*;
pub use refresh_token_repository::*;
pub use health_repository::*;

use std::sync::Arc;

/// One implementation of every port, handed to the service layer at startup.
#[derive(Clone)]
pub struct Repositories {
    pub clients: Arc<dyn ClientRepository>,
    pub catalogs: Arc<dyn CatalogRepository>,
    pub suppliers: Arc<dyn SupplierRepository>,
    pub lenses: Arc<dyn LensRepository>,
    pub service_orders: Arc<dyn ServiceOrderRepository>,
    pub sales: Arc<dyn SaleRepository>,
    pub cash_registers: Arc<dyn CashRegisterRepository>,
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub health: Arc<dyn HealthRepository>,
}
