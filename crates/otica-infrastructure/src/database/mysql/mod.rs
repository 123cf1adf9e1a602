//! MySQL repository implementations

mod support;

pub mod client_repo_impl;
pub mod catalog_repo_impl;
pub mod supplier_repo_impl;
pub mod lens_repo_impl;
pub mod service_order_repo_impl;
pub mod sale_repo_impl;
pub mod cash_register_repo_impl;
pub mod user_repo_impl;
pub mod refresh_token_repo_impl;
pub mod health_repo_impl;

pub use client_repo_impl::MySqlClientRepository;
pub use catalog_repo_impl::MySqlCatalogRepository;
pub use supplier_repo_impl::MySqlSupplierRepository;
pub use lens_repo_impl::MySqlLensRepository;
pub use service_order_repo_impl::MySqlServiceOrderRepository;
pub use sale_repo_impl::MySqlSaleRepository;
pub use cash_register_repo_impl::MySqlCashRegisterRepository;
pub use user_repo_impl::MySqlUserRepository;
pub use refresh_token_repo_impl::MySqlRefreshTokenRepository;
pub use health_repo_impl::MySqlHealthRepository;

use std::sync::Arc;

use sqlx::MySqlPool;

use otica_core::repositories::Repositories;

/// Wires every MySQL adapter onto one shared pool.
pub fn mysql_repositories(pool: MySqlPool) -> Repositories {
    Repositories {
        clients: Arc::new(MySqlClientRepository::new(pool.clone())),
        catalogs: Arc::new(MySqlCatalogRepository::new(pool.clone())),
        suppliers: Arc::new(MySqlSupplierRepository::new(pool.clone())),
        lenses: Arc::new(MySqlLensRepository::new(pool.clone())),
        service_orders: Arc::new(MySqlServiceOrderRepository::new(pool.clone())),
        sales: Arc::new(MySqlSaleRepository::new(pool.clone())),
        cash_registers: Arc::new(MySqlCashRegisterRepository::new(pool.clone())),
        users: Arc::new(MySqlUserRepository::new(pool.clone())),
        refresh_tokens: Arc::new(MySqlRefreshTokenRepository::new(pool.clone())),
        health: Arc::new(MySqlHealthRepository::new(pool)),
    }
}
