use std::sync::Arc;

use otica_core::repositories::{HealthRepository, Repositories};
use otica_core::services::{
    AuthService, CashRegisterService, CatalogService, ClientService, LensService, SaleService,
    ServiceOrderService, SupplierService, UserService,
};
use otica_security::jwt::JwtService;
use otica_shared::config::{AuthSettings, JwtSettings};

/// Shared handler state: one service per resource, built over a set of repositories.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub clients: Arc<ClientService>,
    pub catalogs: Arc<CatalogService>,
    pub suppliers: Arc<SupplierService>,
    pub lenses: Arc<LensService>,
    pub service_orders: Arc<ServiceOrderService>,
    pub sales: Arc<SaleService>,
    pub cash_registers: Arc<CashRegisterService>,
    pub health: Arc<dyn HealthRepository>,
    pub jwt: Arc<JwtService>,
    pub admin_role: Arc<str>,
}

impl AppState {
    pub fn new(repos: Repositories, jwt_settings: &JwtSettings, auth_settings: &AuthSettings) -> Self {
        let jwt = Arc::new(JwtService::new(
            &jwt_settings.secret,
            jwt_settings.issuer.clone(),
            jwt_settings.access_token_expiry,
        ));

        Self {
            auth: Arc::new(AuthService::new(
                repos.users.clone(),
                repos.refresh_tokens.clone(),
                jwt.clone(),
                jwt_settings.refresh_token_expiry,
                auth_settings.login_attempts_per_minute,
            )),
            users: Arc::new(UserService::new(repos.users.clone(), repos.catalogs.clone())),
            clients: Arc::new(ClientService::new(repos.clients.clone())),
            catalogs: Arc::new(CatalogService::new(repos.catalogs.clone())),
            suppliers: Arc::new(SupplierService::new(repos.suppliers.clone())),
            lenses: Arc::new(LensService::new(
                repos.lenses.clone(),
                repos.catalogs.clone(),
                repos.suppliers.clone(),
            )),
            service_orders: Arc::new(ServiceOrderService::new(
                repos.service_orders.clone(),
                repos.clients.clone(),
                repos.lenses.clone(),
            )),
            sales: Arc::new(SaleService::new(
                repos.sales.clone(),
                repos.cash_registers.clone(),
                repos.service_orders.clone(),
                repos.clients.clone(),
                repos.lenses.clone(),
                repos.catalogs.clone(),
            )),
            cash_registers: Arc::new(CashRegisterService::new(repos.cash_registers.clone())),
            health: repos.health,
            jwt,
            admin_role: Arc::from(auth_settings.admin_role.as_str()),
        }
    }
}
