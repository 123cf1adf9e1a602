//! HTTP handlers, one module per resource

pub mod auth;
pub mod cash_registers;
pub mod catalogs;
pub mod clients;
pub mod health;
pub mod lenses;
pub mod sales;
pub mod service_orders;
pub mod suppliers;
pub mod users;
