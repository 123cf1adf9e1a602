//! Domain entities

pub mod money;
pub mod query;
pub mod client;
pub mod catalog;
pub mod supplier;
pub mod lens;
pub mod service_order;
pub mod sale;
pub mod cash_register;
pub mod user;
pub mod refresh_token;

pub use query::ListQuery;
pub use client::*;
pub use catalog::*;
pub use supplier::*;
pub use lens::*;
pub use service_order::*;
pub use sale::*;
pub use cash_register::*;
pub use user::*;
pub use refresh_token::*;
