//! # Otica Infrastructure
//! 
//! MySQL implementations of the core repository traits (adapters).

pub mod database;

pub use database::{create_pool, mysql_repositories, run_migrations};
