//! Database connection pool and migrations

use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing::info;

use otica_shared::config::DatabaseSettings;

pub async fn create_pool(settings: &DatabaseSettings) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&settings.url)
        .await?;

    info!(
        "MySQL pool ready (max {} / min {} connections)",
        settings.max_connections, settings.min_connections
    );
    Ok(pool)
}

/// Applies pending migrations from `crates/otica-infrastructure/migrations`.
pub async fn run_migrations(pool: &MySqlPool) -> Result<(), MigrateError> {
    sqlx::migrate!().run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
