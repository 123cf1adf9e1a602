use async_trait::async_trait;
use sqlx::MySqlPool;

use otica_core::error::DomainError;
use otica_core::repositories::HealthRepository;

use super::support::db_error;

pub struct MySqlHealthRepository {
    pool: MySqlPool,
}

impl MySqlHealthRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthRepository for MySqlHealthRepository {
    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("pinging database"))?;
        Ok(())
    }
}
