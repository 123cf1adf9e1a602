//! Storage liveness probe

use async_trait::async_trait;

use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait HealthRepository: Send + Sync {
    async fn ping(&self) -> Result<(), DomainError>;
}
