//! Lens repository trait (port)

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{Lens, LensFilter, LensInput, PriceAdjustment};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait LensRepository: Send + Sync {
    async fn list(&self, filter: &LensFilter) -> Result<Page<Lens>, DomainError>;
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Lens>, DomainError>;
    async fn find_by_ids(&self, ids: &[EntityId]) -> Result<Vec<Lens>, DomainError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Lens>, DomainError>;
    async fn create(&self, input: &LensInput) -> Result<EntityId, DomainError>;
    async fn update(&self, id: EntityId, input: &LensInput) -> Result<bool, DomainError>;
    async fn delete(&self, id: EntityId) -> Result<bool, DomainError>;
    /// Applies the adjustment to every matching lens in one transaction.
    /// Returns the number of updated lenses.
    async fn adjust_prices(&self, adjustment: &PriceAdjustment) -> Result<u64, DomainError>;
}
