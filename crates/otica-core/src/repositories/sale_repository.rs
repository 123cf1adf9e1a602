//! Sale repository trait (port)

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{NewSale, Sale, SaleFilter};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn list(&self, filter: &SaleFilter) -> Result<Page<Sale>, DomainError>;
    /// Loads the sale with items and payments
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Sale>, DomainError>;
    /// Inserts sale, items and payments and completes the service order, atomically
    async fn create(&self, sale: &NewSale) -> Result<EntityId, DomainError>;
    /// Cancels a completed sale and reopens its service order, atomically
    async fn cancel(&self, id: EntityId) -> Result<(), DomainError>;
}
