//! Service order repository trait (port)

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{NewServiceOrder, ServiceOrder, ServiceOrderFilter, ServiceOrderStatus};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ServiceOrderRepository: Send + Sync {
    async fn list(&self, filter: &ServiceOrderFilter) -> Result<Page<ServiceOrder>, DomainError>;
    /// Loads the order with its items
    async fn find_by_id(&self, id: EntityId) -> Result<Option<ServiceOrder>, DomainError>;
    async fn create(&self, order: &NewServiceOrder) -> Result<EntityId, DomainError>;
    /// Replaces header and items, only while the order is open
    async fn update(&self, id: EntityId, order: &NewServiceOrder) -> Result<bool, DomainError>;
    /// Moves the order from one status to another; false when it was not in `from`
    async fn transition(&self, id: EntityId, from: ServiceOrderStatus, to: ServiceOrderStatus) -> Result<bool, DomainError>;
    async fn delete(&self, id: EntityId) -> Result<bool, DomainError>;
}
