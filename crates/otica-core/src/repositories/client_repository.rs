//! Client repository trait (port)

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{Client, ClientInput, ListQuery};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Page<Client>, DomainError>;
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Client>, DomainError>;
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Client>, DomainError>;
    async fn create(&self, input: &ClientInput) -> Result<EntityId, DomainError>;
    /// Returns false when no live row matched
    async fn update(&self, id: EntityId, input: &ClientInput) -> Result<bool, DomainError>;
    async fn delete(&self, id: EntityId) -> Result<bool, DomainError>;
}
