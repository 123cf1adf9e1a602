//! Supplier repository trait (port)

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{ListQuery, Supplier, SupplierInput};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Page<Supplier>, DomainError>;
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Supplier>, DomainError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Supplier>, DomainError>;
    async fn find_by_cnpj(&self, cnpj: &str) -> Result<Option<Supplier>, DomainError>;
    async fn create(&self, input: &SupplierInput) -> Result<EntityId, DomainError>;
    async fn update(&self, id: EntityId, input: &SupplierInput) -> Result<bool, DomainError>;
    async fn delete(&self, id: EntityId) -> Result<bool, DomainError>;
}
