//! Catalog repository trait (port), shared by every catalog table

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{CatalogInput, CatalogItem, CatalogKind, ListQuery};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list(&self, kind: CatalogKind, query: &ListQuery) -> Result<Page<CatalogItem>, DomainError>;
    async fn find_by_id(&self, kind: CatalogKind, id: EntityId) -> Result<Option<CatalogItem>, DomainError>;
    async fn find_by_name(&self, kind: CatalogKind, name: &str) -> Result<Option<CatalogItem>, DomainError>;
    /// Number of the given ids that exist and are not deleted
    async fn count_existing(&self, kind: CatalogKind, ids: &[EntityId]) -> Result<i64, DomainError>;
    async fn create(&self, kind: CatalogKind, input: &CatalogInput) -> Result<EntityId, DomainError>;
    async fn update(&self, kind: CatalogKind, id: EntityId, input: &CatalogInput) -> Result<bool, DomainError>;
    async fn delete(&self, kind: CatalogKind, id: EntityId) -> Result<bool, DomainError>;
}
