//! User repository trait (port)

use async_trait::async_trait;

use otica_shared::{EntityId, Page};

use crate::domain::{ListQuery, NewUser, User, UserUpdate};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Page<User>, DomainError>;
    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn count(&self) -> Result<i64, DomainError>;
    /// Inserts the user and its associations in one transaction
    async fn create(&self, user: &NewUser) -> Result<EntityId, DomainError>;
    /// Updates the row and replaces its associations in one transaction
    async fn update(&self, id: EntityId, user: &UserUpdate) -> Result<bool, DomainError>;
    /// Soft deletes the user and revokes its refresh tokens
    async fn delete(&self, id: EntityId) -> Result<bool, DomainError>;
    async fn record_login(&self, id: EntityId) -> Result<(), DomainError>;
}
