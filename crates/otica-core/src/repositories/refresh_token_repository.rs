//! Refresh token repository trait (port)

use async_trait::async_trait;

use otica_shared::EntityId;

use crate::domain::{NewRefreshToken, RefreshToken};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create(&self, token: &NewRefreshToken) -> Result<EntityId, DomainError>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError>;
    /// Revokes `old_id`, inserts `new_token` and links them, in one transaction.
    /// Fails with `InvalidRefreshToken` when `old_id` was already revoked.
    async fn rotate(&self, old_id: EntityId, new_token: &NewRefreshToken) -> Result<EntityId, DomainError>;
    async fn revoke(&self, id: EntityId) -> Result<bool, DomainError>;
}
