//! Persisted refresh token. Only the SHA-256 hash of the opaque token is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use otica_shared::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: EntityId,
    pub user_id: EntityId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub replaced_by: Option<EntityId>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRefreshToken {
    pub user_id: EntityId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: i64, revoked: bool) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            id: 1,
            user_id: 1,
            token_hash: "ab".repeat(32),
            expires_at: now + Duration::seconds(expires_in),
            revoked_at: revoked.then_some(now),
            replaced_by: None,
            created_at: now,
        }
    }

    #[test]
    fn test_usability() {
        let now = Utc::now();
        assert!(token(60, false).is_usable(now));
        assert!(!token(60, true).is_usable(now));
        assert!(!token(-1, false).is_usable(now));
    }
}
