//! MySQL adapter for refresh tokens

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::warn;

use otica_core::domain::{NewRefreshToken, RefreshToken};
use otica_core::error::DomainError;
use otica_core::repositories::RefreshTokenRepository;
use otica_shared::EntityId;

use super::support::{db_error, write_error};

pub struct MySqlRefreshTokenRepository {
    pool: MySqlPool,
}

impl MySqlRefreshTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    id: i64,
    user_id: i64,
    token_hash: String,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshToken {
            id: row.id,
            user_id: row.user_id,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
            replaced_by: row.replaced_by,
            created_at: row.created_at,
        }
    }
}

const INSERT_TOKEN: &str = "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES (?, ?, ?)";

#[async_trait]
impl RefreshTokenRepository for MySqlRefreshTokenRepository {
    async fn create(&self, token: &NewRefreshToken) -> Result<EntityId, DomainError> {
        let result = sqlx::query(INSERT_TOKEN)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await
            .map_err(write_error("storing refresh token", "refresh token collision"))?;

        Ok(result.last_insert_id() as EntityId)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked_at, replaced_by, created_at
            FROM refresh_tokens
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding refresh token"))?;

        Ok(row.map(RefreshToken::from))
    }

    async fn rotate(&self, old_id: EntityId, new_token: &NewRefreshToken) -> Result<EntityId, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting token rotation"))?;

        // Only one caller can win the revocation; a replayed token loses here
        let revoked = sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = ? AND revoked_at IS NULL")
            .bind(old_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("revoking refresh token"))?;
        if revoked.rows_affected() == 0 {
            warn!("Refresh token {} was already revoked", old_id);
            return Err(DomainError::InvalidRefreshToken);
        }

        let inserted = sqlx::query(INSERT_TOKEN)
            .bind(new_token.user_id)
            .bind(&new_token.token_hash)
            .bind(new_token.expires_at)
            .execute(&mut *tx)
            .await
            .map_err(write_error("storing refresh token", "refresh token collision"))?;
        let new_id = inserted.last_insert_id() as EntityId;

        sqlx::query("UPDATE refresh_tokens SET replaced_by = ? WHERE id = ?")
            .bind(new_id)
            .bind(old_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("linking refresh tokens"))?;

        tx.commit().await.map_err(db_error("committing token rotation"))?;
        Ok(new_id)
    }

    async fn revoke(&self, id: EntityId) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = ? AND revoked_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("revoking refresh token"))?;

        Ok(result.rows_affected() > 0)
    }
}
