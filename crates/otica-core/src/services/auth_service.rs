// ============================================================================
// Otica Core - Authentication Service
// File: crates/otica-core/src/services/auth_service.rs
// ============================================================================
//! Login, refresh-token rotation and logout

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{Duration, Utc};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use tracing::{error, info, warn};

use otica_security::jwt::JwtService;
use otica_security::password::PasswordService;
use otica_security::refresh_token;
use otica_shared::constants::TOKEN_TYPE_BEARER;
use otica_shared::utils::{mask_email, normalize_email};
use otica_shared::EntityId;

use crate::domain::{NewRefreshToken, User};
use crate::error::DomainError;
use crate::repositories::{RefreshTokenRepository, UserRepository};

/// Token pair returned by login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    jwt: Arc<JwtService>,
    refresh_token_expiry: i64,
    login_limiter: DefaultKeyedRateLimiter<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        jwt: Arc<JwtService>,
        refresh_token_expiry: i64,
        login_attempts_per_minute: u32,
    ) -> Self {
        let per_minute = NonZeroU32::new(login_attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            users,
            refresh_tokens,
            jwt,
            refresh_token_expiry,
            login_limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
        }
    }

    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, DomainError> {
        let email = normalize_email(email);
        info!("Login attempt for email: {}", mask_email(&email));

        // 1. Throttle per email
        if self.login_limiter.check_key(&email).is_err() {
            warn!("Login throttled for: {}", mask_email(&email));
            return Err(DomainError::TooManyAttempts);
        }

        // 2. Find user by email
        let user = self.users.find_by_email(&email).await?.ok_or_else(|| {
            warn!("Login failed: email not found: {}", mask_email(&email));
            DomainError::InvalidCredentials
        })?;

        // 3. Verify password
        let password_valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !password_valid {
            warn!("Login failed: invalid password for user {}", user.id);
            return Err(DomainError::InvalidCredentials);
        }

        // 4. Check if user can login
        if !user.can_login() {
            warn!("Login failed: user {} is not active", user.id);
            return Err(DomainError::UserNotActive);
        }

        // 5. Issue tokens
        let refresh_token = refresh_token::generate();
        self.refresh_tokens
            .create(&self.new_refresh_token(user.id, &refresh_token))
            .await?;

        if let Err(e) = self.users.record_login(user.id).await {
            error!("Failed to record last login for user {}: {}", user.id, e);
        }

        info!("Login successful for user {}", user.id);
        self.token_pair(user, refresh_token)
    }

    /// Exchange a refresh token for a new pair, revoking the old one.
    pub async fn refresh(&self, presented: &str) -> Result<AuthTokens, DomainError> {
        let stored = self
            .refresh_tokens
            .find_by_hash(&refresh_token::hash(presented))
            .await?
            .ok_or(DomainError::InvalidRefreshToken)?;

        if !stored.is_usable(Utc::now()) {
            if stored.replaced_by.is_some() {
                warn!(
                    "Rotated refresh token {} presented again for user {}",
                    stored.id, stored.user_id
                );
            }
            return Err(DomainError::InvalidRefreshToken);
        }

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .filter(User::can_login)
            .ok_or_else(|| {
                warn!("Refresh denied: user {} missing or inactive", stored.user_id);
                DomainError::UserNotActive
            })?;

        let refresh_token = refresh_token::generate();
        let new_id = self
            .refresh_tokens
            .rotate(stored.id, &self.new_refresh_token(user.id, &refresh_token))
            .await?;

        info!("Refresh token {} rotated to {} for user {}", stored.id, new_id, user.id);
        self.token_pair(user, refresh_token)
    }

    /// Revokes the token if it is known and still live. Always succeeds.
    pub async fn logout(&self, presented: &str) -> Result<(), DomainError> {
        let stored = self
            .refresh_tokens
            .find_by_hash(&refresh_token::hash(presented))
            .await?;

        if let Some(token) = stored.filter(|t| !t.is_revoked()) {
            self.refresh_tokens.revoke(token.id).await?;
            info!("User {} logged out", token.user_id);
        }
        Ok(())
    }

    pub async fn current_user(&self, user_id: EntityId) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    fn new_refresh_token(&self, user_id: EntityId, token: &str) -> NewRefreshToken {
        NewRefreshToken {
            user_id,
            token_hash: refresh_token::hash(token),
            expires_at: Utc::now() + Duration::seconds(self.refresh_token_expiry),
        }
    }

    fn token_pair(&self, user: User, refresh_token: String) -> Result<AuthTokens, DomainError> {
        let access = self
            .jwt
            .generate_access_token(user.id, &user.roles)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        Ok(AuthTokens {
            access_token: access.token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: access.expires_in,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RefreshToken;
    use crate::repositories::{MockRefreshTokenRepository, MockUserRepository};
    use mockall::predicate::eq;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn user(active: bool, password: &str) -> User {
        let now = Utc::now();
        User {
            id: 7,
            name: "Ana".into(),
            email: "ana@otica.com".into(),
            password_hash: PasswordService::hash(password).unwrap(),
            active,
            last_login_at: None,
            roles: vec!["admin".into()],
            role_ids: vec![1],
            sector_ids: vec![],
            company_ids: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn stored_token(presented: &str, revoked: bool, expires_in: i64) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            id: 11,
            user_id: 7,
            token_hash: refresh_token::hash(presented),
            expires_at: now + Duration::seconds(expires_in),
            revoked_at: revoked.then_some(now),
            replaced_by: revoked.then_some(12),
            created_at: now,
        }
    }

    fn service(users: MockUserRepository, tokens: MockRefreshTokenRepository, attempts: u32) -> AuthService {
        AuthService::new(
            Arc::new(users),
            Arc::new(tokens),
            Arc::new(JwtService::new(SECRET, "otica-pos", 900)),
            3600,
            attempts,
        )
    }

    #[tokio::test]
    async fn test_login_issues_tokens_and_stores_hash() {
        let mut users = MockUserRepository::new();
        let found = user(true, "correct-horse");
        users
            .expect_find_by_email()
            .withf(|email| email == "ana@otica.com")
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_record_login().with(eq(7)).times(1).returning(|_| Ok(()));

        let mut tokens = MockRefreshTokenRepository::new();
        tokens
            .expect_create()
            .withf(|t| t.user_id == 7 && t.token_hash.len() == 64)
            .times(1)
            .returning(|_| Ok(1));

        let auth = service(users, tokens, 10);
        let pair = auth.login(" Ana@Otica.com ", "correct-horse").await.unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
        assert_eq!(pair.refresh_token.len(), 64);
        let claims = JwtService::new(SECRET, "otica-pos", 900)
            .validate_access_token(&pair.access_token)
            .unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_login_wrong_password_or_unknown_email() {
        let mut users = MockUserRepository::new();
        let found = user(true, "correct-horse");
        users.expect_find_by_email().returning(move |email| {
            Ok((email == "ana@otica.com").then(|| found.clone()))
        });

        let auth = service(users, MockRefreshTokenRepository::new(), 10);
        assert!(matches!(
            auth.login("ana@otica.com", "wrong-pass").await,
            Err(DomainError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("ghost@otica.com", "whatever").await,
            Err(DomainError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_inactive_user() {
        let mut users = MockUserRepository::new();
        let found = user(false, "correct-horse");
        users.expect_find_by_email().returning(move |_| Ok(Some(found.clone())));

        let auth = service(users, MockRefreshTokenRepository::new(), 10);
        assert!(matches!(
            auth.login("ana@otica.com", "correct-horse").await,
            Err(DomainError::UserNotActive)
        ));
    }

    #[tokio::test]
    async fn test_login_throttled_per_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().times(2).returning(|_| Ok(None));

        let auth = service(users, MockRefreshTokenRepository::new(), 2);
        for _ in 0..2 {
            assert!(matches!(
                auth.login("ana@otica.com", "x").await,
                Err(DomainError::InvalidCredentials)
            ));
        }
        assert!(matches!(
            auth.login("ANA@otica.com", "x").await,
            Err(DomainError::TooManyAttempts)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates() {
        let presented = refresh_token::generate();
        let stored = stored_token(&presented, false, 600);

        let mut tokens = MockRefreshTokenRepository::new();
        let hash = refresh_token::hash(&presented);
        tokens
            .expect_find_by_hash()
            .withf(move |h| h == hash)
            .returning(move |_| Ok(Some(stored.clone())));
        tokens
            .expect_rotate()
            .withf(|old, new| *old == 11 && new.user_id == 7)
            .times(1)
            .returning(|_, _| Ok(12));

        let mut users = MockUserRepository::new();
        let found = user(true, "pw-pw-pw-pw");
        users.expect_find_by_id().with(eq(7)).returning(move |_| Ok(Some(found.clone())));

        let auth = service(users, tokens, 10);
        let pair = auth.refresh(&presented).await.unwrap();
        assert_ne!(pair.refresh_token, presented);
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_expired_and_unknown() {
        let revoked = refresh_token::generate();
        let expired = refresh_token::generate();
        let revoked_row = stored_token(&revoked, true, 600);
        let expired_row = stored_token(&expired, false, -1);

        let mut tokens = MockRefreshTokenRepository::new();
        tokens.expect_find_by_hash().returning(move |hash| {
            Ok([&revoked_row, &expired_row]
                .into_iter()
                .find(|t| t.token_hash == hash)
                .cloned())
        });
        tokens.expect_rotate().never();

        let auth = service(MockUserRepository::new(), tokens, 10);
        for presented in [revoked.as_str(), expired.as_str(), "unknown"] {
            assert!(matches!(auth.refresh(presented).await, Err(DomainError::InvalidRefreshToken)));
        }
    }

    #[tokio::test]
    async fn test_refresh_inactive_user() {
        let presented = refresh_token::generate();
        let stored = stored_token(&presented, false, 600);

        let mut tokens = MockRefreshTokenRepository::new();
        tokens.expect_find_by_hash().returning(move |_| Ok(Some(stored.clone())));
        tokens.expect_rotate().never();

        let mut users = MockUserRepository::new();
        let found = user(false, "pw-pw-pw-pw");
        users.expect_find_by_id().returning(move |_| Ok(Some(found.clone())));

        let auth = service(users, tokens, 10);
        assert!(matches!(auth.refresh(&presented).await, Err(DomainError::UserNotActive)));
    }

    #[tokio::test]
    async fn test_refresh_lost_race() {
        let presented = refresh_token::generate();
        let stored = stored_token(&presented, false, 600);

        let mut tokens = MockRefreshTokenRepository::new();
        tokens.expect_find_by_hash().returning(move |_| Ok(Some(stored.clone())));
        tokens
            .expect_rotate()
            .returning(|_, _| Err(DomainError::InvalidRefreshToken));

        let mut users = MockUserRepository::new();
        let found = user(true, "pw-pw-pw-pw");
        users.expect_find_by_id().returning(move |_| Ok(Some(found.clone())));

        let auth = service(users, tokens, 10);
        assert!(matches!(auth.refresh(&presented).await, Err(DomainError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let live = refresh_token::generate();
        let live_row = stored_token(&live, false, 600);
        let revoked = refresh_token::generate();
        let revoked_row = stored_token(&revoked, true, 600);

        let mut tokens = MockRefreshTokenRepository::new();
        tokens.expect_find_by_hash().returning(move |hash| {
            Ok([&live_row, &revoked_row]
                .into_iter()
                .find(|t| t.token_hash == hash)
                .cloned())
        });
        tokens.expect_revoke().with(eq(11)).times(1).returning(|_| Ok(true));

        let auth = service(MockUserRepository::new(), tokens, 10);
        auth.logout(&live).await.unwrap();
        auth.logout(&revoked).await.unwrap();
        auth.logout("unknown").await.unwrap();
    }
}
