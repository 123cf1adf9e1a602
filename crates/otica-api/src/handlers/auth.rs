// ============================================================================
// Otica API - Auth Handlers
// File: crates/otica-api/src/handlers/auth.rs
// ============================================================================
//! Authentication HTTP handlers (login, refresh, logout, me)

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use otica_core::error::DomainError;
use otica_core::services::AuthTokens;

use crate::error::ApiError;
use crate::etag::cached;
use crate::extract::{ApiJson, AuthUser};
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub refresh_token: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    payload.validate().map_err(DomainError::from)?;
    let tokens = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ok(tokens))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    payload.validate().map_err(DomainError::from)?;
    let tokens = state.auth.refresh(&payload.refresh_token).await?;
    Ok(ok(tokens))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate().map_err(DomainError::from)?;
    state.auth.logout(&payload.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let profile = state.auth.current_user(user.id).await?;
    cached(&headers, profile)
}
