//! `/users` handlers, admin only

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use otica_core::domain::{ListQuery, User, UserInput};
use otica_shared::EntityId;

use crate::error::ApiError;
use crate::etag::cached;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Response, ApiError> {
    user.require_admin(&state)?;
    let page = state.users.list(&query).await?;
    cached(&headers, page)
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    user.require_admin(&state)?;
    let found = state.users.get(id).await?;
    cached(&headers, found)
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    user.require_admin(&state)?;
    let created_user = state.users.create(input).await?;
    Ok(created(created_user))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    user.require_admin(&state)?;
    let updated = state.users.update(id, input).await?;
    Ok(ok(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<StatusCode, ApiError> {
    user.require_admin(&state)?;
    state.users.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
