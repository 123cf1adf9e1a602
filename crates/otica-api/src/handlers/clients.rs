//! `/clients` handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use otica_core::domain::{Client, ClientInput, ListQuery};
use otica_shared::EntityId;

use crate::error::ApiError;
use crate::etag::cached;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Response, ApiError> {
    let page = state.clients.list(&query).await?;
    cached(&headers, page)
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    let client = state.clients.get(id).await?;
    cached(&headers, client)
}

pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<(StatusCode, Json<ApiResponse<Client>>), ApiError> {
    let client = state.clients.create(input).await?;
    Ok(created(client))
}

pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<Json<ApiResponse<Client>>, ApiError> {
    let client = state.clients.update(id, input).await?;
    Ok(ok(client))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<StatusCode, ApiError> {
    state.clients.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
