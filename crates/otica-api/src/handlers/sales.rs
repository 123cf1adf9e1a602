//! `/sales` handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use otica_core::domain::{Sale, SaleFilter, SaleInput};
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
    ApiQuery(filter): ApiQuery<SaleFilter>,
) -> Result<Response, ApiError> {
    let page = state.sales.list(&filter).await?;
    cached(&headers, page)
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    let sale = state.sales.get(id).await?;
    cached(&headers, sale)
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<SaleInput>,
) -> Result<(StatusCode, Json<ApiResponse<Sale>>), ApiError> {
    let sale = state.sales.create(input, user.id).await?;
    Ok(created(sale))
}

pub async fn cancel(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Json<ApiResponse<Sale>>, ApiError> {
    let sale = state.sales.cancel(id).await?;
    Ok(ok(sale))
}
