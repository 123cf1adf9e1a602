//! `/service-orders` handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use otica_core::domain::{ServiceOrder, ServiceOrderFilter, ServiceOrderInput};
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
    ApiQuery(filter): ApiQuery<ServiceOrderFilter>,
) -> Result<Response, ApiError> {
    let page = state.service_orders.list(&filter).await?;
    cached(&headers, page)
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    let order = state.service_orders.get(id).await?;
    cached(&headers, order)
}

/// The authenticated user is recorded as the seller
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ServiceOrderInput>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceOrder>>), ApiError> {
    let order = state.service_orders.create(input, user.id).await?;
    Ok(created(order))
}

pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ApiJson(input): ApiJson<ServiceOrderInput>,
) -> Result<Json<ApiResponse<ServiceOrder>>, ApiError> {
    let order = state.service_orders.update(id, input).await?;
    Ok(ok(order))
}

pub async fn cancel(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Json<ApiResponse<ServiceOrder>>, ApiError> {
    let order = state.service_orders.cancel(id).await?;
    Ok(ok(order))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<StatusCode, ApiError> {
    state.service_orders.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
