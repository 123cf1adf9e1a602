//! `/suppliers` handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use otica_core::domain::{Supplier, SupplierInput, ListQuery};
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
    let page = state.suppliers.list(&query).await?;
    cached(&headers, page)
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    let supplier = state.suppliers.get(id).await?;
    cached(&headers, supplier)
}

pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<SupplierInput>,
) -> Result<(StatusCode, Json<ApiResponse<Supplier>>), ApiError> {
    let supplier = state.suppliers.create(input).await?;
    Ok(created(supplier))
}

pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> Result<Json<ApiResponse<Supplier>>, ApiError> {
    let supplier = state.suppliers.update(id, input).await?;
    Ok(ok(supplier))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<StatusCode, ApiError> {
    state.suppliers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
