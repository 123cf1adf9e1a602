//! `/cash-registers` handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use otica_core::domain::{CashRegisterDetail, CloseCashRegisterInput, ListQuery, OpenCashRegisterInput};
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
    let page = state.cash_registers.list(&query).await?;
    cached(&headers, page)
}

/// GET /api/v1/cash-registers/current. `data` is null when no register is open.
pub async fn current(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let register = state.cash_registers.current().await?;
    cached(&headers, register)
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    let register = state.cash_registers.get(id).await?;
    cached(&headers, register)
}

pub async fn open(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<OpenCashRegisterInput>,
) -> Result<(StatusCode, Json<ApiResponse<CashRegisterDetail>>), ApiError> {
    let register = state.cash_registers.open(input, user.id).await?;
    Ok(created(register))
}

pub async fn close(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ApiJson(input): ApiJson<CloseCashRegisterInput>,
) -> Result<Json<ApiResponse<CashRegisterDetail>>, ApiError> {
    let register = state.cash_registers.close(id, input, user.id).await?;
    Ok(ok(register))
}
