//! `/lenses` handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;
use tracing::info;

use otica_core::domain::{Lens, LensFilter, LensInput, PriceAdjustment};
use otica_shared::EntityId;

use crate::error::ApiError;
use crate::etag::cached;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PriceAdjustmentResult {
    pub updated: u64,
}

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiQuery(filter): ApiQuery<LensFilter>,
) -> Result<Response, ApiError> {
    let page = state.lenses.list(&filter).await?;
    cached(&headers, page)
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    let lens = state.lenses.get(id).await?;
    cached(&headers, lens)
}

pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<LensInput>,
) -> Result<(StatusCode, Json<ApiResponse<Lens>>), ApiError> {
    let lens = state.lenses.create(input).await?;
    Ok(created(lens))
}

pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ApiJson(input): ApiJson<LensInput>,
) -> Result<Json<ApiResponse<Lens>>, ApiError> {
    let lens = state.lenses.update(id, input).await?;
    Ok(ok(lens))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<StatusCode, ApiError> {
    state.lenses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/lenses/price-adjustments
pub async fn adjust_prices(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(adjustment): ApiJson<PriceAdjustment>,
) -> Result<Json<ApiResponse<PriceAdjustmentResult>>, ApiError> {
    let updated = state.lenses.adjust_prices(adjustment).await?;
    info!("User {} adjusted prices of {} lenses", user.id, updated);
    Ok(Json(ApiResponse::success_with_message(
        PriceAdjustmentResult { updated },
        format!("{} lens prices updated", updated),
    )))
}
