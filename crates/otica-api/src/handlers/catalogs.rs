//! Handlers shared by every catalog table.
//!
//! Each catalog is mounted under its own path with its [`CatalogKind`] injected
//! as an extension; writes to roles, sectors and companies are admin only.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Extension, Json,
};

use otica_core::domain::{CatalogInput, CatalogItem, CatalogKind, ListQuery};
use otica_shared::EntityId;

use crate::error::ApiError;
use crate::etag::cached;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

fn authorize_write(kind: CatalogKind, user: &AuthUser, state: &AppState) -> Result<(), ApiError> {
    if kind.requires_admin() {
        user.require_admin(state)?;
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Response, ApiError> {
    let page = state.catalogs.list(kind, &query).await?;
    cached(&headers, page)
}

pub async fn get(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    _user: AuthUser,
    headers: HeaderMap,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<Response, ApiError> {
    let item = state.catalogs.get(kind, id).await?;
    cached(&headers, item)
}

pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    user: AuthUser,
    ApiJson(input): ApiJson<CatalogInput>,
) -> Result<(StatusCode, Json<ApiResponse<CatalogItem>>), ApiError> {
    authorize_write(kind, &user, &state)?;
    let item = state.catalogs.create(kind, input).await?;
    Ok(created(item))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ApiJson(input): ApiJson<CatalogInput>,
) -> Result<Json<ApiResponse<CatalogItem>>, ApiError> {
    authorize_write(kind, &user, &state)?;
    let item = state.catalogs.update(kind, id, input).await?;
    Ok(ok(item))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<CatalogKind>,
    user: AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> Result<StatusCode, ApiError> {
    authorize_write(kind, &user, &state)?;
    state.catalogs.delete(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
