//! Route table and middleware stack

use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware,
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use otica_core::domain::CatalogKind;
use otica_shared::config::HttpSettings;

use crate::error::{redact_internal_errors, ApiError};
use crate::handlers::{
    auth, cash_registers, catalogs, clients, health, lenses, sales, service_orders, suppliers, users,
};
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

fn api_routes() -> Router<AppState> {
    let mut router = Router::new()
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", get(users::get).put(users::update).delete(users::delete))
        // Clients & suppliers
        .route("/clients", get(clients::list).post(clients::create))
        .route("/clients/{id}", get(clients::get).put(clients::update).delete(clients::delete))
        .route("/suppliers", get(suppliers::list).post(suppliers::create))
        .route(
            "/suppliers/{id}",
            get(suppliers::get).put(suppliers::update).delete(suppliers::delete),
        )
        // Lenses
        .route("/lenses", get(lenses::list).post(lenses::create))
        .route("/lenses/price-adjustments", post(lenses::adjust_prices))
        .route("/lenses/{id}", get(lenses::get).put(lenses::update).delete(lenses::delete))
        // Service orders
        .route("/service-orders", get(service_orders::list).post(service_orders::create))
        .route(
            "/service-orders/{id}",
            get(service_orders::get)
                .put(service_orders::update)
                .delete(service_orders::delete),
        )
        .route("/service-orders/{id}/cancel", post(service_orders::cancel))
        // Sales
        .route("/sales", get(sales::list).post(sales::create))
        .route("/sales/{id}", get(sales::get))
        .route("/sales/{id}/cancel", post(sales::cancel))
        // Cash registers
        .route("/cash-registers", get(cash_registers::list))
        .route("/cash-registers/current", get(cash_registers::current))
        .route("/cash-registers/open", post(cash_registers::open))
        .route("/cash-registers/{id}", get(cash_registers::get))
        .route("/cash-registers/{id}/close", post(cash_registers::close))
        // Health
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    for kind in CatalogKind::ALL {
        router = router.nest(&format!("/{}", kind.path()), catalog_routes(kind));
    }
    router
}

fn catalog_routes(kind: CatalogKind) -> Router<AppState> {
    Router::new()
        .route("/", get(catalogs::list).post(catalogs::create))
        .route("/{id}", get(catalogs::get).put(catalogs::update).delete(catalogs::delete))
        .layer(Extension(kind))
}

fn cors_layer(http: &HttpSettings) -> CorsLayer {
    if http.allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = http
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, IF_NONE_MATCH])
        .expose_headers([ETAG])
}

async fn not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Builds the full application: `/api/v1` routes, JSON fallbacks and middleware.
pub fn build_router(state: AppState, http: &HttpSettings) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api/v1", api_routes())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::map_response_with_state(
            http.expose_internal_errors,
            redact_internal_errors,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(http.request_timeout_secs),
                ))
                .layer(CompressionLayer::new())
                .layer(cors_layer(http)),
        )
        .with_state(state)
}
