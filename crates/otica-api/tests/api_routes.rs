//! Router-level tests over mocked repositories

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use mockall::predicate::eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use otica_api::{build_router, AppState};
use otica_core::domain::{CatalogItem, CatalogKind, Client};
use otica_core::repositories::*;
use otica_security::jwt::JwtService;
use otica_shared::config::{AuthSettings, HttpSettings, JwtSettings};

const SECRET: &str = "test-secret-test-secret-test-secret!";
const ISSUER: &str = "otica-pos";

struct Mocks {
    clients: MockClientRepository,
    catalogs: MockCatalogRepository,
    users: MockUserRepository,
    refresh_tokens: MockRefreshTokenRepository,
    cash_registers: MockCashRegisterRepository,
    health: MockHealthRepository,
}

impl Mocks {
    fn new() -> Self {
        Self {
            clients: MockClientRepository::new(),
            catalogs: MockCatalogRepository::new(),
            users: MockUserRepository::new(),
            refresh_tokens: MockRefreshTokenRepository::new(),
            cash_registers: MockCashRegisterRepository::new(),
            health: MockHealthRepository::new(),
        }
    }

    fn app(self) -> Router {
        self.app_exposing_internal_errors(true)
    }

    fn app_exposing_internal_errors(self, expose_internal_errors: bool) -> Router {
        let repos = Repositories {
            clients: Arc::new(self.clients),
            catalogs: Arc::new(self.catalogs),
            suppliers: Arc::new(MockSupplierRepository::new()),
            lenses: Arc::new(MockLensRepository::new()),
            service_orders: Arc::new(MockServiceOrderRepository::new()),
            sales: Arc::new(MockSaleRepository::new()),
            cash_registers: Arc::new(self.cash_registers),
            users: Arc::new(self.users),
            refresh_tokens: Arc::new(self.refresh_tokens),
            health: Arc::new(self.health),
        };
        let jwt = JwtSettings {
            secret: SECRET.to_string(),
            issuer: ISSUER.to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 3600,
        };
        let auth = AuthSettings {
            admin_role: "admin".to_string(),
            login_attempts_per_minute: 2,
        };
        let http = HttpSettings {
            allowed_origins: Vec::new(),
            request_timeout_secs: 30,
            expose_internal_errors,
        };
        build_router(AppState::new(repos, &jwt, &auth), &http)
    }
}

fn token(roles: &[&str]) -> String {
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    JwtService::new(SECRET, ISSUER, 900)
        .generate_access_token(7, &roles)
        .unwrap()
        .token
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn client(id: i64) -> Client {
    let now = Utc::now();
    Client {
        id,
        name: "Maria Souza".into(),
        cpf: Some("52998224725".into()),
        phone: None,
        email: None,
        birth_date: None,
        address: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

fn catalog_item(id: i64, name: &str) -> CatalogItem {
    let now = Utc::now();
    CatalogItem {
        id,
        name: name.into(),
        description: None,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let response = Mocks::new()
        .app()
        .oneshot(request(Method::GET, "/api/v1/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_database_failure() {
    let mut mocks = Mocks::new();
    mocks
        .health
        .expect_ping()
        .returning(|| Err(otica_core::DomainError::DatabaseError("connection refused".into())));

    let response = mocks
        .app()
        .oneshot(request(Method::GET, "/api/v1/health/ready", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_database_error_detail_follows_setting() {
    for expose in [true, false] {
        let mut mocks = Mocks::new();
        mocks
            .clients
            .expect_find_by_id()
            .returning(|_| Err(otica_core::DomainError::DatabaseError("Table 'clients' doesn't exist".into())));

        let response = mocks
            .app_exposing_internal_errors(expose)
            .oneshot(request(Method::GET, "/api/v1/clients/1", Some(&token(&[])), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        let message = body["message"].as_str().unwrap();
        if expose {
            assert!(message.contains("Table 'clients'"), "{message}");
        } else {
            assert_eq!(message, "Internal server error");
        }
    }
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method() {
    let app = Mocks::new().app();

    let missing = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/nope", None, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["status"], "error");

    let wrong_method = app
        .oneshot(request(Method::PATCH, "/api/v1/clients", None, None))
        .await
        .unwrap();
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_protected_route_requires_bearer_token() {
    let app = Mocks::new().app();

    let anonymous = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/clients", None, None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let forged = app
        .oneshot(request(Method::GET, "/api/v1/clients", Some("not.a.token"), None))
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_client_supports_conditional_requests() {
    let mut mocks = Mocks::new();
    let fixed = client(3);
    mocks
        .clients
        .expect_find_by_id()
        .with(eq(3))
        .times(2)
        .returning(move |_| Ok(Some(fixed.clone())));
    let app = mocks.app();
    let bearer = token(&["vendedor"]);

    let first = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/clients/3", Some(&bearer), None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[header::CACHE_CONTROL], "no-cache");
    let etag = first.headers()[header::ETAG].clone();
    assert!(etag.to_str().unwrap().starts_with("W/\""));
    assert_eq!(body_json(first).await["data"]["name"], "Maria Souza");

    let mut again = request(Method::GET, "/api/v1/clients/3", Some(&bearer), None);
    again.headers_mut().insert(header::IF_NONE_MATCH, etag.clone());
    let second = app.oneshot(again).await.unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers()[header::ETAG], etag);
}

#[tokio::test]
async fn test_gzipped_response_keeps_weak_tag() {
    let mut mocks = Mocks::new();
    let fixed = client(3);
    mocks
        .clients
        .expect_find_by_id()
        .times(3)
        .returning(move |_| Ok(Some(fixed.clone())));
    let app = mocks.app();
    let bearer = token(&[]);

    let plain = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/clients/3", Some(&bearer), None))
        .await
        .unwrap();
    let plain_tag = plain.headers()[header::ETAG].clone();

    let mut gzip = request(Method::GET, "/api/v1/clients/3", Some(&bearer), None);
    gzip.headers_mut().insert(header::ACCEPT_ENCODING, "gzip".parse().unwrap());
    let gzipped = app.clone().oneshot(gzip).await.unwrap();
    assert_eq!(gzipped.status(), StatusCode::OK);
    assert_eq!(gzipped.headers()[header::CONTENT_ENCODING], "gzip");
    assert_eq!(gzipped.headers()[header::ETAG], plain_tag);
    assert!(plain_tag.to_str().unwrap().starts_with("W/"));

    let mut revalidate = request(Method::GET, "/api/v1/clients/3", Some(&bearer), None);
    revalidate.headers_mut().insert(header::ACCEPT_ENCODING, "gzip".parse().unwrap());
    revalidate.headers_mut().insert(header::IF_NONE_MATCH, plain_tag);
    let not_modified = app.oneshot(revalidate).await.unwrap();
    assert_eq!(not_modified.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_missing_client_is_404_envelope() {
    let mut mocks = Mocks::new();
    mocks.clients.expect_find_by_id().returning(|_| Ok(None));

    let response = mocks
        .app()
        .oneshot(request(Method::GET, "/api/v1/clients/99", Some(&token(&[])), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "client 99 not found");
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = Mocks::new().app();
    let mut bad = request(Method::POST, "/api/v1/clients", Some(&token(&[])), None);
    bad.headers_mut()
        .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    *bad.body_mut() = Body::from("{\"name\": ");

    let response = app.oneshot(bad).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_non_numeric_id_is_400() {
    let response = Mocks::new()
        .app()
        .oneshot(request(Method::GET, "/api/v1/clients/abc", Some(&token(&[])), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_users_are_admin_only() {
    let response = Mocks::new()
        .app()
        .oneshot(request(Method::GET, "/api/v1/users", Some(&token(&["vendedor"])), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_catalog_writes_need_admin() {
    let response = Mocks::new()
        .app()
        .oneshot(request(
            Method::POST,
            "/api/v1/roles",
            Some(&token(&["vendedor"])),
            Some(json!({"name": "gerente"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_lens_family_create_is_open_to_staff() {
    let mut mocks = Mocks::new();
    mocks
        .catalogs
        .expect_find_by_name()
        .withf(|kind, name| *kind == CatalogKind::LensFamily && name == "Multifocal")
        .returning(|_, _| Ok(None));
    mocks
        .catalogs
        .expect_create()
        .withf(|kind, input| *kind == CatalogKind::LensFamily && input.name == "Multifocal")
        .returning(|_, _| Ok(12));
    mocks
        .catalogs
        .expect_find_by_id()
        .with(eq(CatalogKind::LensFamily), eq(12))
        .returning(|_, id| Ok(Some(catalog_item(id, "Multifocal"))));

    let response = mocks
        .app()
        .oneshot(request(
            Method::POST,
            "/api/v1/lens-families",
            Some(&token(&["vendedor"])),
            Some(json!({"name": "  Multifocal "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], 12);
    assert_eq!(body["data"]["name"], "Multifocal");
}

#[tokio::test]
async fn test_sale_without_open_register_is_409() {
    let mut mocks = Mocks::new();
    mocks.cash_registers.expect_find_open().returning(|| Ok(None));

    let response = mocks
        .app()
        .oneshot(request(
            Method::POST,
            "/api/v1/sales",
            Some(&token(&["vendedor"])),
            Some(json!({
                "service_order_id": 5,
                "payments": [{"payment_method_id": 1, "amount": "100.00"}]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_current_register_is_null_when_closed() {
    let mut mocks = Mocks::new();
    mocks.cash_registers.expect_find_open().returning(|| Ok(None));

    let response = mocks
        .app()
        .oneshot(request(Method::GET, "/api/v1/cash-registers/current", Some(&token(&[])), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], Value::Null);
}

#[tokio::test]
async fn test_login_is_throttled_per_email() {
    let mut mocks = Mocks::new();
    mocks.users.expect_find_by_email().returning(|_| Ok(None));
    let app = mocks.app();
    let attempt = || {
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "ana@otica.com", "password": "wrong-password"})),
        )
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(attempt()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let throttled = app.oneshot(attempt()).await.unwrap();
    assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let response = Mocks::new()
        .app()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "", "password": ""})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_with_unknown_token_is_401() {
    let mut mocks = Mocks::new();
    mocks.refresh_tokens.expect_find_by_hash().returning(|_| Ok(None));

    let response = mocks
        .app()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({"refresh_token": "deadbeef"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_is_204() {
    let mut mocks = Mocks::new();
    mocks.refresh_tokens.expect_find_by_hash().returning(|_| Ok(None));

    let response = mocks
        .app()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/logout",
            None,
            Some(json!({"refresh_token": "deadbeef"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = Mocks::new()
        .app()
        .oneshot(request(Method::GET, "/api/v1/health", None, None))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
