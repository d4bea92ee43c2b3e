#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use repairdesk_api::auth::jwt::{issue_token, JwtConfig};
use repairdesk_api::config::ServerConfig;
use repairdesk_api::router::build_app_router;
use repairdesk_api::state::AppState;
use repairdesk_core::rate_limit::RateLimitPolicy;
use sqlx::PgPool;
use tower::ServiceExt;

pub const MANAGER_EMAIL: &str = "manager@shop.test";
pub const TECH_EMAIL: &str = "tech@shop.test";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        search_rate_limit: RateLimitPolicy::search(),
        store_sweep_interval_secs: 60,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router over `pool` with the test config.
///
/// Uses the same [`build_app_router`] as `main.rs`, so the middleware stack
/// is exercised too. Clone the returned router to send several requests
/// against the same rate limiter and caches.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    build_app_router(AppState::new(pool, config))
}

/// A config whose search limit is `max_requests` per minute.
pub fn config_with_search_limit(max_requests: u32) -> ServerConfig {
    ServerConfig {
        search_rate_limit: RateLimitPolicy::new(max_requests, Duration::from_secs(60)),
        ..test_config()
    }
}

pub fn token(user_id: i64, email: &str, is_manager: bool) -> String {
    issue_token(user_id, email, is_manager, &test_config().jwt)
        .expect("token generation should succeed")
}

pub fn manager_token() -> String {
    token(1, MANAGER_EMAIL, true)
}

pub fn tech_token() -> String {
    token(2, TECH_EMAIL, false)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::put(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn customer_json(first: &str, last: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "firstName": first,
        "lastName": last,
        "email": email,
        "phone": "555-0100",
        "address1": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "zip": "62701",
    })
}

/// Create a customer through the API and return its id.
pub async fn create_customer(app: &Router, first: &str, last: &str, email: &str) -> i64 {
    let response = post_json(
        app,
        "/api/v1/customers",
        &manager_token(),
        customer_json(first, last, email),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a ticket through the API and return its id.
pub async fn create_ticket(app: &Router, customer_id: i64, title: &str, tech: &str) -> i64 {
    let response = post_json(
        app,
        "/api/v1/tickets",
        &manager_token(),
        serde_json::json!({ "customerId": customer_id, "title": title, "tech": tech }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
