mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::setup_test_app_with_rate_limit;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use wardmap::wardmap_config::RateLimitConfig;

/// One auth request and two general requests per client, refilled once a minute
fn strict_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        general_per_second: 60,
        general_burst_size: 2,
        auth_per_second: 60,
        auth_burst_size: 1,
    }
}

fn login_request(ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            serde_json::to_string(&json!({
                "employee_id": "99999999",
                "password": "password123"
            }))
            .unwrap(),
        ))
        .unwrap()
}

fn get_request(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_auth_rate_limit_exceeded(pool: PgPool) {
    let app = setup_test_app_with_rate_limit(pool, strict_rate_limit_config());

    // Processed: the employee id is unknown
    let response = app.router.clone().oneshot(login_request("192.168.1.100")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.router.clone().oneshot(login_request("192.168.1.100")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_different_ips_have_separate_limits(pool: PgPool) {
    let app = setup_test_app_with_rate_limit(pool, strict_rate_limit_config());

    let response = app.router.clone().oneshot(login_request("10.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.router.clone().oneshot(login_request("10.0.0.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_general_rate_limit(pool: PgPool) {
    let app = setup_test_app_with_rate_limit(pool, strict_rate_limit_config());

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(get_request("/api/server-status", "172.16.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/server-status", "172.16.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_docs_are_not_rate_limited(pool: PgPool) {
    let app = setup_test_app_with_rate_limit(pool, strict_rate_limit_config());

    for _ in 0..4 {
        let response = app
            .router
            .clone()
            .oneshot(get_request("/api-docs/openapi.json", "172.16.0.2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_disabled_rate_limit(pool: PgPool) {
    let app = setup_test_app_with_rate_limit(pool, RateLimitConfig::disabled());

    for _ in 0..5 {
        let response = app
            .router
            .clone()
            .oneshot(get_request("/api/server-status", "172.16.0.3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
