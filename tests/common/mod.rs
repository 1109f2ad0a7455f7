#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use wardmap::router::init_router;
use wardmap::state::AppState;
use wardmap::wardmap_config::{CorsConfig, JwtConfig, RateLimitConfig, UploadConfig};
use wardmap::wardmap_core::hash_password;

pub const TEST_PASSWORD: &str = "abcd_1234";

/// The router plus the upload directory it writes to. The directory is
/// removed when this is dropped.
pub struct TestApp {
    pub router: Router,
    pub uploads: TempDir,
}

pub struct TestUser {
    pub id: i32,
    pub employee_id: String,
    pub password: String,
}

pub fn test_state(pool: PgPool, rate_limit_config: RateLimitConfig, uploads: &TempDir) -> AppState {
    dotenvy::dotenv().ok();
    AppState::new(
        pool,
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        rate_limit_config,
        UploadConfig {
            upload_dir: uploads.path().to_path_buf(),
            ..UploadConfig::default()
        },
    )
}

pub fn setup_test_app(pool: PgPool) -> TestApp {
    setup_test_app_with_rate_limit(pool, RateLimitConfig::disabled())
}

pub fn setup_test_app_with_rate_limit(pool: PgPool, rate_limit_config: RateLimitConfig) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let router = init_router(test_state(pool, rate_limit_config, &uploads));
    TestApp { router, uploads }
}

pub async fn create_test_user(pool: &PgPool, employee_id: &str, first: &str, last: &str) -> TestUser {
    let hashed = hash_password(TEST_PASSWORD).unwrap();
    let id: i32 = sqlx::query_scalar(
        r#"INSERT INTO users (employee_id, first_name, last_name, password)
           VALUES ($1, $2, $3, $4) RETURNING id"#,
    )
    .bind(employee_id)
    .bind(first)
    .bind(last)
    .bind(hashed)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        employee_id: employee_id.to_string(),
        password: TEST_PASSWORD.to_string(),
    }
}

pub async fn create_test_department(pool: &PgPool, code: &str, name: &str) -> i32 {
    let division: i32 = sqlx::query_scalar(
        r#"INSERT INTO divisions (code, name) VALUES ($1, $1 || ' Division')
           ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name
           RETURNING id"#,
    )
    .bind("TST")
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query_scalar(
        "INSERT INTO departments (code, name, division_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(name)
    .bind(division)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn log_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM logs")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Builds a request with an optional JSON body and bearer token.
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Logs in and returns `(access_token, refresh_token)`.
pub async fn login(app: &Router, user: &TestUser) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "employee_id": user.employee_id,
                "password": user.password,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

/// A multipart body with one part per `(file name, content type, bytes)`
/// under `field`.
pub fn multipart_request(
    uri: &str,
    method: &str,
    token: &str,
    field: &str,
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let boundary = "wardmap-test-boundary";
    let mut body = Vec::new();
    for (file_name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}
