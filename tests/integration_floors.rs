mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{create_test_user, log_count, login, multipart_request, request, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_floor(app: &axum::Router, token: &str, name: &str, level: i32, code: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/floor",
            Some(token),
            Some(json!({"name": name, "level": level, "code": code})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_and_list_floors(pool: PgPool) {
    let user = create_test_user(&pool, "00004001", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;

    let ground = create_floor(&app.router, &token, "Ground", 0, "GF").await;
    create_floor(&app.router, &token, "First", 1, "1F").await;
    assert_eq!(ground["creator_id"], user.id);
    assert!(ground["image_location"].is_null());

    let (status, body) = send(&app.router, request("GET", "/api/floor", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Floors loaded successfully.");
    assert_eq!(body["meta"]["total"], 2);

    let (status, body) = send(
        &app.router,
        request("GET", &format!("/api/floor/{}", ground["id"]), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "GF");

    let logged: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs WHERE type_id = 1 AND method_id = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(logged, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_floor_conflicts(pool: PgPool) {
    let user = create_test_user(&pool, "00004002", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    create_floor(&app.router, &token, "Ground", 0, "GF").await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/floor",
            Some(token.as_str()),
            Some(json!({"name": "ground", "level": 0, "code": "gf"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Floor already exists.");
    assert_eq!(log_count(&pool).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_blank_floor_name_is_rejected(pool: PgPool) {
    let user = create_test_user(&pool, "00004010", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/floor",
            Some(token.as_str()),
            Some(json!({"name": "   ", "level": 0, "code": "GF"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "name must not be blank");
    assert_eq!(log_count(&pool).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_huge_page_returns_empty_list(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app.router,
        request("GET", "/api/floor?page=9223372036854775807", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["meta"]["has_more"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_floor_logs_previous_values(pool: PgPool) {
    let user = create_test_user(&pool, "00004003", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    let floor = create_floor(&app.router, &token, "Ground", 0, "GF").await;

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/floor/{}", floor["id"]),
            Some(token.as_str()),
            Some(json!({"name": "Lobby"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Lobby");
    assert_eq!(body["data"]["code"], "GF");

    let log: Value = sqlx::query_scalar("SELECT log FROM logs ORDER BY id DESC LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(log, json!({"name": "Ground"}));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_floor_lifecycle(pool: PgPool) {
    let user = create_test_user(&pool, "00004004", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    let floor = create_floor(&app.router, &token, "Ground", 0, "GF").await;
    let id = floor["id"].as_i64().unwrap();

    let (status, body) = send(
        &app.router,
        request("DELETE", &format!("/api/floor/{}/soft-delete", id), Some(token.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Floor with the id {} moved to trash.", id));

    let (status, _) = send(&app.router, request("GET", &format!("/api/floor/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app.router, request("GET", "/api/floor?is_deleted=true", None, None)).await;
    assert_eq!(body["meta"]["total"], 1);

    let (status, body) = send(
        &app.router,
        request("PATCH", &format!("/api/floor/{}/retrieve", id), Some(token.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Floor with the id {} retrieved.", id));

    let (status, body) = send(
        &app.router,
        request("DELETE", &format!("/api/floor/{}", id), Some(token.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Floor with the id {} deleted successfully.", id));

    let methods: Vec<i32> = sqlx::query_scalar("SELECT method_id FROM logs WHERE type_id = 1 ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(methods, vec![1, 3, 5, 4]);

    let (status, _) = send(&app.router, request("GET", &format!("/api/floor/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_purge_floor_with_rooms_conflicts(pool: PgPool) {
    let user = create_test_user(&pool, "00004005", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    let floor = create_floor(&app.router, &token, "Ground", 0, "GF").await;

    let (status, _) = send(
        &app.router,
        request(
            "POST",
            "/api/room",
            Some(token.as_str()),
            Some(json!({"name": "Pharmacy", "code": "PH-01", "floor_id": floor["id"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let before = log_count(&pool).await;
    let (status, body) = send(
        &app.router,
        request("DELETE", &format!("/api/floor/{}", floor["id"]), Some(token.as_str()), None),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Floor is still referenced and cannot be deleted.");
    assert_eq!(log_count(&pool).await, before);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rooms_of_floor(pool: PgPool) {
    let user = create_test_user(&pool, "00004006", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    let ground = create_floor(&app.router, &token, "Ground", 0, "GF").await;
    let first = create_floor(&app.router, &token, "First", 1, "1F").await;

    let (_, body) = send(
        &app.router,
        request(
            "POST",
            "/api/room",
            Some(token.as_str()),
            Some(json!({"name": "Pharmacy", "code": "PH-01", "floor_id": ground["id"]})),
        ),
    )
    .await;
    let room_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app.router,
        request("GET", &format!("/api/floor/{}/room", ground["id"]), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["status"], "incomplete");

    let (status, _) = send(
        &app.router,
        request("GET", &format!("/api/floor/{}/room/{}", ground["id"], room_id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        request("GET", &format!("/api/floor/{}/room/{}", first["id"], room_id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        format!("Room with the id {} not found in Floor with the id {}", room_id, first["id"])
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_floor_map(pool: PgPool) {
    let user = create_test_user(&pool, "00004007", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    let floor = create_floor(&app.router, &token, "Ground", 0, "GF").await;
    let uri = format!("/api/floor/{}/upload", floor["id"]);

    let (status, body) = send(
        &app.router,
        multipart_request(&uri, "PATCH", &token, "file", &[("notes.txt", "text/plain", &b"hello"[..])]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, body) = send(
        &app.router,
        multipart_request(&uri, "PATCH", &token, "other", &[("map.png", "image/png", &b"png"[..])]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please upload at least one file.");

    let (status, body) = send(
        &app.router,
        multipart_request(&uri, "PATCH", &token, "file", &[("map.webp", "image/webp", &b"RIFF0000WEBP"[..])]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body["message"],
        format!("Map has been set to the floor with the id {}", floor["id"])
    );
    let location = body["data"]["image_location"].as_str().unwrap().to_string();
    assert!(location.starts_with("floor_images/"));
    assert!(app.uploads.path().join(&location).exists());

    let log: Value = sqlx::query_scalar("SELECT log FROM logs ORDER BY id DESC LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(log, json!({"image_location": null}));

    let response = {
        use tower::ServiceExt;
        app.router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/uploads/{}", location))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_replacing_floor_map_removes_old_file(pool: PgPool) {
    let user = create_test_user(&pool, "00004008", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    let floor = create_floor(&app.router, &token, "Ground", 0, "GF").await;
    let uri = format!("/api/floor/{}/upload", floor["id"]);

    let (status, body) = send(
        &app.router,
        multipart_request(&uri, "PATCH", &token, "file", &[("first.png", "image/png", &b"png-1"[..])]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let first = body["data"]["image_location"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        multipart_request(&uri, "PATCH", &token, "file", &[("second.png", "image/png", &b"png-2"[..])]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let second = body["data"]["image_location"].as_str().unwrap().to_string();

    assert_ne!(first, second);
    assert!(!app.uploads.path().join(&first).exists());
    assert!(app.uploads.path().join(&second).exists());

    let log: Value = sqlx::query_scalar("SELECT log FROM logs ORDER BY id DESC LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(log, json!({"image_location": first}));

    let (status, _) = send(
        &app.router,
        request("DELETE", &format!("/api/floor/{}", floor["id"]), Some(token.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.uploads.path().join(&second).exists());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_retrieve_floor_conflicts_when_key_taken(pool: PgPool) {
    let user = create_test_user(&pool, "00004009", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;
    let trashed = create_floor(&app.router, &token, "Ground", 0, "GF").await;

    let (status, _) = send(
        &app.router,
        request("DELETE", &format!("/api/floor/{}/soft-delete", trashed["id"]), Some(token.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    create_floor(&app.router, &token, "Ground", 0, "GF").await;

    let before = log_count(&pool).await;
    let (status, body) = send(
        &app.router,
        request("PATCH", &format!("/api/floor/{}/retrieve", trashed["id"]), Some(token.as_str()), None),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Floor already exists.");
    assert_eq!(log_count(&pool).await, before);

    let (_, body) = send(&app.router, request("GET", "/api/floor?is_deleted=true", None, None)).await;
    assert_eq!(body["meta"]["total"], 1);
}
