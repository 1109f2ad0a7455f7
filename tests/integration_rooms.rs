mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestUser, create_test_user, log_count, login, multipart_request, request, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

struct Fixture {
    token: String,
    floor_id: i64,
    room_id: i64,
}

async fn fixture(app: &Router, user: &TestUser) -> Fixture {
    let (token, _) = login(app, user).await;

    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/floor",
            Some(token.as_str()),
            Some(json!({"name": "Ground", "level": 0, "code": "GF"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let floor_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/room",
            Some(token.as_str()),
            Some(json!({"name": "Radiology", "code": "RAD-01", "floor_id": floor_id})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Room created successfully");
    let room_id = body["data"]["id"].as_i64().unwrap();

    Fixture {
        token,
        floor_id,
        room_id,
    }
}

async fn upload(app: &Router, fx: &Fixture, names: &[&str]) -> (StatusCode, Value) {
    let files: Vec<(&str, &str, &[u8])> = names.iter().map(|name| (*name, "image/png", PNG)).collect();
    send(
        app,
        multipart_request(
            &format!("/api/room/{}/upload", fx.room_id),
            "POST",
            &fx.token,
            "files",
            &files,
        ),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_room_requires_active_floor(pool: PgPool) {
    let user = create_test_user(&pool, "00005001", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;

    send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/floor/{}/soft-delete", fx.floor_id),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/room",
            Some(fx.token.as_str()),
            Some(json!({"name": "Laboratory", "code": "LAB-01", "floor_id": fx.floor_id})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Floor with the id {} not found.", fx.floor_id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_room_conflicts(pool: PgPool) {
    let user = create_test_user(&pool, "00005002", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/room",
            Some(fx.token.as_str()),
            Some(json!({"name": "radiology", "code": "rad-01", "floor_id": fx.floor_id})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Room already exists.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_room_images(pool: PgPool) {
    let user = create_test_user(&pool, "00005003", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;

    let (status, body) = upload(&app.router, &fx, &["front.png", "back.png"]).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(
        body["message"],
        format!("Images uploaded to the room with the id {} successfully.", fx.room_id)
    );
    let images = body["data"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["is_main_image"], true);
    assert_eq!(images[1]["is_main_image"], false);

    let (_, body) = upload(&app.router, &fx, &["side.png"]).await;
    assert_eq!(body["data"][0]["is_main_image"], false);

    let location = images[0]["image_location"].as_str().unwrap();
    assert!(location.starts_with(&format!("room_images/{}-", fx.room_id)));
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/uploads/{}", location))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(
        &app.router,
        request("GET", &format!("/api/room/{}", fx.room_id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["images"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["name"], "Radiology");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_rejects_whole_batch(pool: PgPool) {
    let user = create_test_user(&pool, "00005004", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;
    let before = log_count(&pool).await;

    let (status, _) = send(
        &app.router,
        multipart_request(
            &format!("/api/room/{}/upload", fx.room_id),
            "POST",
            &fx.token,
            "files",
            &[
                ("front.png", "image/png", PNG),
                ("map.webp", "image/webp", &b"RIFF0000WEBP"[..]),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(log_count(&pool).await, before);
    let images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_images")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(images, 0);
    assert!(!app.uploads.path().join("room_images").exists()
        || std::fs::read_dir(app.uploads.path().join("room_images")).unwrap().next().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_and_retrieve_images(pool: PgPool) {
    let user = create_test_user(&pool, "00005005", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;
    let (_, body) = upload(&app.router, &fx, &["front.png", "back.png"]).await;
    let first = body["data"][0]["id"].as_i64().unwrap();
    let second = body["data"][1]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/room/{}/delete-images?image_ids=abc", fx.room_id),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid image id 'abc'");

    let (status, body) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/room/{}/delete-images?image_ids={},9999", fx.room_id, first),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        format!("Room image with the id 9999 not found in Room with the id {}", fx.room_id)
    );

    let before = log_count(&pool).await;
    let (status, body) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/room/{}/delete-images?image_ids={},{}", fx.room_id, second, first),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        format!(
            "Room Images with the ids {}, {} deleted of room with the id {}.",
            first, second, fx.room_id
        )
    );
    assert_eq!(log_count(&pool).await, before + 1);

    // Already deleted: nothing changes and nothing is logged.
    let (status, _) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/room/{}/delete-images?image_ids={}", fx.room_id, first),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log_count(&pool).await, before + 1);

    let (_, body) = send(
        &app.router,
        request("GET", &format!("/api/room/{}/photos?is_deleted=true", fx.room_id), None, None),
    )
    .await;
    assert_eq!(body["meta"]["total"], 2);

    let (status, _) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/room/{}/retrieve-images?image_ids={}", fx.room_id, first),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app.router,
        request("GET", &format!("/api/room/{}/photos", fx.room_id), None, None),
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], first);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_image_ids(pool: PgPool) {
    let user = create_test_user(&pool, "00005006", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;

    let (status, body) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/room/{}/delete-images", fx.room_id),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Selected images ids are missing.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_room_becomes_complete(pool: PgPool) {
    let user = create_test_user(&pool, "00005007", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/room/{}", fx.room_id),
            Some(fx.token.as_str()),
            Some(json!({"detail": "X-ray and CT", "direction": "Turn left after the lobby"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "incomplete");

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            &format!("/api/room/{}/directions", fx.room_id),
            Some(fx.token.as_str()),
            Some(json!({"direction_pattern": {"steps": [[0, 0], [3, 4]]}, "starting_point": 1})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "incomplete");

    let (status, _) = send(
        &app.router,
        request(
            "POST",
            &format!("/api/room/{}/directions", fx.room_id),
            Some(fx.token.as_str()),
            Some(json!({"direction_pattern": {}, "starting_point": 1})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    upload(&app.router, &fx, &["front.png"]).await;

    let (_, body) = send(
        &app.router,
        request("GET", &format!("/api/room/{}", fx.room_id), None, None),
    )
    .await;
    assert_eq!(body["data"]["status"], "complete");

    let (_, body) = send(&app.router, request("GET", "/api/room?status=complete", None, None)).await;
    assert_eq!(body["meta"]["total"], 1);
    let (_, body) = send(&app.router, request("GET", "/api/room?status=incomplete", None, None)).await;
    assert_eq!(body["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_room_lifecycle_and_purge(pool: PgPool) {
    let user = create_test_user(&pool, "00005008", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;
    let (_, body) = upload(&app.router, &fx, &["front.png"]).await;
    let location = body["data"][0]["image_location"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/room/{}/soft-delete", fx.room_id),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = upload(&app.router, &fx, &["late.png"]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app.router,
        request("GET", &format!("/api/room/{}", fx.room_id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Room with the id {} not found.", fx.room_id));

    let (status, _) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/room/{}", fx.room_id),
            Some(fx.token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.uploads.path().join(&location).exists());

    let images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_images")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(images, 0);

    let snapshot: Value = sqlx::query_scalar(
        "SELECT log FROM logs WHERE type_id = 2 AND method_id = 4",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(snapshot["code"], "RAD-01");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_retrieve_room_conflicts_when_key_taken(pool: PgPool) {
    let user = create_test_user(&pool, "00005009", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let fx = fixture(&app.router, &user).await;

    let (status, _) = send(
        &app.router,
        request("DELETE", &format!("/api/room/{}/soft-delete", fx.room_id), Some(fx.token.as_str()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        request(
            "POST",
            "/api/room",
            Some(fx.token.as_str()),
            Some(json!({"name": "radiology", "code": "rad-01", "floor_id": fx.floor_id})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let before = log_count(&pool).await;
    let (status, body) = send(
        &app.router,
        request("PATCH", &format!("/api/room/{}/retrieve", fx.room_id), Some(fx.token.as_str()), None),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Room already exists.");
    assert_eq!(log_count(&pool).await, before);
}
