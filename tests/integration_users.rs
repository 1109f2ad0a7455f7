mod common;

use axum::http::StatusCode;
use common::{create_test_department, create_test_user, log_count, login, request, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn latest_log(pool: &PgPool) -> (i32, i32, Value) {
    sqlx::query_as("SELECT type_id, method_id, log FROM logs ORDER BY id DESC LIMIT 1")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_user_is_audited_without_password(pool: PgPool) {
    let admin = create_test_user(&pool, "00003001", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &admin).await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/user",
            Some(token.as_str()),
            Some(json!({
                "employee_id": "00003002",
                "first_name": "Bola",
                "middle_name": "T",
                "last_name": "Ade",
                "password": "secret_123"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully.");
    assert_eq!(body["data"]["middle_name"], "T");

    let (type_id, method_id, log) = latest_log(&pool).await;
    assert_eq!((type_id, method_id), (3, 1));
    assert_eq!(log["employee_id"], "00003002");
    assert!(log.get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_user_requires_token(pool: PgPool) {
    let app = setup_test_app(pool.clone());

    let (status, _) = send(
        &app.router,
        request(
            "POST",
            "/api/user",
            None,
            Some(json!({
                "employee_id": "00003003",
                "first_name": "Bola",
                "last_name": "Ade",
                "password": "secret_123"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(log_count(&pool).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_user_duplicate_full_name(pool: PgPool) {
    let admin = create_test_user(&pool, "00003004", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &admin).await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/user",
            Some(token.as_str()),
            Some(json!({
                "employee_id": "00003005",
                "first_name": "ada",
                "last_name": "OBI",
                "password": "secret_123"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists.");
    assert_eq!(log_count(&pool).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_users_filters_and_paginates(pool: PgPool) {
    let department = create_test_department(&pool, "ICU", "Icu").await;
    create_test_user(&pool, "00003010", "Ada", "Obi").await;
    create_test_user(&pool, "00003011", "Bola", "Ade").await;
    let chioma = create_test_user(&pool, "00003012", "Chioma", "Eze").await;
    sqlx::query("UPDATE users SET department_id = $1 WHERE id = $2")
        .bind(department)
        .bind(chioma.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool);

    let (status, body) = send(&app.router, request("GET", "/api/user?limit=2", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["has_more"], true);

    let (_, body) = send(&app.router, request("GET", "/api/user?search=bola", None, None)).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["employee_id"], "00003011");

    let (_, body) = send(
        &app.router,
        request("GET", &format!("/api/user?department_id={}", department), None, None),
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], chioma.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_unknown_user(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(&app.router, request("GET", "/api/user/4242", None, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User with the id 4242 not found.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_user_records_previous_values(pool: PgPool) {
    let admin = create_test_user(&pool, "00003020", "Ada", "Obi").await;
    let target = create_test_user(&pool, "00003021", "Bola", "Ade").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &admin).await;

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/user/{}", target.id),
            Some(token.as_str()),
            Some(json!({"first_name": "Bolanle"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Bolanle");
    assert_eq!(body["data"]["last_name"], "Ade");

    let (type_id, method_id, log) = latest_log(&pool).await;
    assert_eq!((type_id, method_id), (3, 2));
    assert_eq!(log, json!({"first_name": "Bola"}));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password(pool: PgPool) {
    let user = create_test_user(&pool, "00003030", "Ada", "Obi").await;
    let other = create_test_user(&pool, "00003031", "Bola", "Ade").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/user/{}/change-password", other.id),
            Some(token.as_str()),
            Some(json!({"old_password": user.password, "new_password": "another_pw1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Ids mismatch.");

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/user/{}/change-password", user.id),
            Some(token.as_str()),
            Some(json!({"old_password": "not_my_pw", "new_password": "another_pw1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Old password is incorrect.");

    let (status, _) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/user/{}/change-password", user.id),
            Some(token.as_str()),
            Some(json!({"old_password": user.password, "new_password": "another_pw1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, log) = latest_log(&pool).await;
    assert_eq!(log, json!({"password": "[REDACTED]"}));

    let (status, _) = send(
        &app.router,
        request(
            "POST",
            &format!("/api/user/{}/verify-password", user.id),
            Some(token.as_str()),
            Some(json!({"password": "another_pw1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_password_wrong(pool: PgPool) {
    let user = create_test_user(&pool, "00003040", "Ada", "Obi").await;
    let app = setup_test_app(pool);
    let (token, _) = login(&app.router, &user).await;

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            &format!("/api/user/{}/verify-password", user.id),
            Some(token.as_str()),
            Some(json!({"password": "nope_nope"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Incorrect password.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_user_secret_never_exposes_answer(pool: PgPool) {
    let user = create_test_user(&pool, "00003050", "Ada", "Obi").await;
    let question: i32 =
        sqlx::query_scalar("INSERT INTO secret_questions (question) VALUES ('First school?') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &user).await;

    let (status, body) = send(
        &app.router,
        request("GET", &format!("/api/user/{}/secret", user.id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User does not have a secret yet.");

    let (status, _) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/user/{}/secret", user.id),
            Some(token.as_str()),
            Some(json!({"secret_question_id": question, "secret_answer": "Kings College"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app.router,
        request("GET", &format!("/api/user/{}/secret", user.id), None, None),
    )
    .await;
    assert_eq!(body["data"]["question"], "First school?");
    assert!(body["data"].get("secret_answer").is_none());

    let stored: String = sqlx::query_scalar("SELECT secret_answer FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(stored, "kings college");

    let (_, _, log) = latest_log(&pool).await;
    assert_eq!(log["secret_answer"], "[REDACTED]");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_soft_delete_and_retrieve_user(pool: PgPool) {
    let admin = create_test_user(&pool, "00003060", "Ada", "Obi").await;
    let target = create_test_user(&pool, "00003061", "Bola", "Ade").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &admin).await;

    let (status, body) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/user/{}/soft-delete", admin.id),
            Some(token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot delete your own account.");

    let (status, body) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/user/{}/soft-delete", target.id),
            Some(token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("User with the id {} moved to trash.", target.id));

    let (_, _, log) = latest_log(&pool).await;
    assert_eq!(log, json!({"is_deleted": false}));

    let (status, _) = send(
        &app.router,
        request("GET", &format!("/api/user/{}", target.id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Soft-deleting twice writes nothing.
    let before = log_count(&pool).await;
    let (status, _) = send(
        &app.router,
        request(
            "DELETE",
            &format!("/api/user/{}/soft-delete", target.id),
            Some(token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log_count(&pool).await, before);

    let (status, _) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/user/{}/retrieve", target.id),
            Some(token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            &format!("/api/user/{}/retrieve", target.id),
            Some(token.as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("User with the id {} not found.", target.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_actor_cannot_mutate(pool: PgPool) {
    let admin = create_test_user(&pool, "00003070", "Ada", "Obi").await;
    let app = setup_test_app(pool.clone());
    let (token, _) = login(&app.router, &admin).await;
    sqlx::query("UPDATE users SET is_deleted = TRUE WHERE id = $1")
        .bind(admin.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/floor",
            Some(token.as_str()),
            Some(json!({"name": "Ground", "level": 0, "code": "GF"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("User with the id {} not found.", admin.id));
    assert_eq!(log_count(&pool).await, 0);
}
