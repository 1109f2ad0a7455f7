use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::MessageResponse;
use wardmap_models::ids::UserId;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::{
    ChangePasswordDto, CreateUserDto, UpdateSecretDto, UpdateUserDto, UserFilterParams,
    UserListResponse, UserResponse, UserSecretResponse, VerifyPasswordDto,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/user",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or missing token"),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "Acting user or department not found"),
        (status = 409, description = "Employee id or full name already in use"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = UserService::create_user(&state.db, auth_user.user_id(), dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new("User created successfully.", user)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/user",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let (users, meta) = UserService::get_users(&state.db, filters).await?;

    Ok(Json(UserListResponse::new(
        "Users loaded successfully.",
        users,
        meta,
    )))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;

    Ok(Json(UserResponse::new(
        format!("User with the id {} found.", id),
        user,
    )))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}/secret",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user's secret question", body = UserSecretResponse),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user_secret(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserSecretResponse>, AppError> {
    let secret = UserService::get_user_secret(&state.db, id).await?;
    let message = if secret.secret_question_id.is_some() {
        "User secrets loaded successfully."
    } else {
        "User does not have a secret yet."
    };

    Ok(Json(UserSecretResponse::new(message, secret)))
}

#[utoipa::path(
    patch,
    path = "/api/user/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "Acting user, user or department not found"),
        (status = 409, description = "Full name already in use")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::update_user(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(UserResponse::new(
        format!("User with the id {} updated successfully.", id),
        user,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/user/{id}/change-password",
    params(("id" = i32, Path, description = "User ID, must be the caller")),
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Not the caller, or the old password is wrong"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::change_password(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(MessageResponse::new(format!(
        "Password of the user with the id {} updated successfully.",
        id
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/user/{id}/secret",
    params(("id" = i32, Path, description = "User ID, must be the caller")),
    request_body = UpdateSecretDto,
    responses(
        (status = 200, description = "Secret stored", body = UserSecretResponse),
        (status = 400, description = "Not the caller"),
        (status = 404, description = "User or secret question not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_user_secret(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateSecretDto>,
) -> Result<Json<UserSecretResponse>, AppError> {
    let secret = UserService::update_user_secret(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(UserSecretResponse::new(
        format!("User with the id {} secret updated successfully.", id),
        secret,
    )))
}

#[utoipa::path(
    post,
    path = "/api/user/{id}/verify-password",
    params(("id" = i32, Path, description = "User ID, must be the caller")),
    request_body = VerifyPasswordDto,
    responses(
        (status = 200, description = "Password matches", body = MessageResponse),
        (status = 400, description = "Not the caller, or the password is wrong"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn verify_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<VerifyPasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::verify_password(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(MessageResponse::new("User is verified")))
}

#[utoipa::path(
    delete,
    path = "/api/user/{id}/soft-delete",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User moved to trash", body = MessageResponse),
        (status = 400, description = "Users cannot delete themselves"),
        (status = 404, description = "Acting user or user not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn soft_delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::soft_delete_user(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "User with the id {} moved to trash.",
        id
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/user/{id}/retrieve",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved", body = MessageResponse),
        (status = 404, description = "Acting user or soft-deleted user not found"),
        (status = 409, description = "An active user now has the same full name")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn retrieve_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::retrieve_user(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "User with the id {} retrieved.",
        id
    ))))
}
