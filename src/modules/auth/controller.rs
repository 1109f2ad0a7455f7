use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::MessageResponse;
use wardmap_models::users::{CreateUserDto, UserResponse};

use crate::middleware::auth::AuthUser;
use crate::modules::auth::model::{
    AccessTokenResponse, ForgotPasswordDto, LoginRequestDto, LoginResponse,
    RefreshTokenRequestDto, ResetPasswordDto, ResetTokenResponse,
};
use crate::modules::auth::service::AuthService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Malformed request"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Employee id or full name already in use"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = AuthService::register_user(&state.db, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new("User registered successfully.", user)),
    ))
}

/// Log in with employee id and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Wrong password or malformed request"),
        (status = 404, description = "No active user with this employee id"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequestDto>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = AuthService::login_user(&state.db, dto, &state.jwt_config).await?;

    Ok(Json(LoginResponse {
        message: "Logged in successfully.".to_string(),
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        user: outcome.user,
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequestDto,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid or expired refresh token"),
        (status = 404, description = "Token is not the one stored for an active user")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequestDto>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let access_token = AuthService::refresh_access_token(&state.db, dto, &state.jwt_config).await?;

    Ok(Json(AccessTokenResponse {
        message: "Access token regenerated successfully.".to_string(),
        access_token,
    }))
}

/// Forget the caller's refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "User not found")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn logout_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout_user(&state.db, auth_user.user_id()).await?;

    Ok(Json(MessageResponse::new("Logged out successfully.")))
}

/// Answer the secret question to obtain a password reset token
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordDto,
    responses(
        (status = 200, description = "Reset token issued", body = ResetTokenResponse),
        (status = 400, description = "Wrong question or answer"),
        (status = 404, description = "No active user with this employee id")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordDto>,
) -> Result<Json<ResetTokenResponse>, AppError> {
    let reset_token = AuthService::forgot_password(&state.db, dto, &state.jwt_config).await?;

    Ok(Json(ResetTokenResponse {
        message: "Secret answer accepted. Use the token to reset the password.".to_string(),
        reset_token,
    }))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordDto,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 401, description = "Invalid or expired reset token"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::reset_password(&state.db, dto, &state.jwt_config).await?;

    Ok(Json(MessageResponse::new("Password has been reset successfully.")))
}
