use anyhow::anyhow;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use wardmap_auth::{Claims, verify_token};
use wardmap_core::AppError;
use wardmap_models::ids::UserId;

use crate::state::AppState;

/// Claims of a valid access token.
///
/// A missing or malformed `Authorization` header is a 400; a token that
/// fails verification is a 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        UserId(self.0.sub)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::bad_request(anyhow!("Token is missing")))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::bad_request(anyhow!("Invalid authorization header format")))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::bad_request(anyhow!("Invalid authorization header format")))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}
