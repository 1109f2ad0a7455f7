use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const PASSWORD_RESET_PURPOSE: &str = "password_reset";

/// Access token claims. `sub` is the user's numeric id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub sub: i32,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: i32,
    pub exp: usize,
    pub iat: usize,
}

/// Only accepted by the reset-password endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetClaims {
    pub sub: i32,
    pub purpose: String,
    pub exp: usize,
    pub iat: usize,
}
