//! Token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use wardmap_config::JwtConfig;
use wardmap_core::AppError;

use crate::claims::{Claims, PASSWORD_RESET_PURPOSE, PasswordResetClaims, RefreshTokenClaims};

fn now() -> usize {
    Utc::now().timestamp() as usize
}

fn sign<T: Serialize>(claims: &T, secret: &str, kind: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create {} token: {}", kind, e)))
}

fn open<T: DeserializeOwned>(token: &str, secret: &str) -> Option<T> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn create_access_token(
    user_id: i32,
    employee_id: &str,
    first_name: &str,
    last_name: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = Claims {
        sub: user_id,
        employee_id: employee_id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        exp: iat + jwt_config.access_token_expiry as usize,
        iat,
    };

    sign(&claims, &jwt_config.secret, "access")
}

/// Fails with 401 on a bad signature, a malformed token or expiry.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    open(token, &jwt_config.secret)
        .ok_or_else(|| AppError::unauthorized("Invalid or expired token".to_string()))
}

pub fn create_refresh_token(user_id: i32, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let iat = now();
    let claims = RefreshTokenClaims {
        sub: user_id,
        exp: iat + jwt_config.refresh_token_expiry as usize,
        iat,
    };

    sign(&claims, &jwt_config.refresh_secret, "refresh")
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    open(token, &jwt_config.refresh_secret)
        .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token".to_string()))
}

/// Reset tokens share the access secret but carry a purpose marker, so an
/// access token can never pass as one.
pub fn create_password_reset_token(
    user_id: i32,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = PasswordResetClaims {
        sub: user_id,
        purpose: PASSWORD_RESET_PURPOSE.to_string(),
        exp: iat + jwt_config.reset_token_expiry as usize,
        iat,
    };

    sign(&claims, &jwt_config.secret, "password reset")
}

pub fn verify_password_reset_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<PasswordResetClaims, AppError> {
    open::<PasswordResetClaims>(token, &jwt_config.secret)
        .filter(|claims| claims.purpose == PASSWORD_RESET_PURPOSE)
        .ok_or_else(|| AppError::unauthorized("Invalid or expired reset token".to_string()))
}
