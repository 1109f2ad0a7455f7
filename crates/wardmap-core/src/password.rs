//! bcrypt hashing for passwords and secret answers.

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

/// Secret answers are compared case-insensitively, ignoring surrounding whitespace.
pub fn normalize_secret_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}
