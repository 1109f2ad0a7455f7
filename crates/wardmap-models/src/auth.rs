//! Login, token refresh and password recovery DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::SecretQuestionId;
use crate::users::User;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(length(min = 1))]
    pub employee_id: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequestDto {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub message: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordDto {
    #[validate(length(min = 1))]
    pub employee_id: String,
    pub secret_question_id: SecretQuestionId,
    #[validate(length(min = 1))]
    pub secret_answer: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResetTokenResponse {
    pub message: String,
    pub reset_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordDto {
    #[validate(length(min = 1))]
    pub reset_token: String,
    #[validate(length(min = 8, max = 72))]
    pub new_password: String,
}
