//! Users, credentials and recovery secrets.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use wardmap_core::serde::{deserialize_optional_bool, deserialize_optional_i32};
use wardmap_core::{PaginationParams, SortOrder};

use crate::common::envelopes;
use crate::ids::{DepartmentId, SecretQuestionId, UserId};

/// Columns of [`User`], for queries that select a user.
pub const USER_COLUMNS: &str = "id, employee_id, first_name, middle_name, last_name, department_id, \
     is_deleted, created_at, updated_at";

/// The public face of a user. Credentials stay in [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub employee_id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub department_id: Option<DepartmentId>,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Secret material of a user row. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub refresh_token: Option<String>,
    pub secret_question_id: Option<SecretQuestionId>,
    pub secret_answer: Option<String>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 20), custom(function = "crate::common::not_blank"))]
    pub employee_id: String,
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub last_name: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 8, max = 72))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSecretDto {
    pub secret_question_id: SecretQuestionId,
    #[validate(length(min = 1, max = 200))]
    pub secret_answer: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyPasswordDto {
    #[validate(length(min = 1))]
    pub password: String,
}

/// The question a user picked for recovery. The answer is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct UserSecret {
    pub user_id: UserId,
    pub secret_question_id: Option<SecretQuestionId>,
    pub question: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserSortBy {
    #[default]
    Id,
    EmployeeId,
    FirstName,
    LastName,
    CreatedAt,
}

impl UserSortBy {
    pub fn column(self) -> &'static str {
        match self {
            UserSortBy::Id => "id",
            UserSortBy::EmployeeId => "employee_id",
            UserSortBy::FirstName => "first_name",
            UserSortBy::LastName => "last_name",
            UserSortBy::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Matches names or employee id, case-insensitively
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub department_id: Option<i32>,
    pub sort_by: Option<UserSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_deleted: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

envelopes!(User => UserResponse, UserListResponse);
envelopes!(UserSecret => UserSecretResponse, UserSecretListResponse);
