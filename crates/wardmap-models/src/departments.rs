use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use wardmap_core::serde::deserialize_optional_i32;
use wardmap_core::{PaginationParams, SortOrder};

use crate::common::envelopes;
use crate::ids::{DepartmentId, DivisionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Division {
    pub id: DivisionId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub code: String,
    pub division_id: DivisionId,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DepartmentWithDivision {
    #[serde(flatten)]
    pub department: Department,
    pub division: Division,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateDepartmentDto {
    #[validate(length(min = 1, max = 150), custom(function = "crate::common::not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 20), custom(function = "crate::common::not_blank"))]
    pub code: String,
    pub division_id: DivisionId,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateDepartmentDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 150), custom(function = "crate::common::not_blank"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 20), custom(function = "crate::common::not_blank"))]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division_id: Option<DivisionId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentSortBy {
    #[default]
    Id,
    Name,
    Code,
    DivisionId,
}

impl DepartmentSortBy {
    pub fn column(self) -> &'static str {
        match self {
            DepartmentSortBy::Id => "id",
            DepartmentSortBy::Name => "name",
            DepartmentSortBy::Code => "code",
            DepartmentSortBy::DivisionId => "division_id",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentFilterParams {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub division_id: Option<i32>,
    pub sort_by: Option<DepartmentSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DivisionListResponse {
    pub message: String,
    pub data: Vec<Division>,
}

envelopes!(Department => DepartmentResponse, DepartmentListResponse);
envelopes!(DepartmentWithDivision => DepartmentDetailResponse, DepartmentDetailListResponse);
