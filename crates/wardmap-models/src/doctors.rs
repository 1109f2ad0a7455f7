use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use wardmap_core::serde::deserialize_optional_i32;
use wardmap_core::{PaginationParams, SortOrder};

use crate::common::envelopes;
use crate::ids::{DepartmentId, DoctorId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Doctor {
    pub id: DoctorId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub specialization: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DoctorSortBy {
    #[default]
    Id,
    FirstName,
    LastName,
    Specialization,
}

impl DoctorSortBy {
    pub fn column(self) -> &'static str {
        match self {
            DoctorSortBy::Id => "id",
            DoctorSortBy::FirstName => "first_name",
            DoctorSortBy::LastName => "last_name",
            DoctorSortBy::Specialization => "specialization",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DoctorFilterParams {
    /// Matches first, middle or last name
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub department_id: Option<i32>,
    pub sort_by: Option<DoctorSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

envelopes!(Doctor => DoctorResponse, DoctorListResponse);
