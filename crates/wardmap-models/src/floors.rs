//! Floors and their map images.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use wardmap_core::serde::{deserialize_optional_bool, deserialize_optional_i32};
use wardmap_core::{PaginationParams, SortOrder};

use crate::common::envelopes;
use crate::ids::{FloorId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Floor {
    pub id: FloorId,
    pub name: String,
    pub level: i32,
    pub code: String,
    /// Storage key of the floor map, served under the upload public path
    pub image_location: Option<String>,
    pub creator_id: UserId,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateFloorDto {
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub name: String,
    #[validate(range(min = -20, max = 300))]
    pub level: i32,
    #[validate(length(min = 1, max = 20), custom(function = "crate::common::not_blank"))]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateFloorDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -20, max = 300))]
    pub level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 20), custom(function = "crate::common::not_blank"))]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FloorSortBy {
    #[default]
    Id,
    Name,
    Code,
    Level,
    CreatedAt,
    UpdatedAt,
}

impl FloorSortBy {
    pub fn column(self) -> &'static str {
        match self {
            FloorSortBy::Id => "id",
            FloorSortBy::Name => "name",
            FloorSortBy::Code => "code",
            FloorSortBy::Level => "level",
            FloorSortBy::CreatedAt => "created_at",
            FloorSortBy::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FloorFilterParams {
    /// Matches name or code, case-insensitively
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub level: Option<i32>,
    pub sort_by: Option<FloorSortBy>,
    pub sort_order: Option<SortOrder>,
    /// `true` lists soft-deleted floors instead of active ones
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_deleted: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

envelopes!(Floor => FloorResponse, FloorListResponse);
