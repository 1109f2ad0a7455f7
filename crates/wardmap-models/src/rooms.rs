//! Rooms, their photos and the derived completeness status.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use wardmap_core::AppError;
use wardmap_core::serde::{deserialize_optional_bool, deserialize_optional_i32};
use wardmap_core::{PaginationParams, SortOrder};

use crate::common::envelopes;
use crate::ids::{FloorId, RoomId, RoomImageId, UserId};

/// Whitespace ignored when deciding whether a text field is filled in.
/// Matches the characters trimmed by the SQL status predicate.
const BLANK: [char; 4] = [' ', '\t', '\r', '\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Incomplete,
    Complete,
}

impl RoomStatus {
    /// A room is complete once it has a detail text, a direction, a direction
    /// pattern and at least one active image.
    pub fn derive(
        detail: Option<&str>,
        direction: Option<&str>,
        direction_pattern: Option<&Value>,
        active_images: i64,
    ) -> Self {
        let filled = |text: Option<&str>| text.is_some_and(|t| !t.trim_matches(BLANK).is_empty());

        if filled(detail)
            && filled(direction)
            && direction_pattern.is_some_and(has_pattern)
            && active_images > 0
        {
            RoomStatus::Complete
        } else {
            RoomStatus::Incomplete
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Incomplete => "incomplete",
            RoomStatus::Complete => "complete",
        }
    }
}

fn has_pattern(pattern: &Value) -> bool {
    match pattern {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// A room as read from the database. `status` is computed while decoding
/// from the row's fields and its `image_count` column.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub code: String,
    pub detail: Option<String>,
    pub floor_id: FloorId,
    pub creator_id: UserId,
    pub direction: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub direction_pattern: Option<Value>,
    pub starting_point: Option<i32>,
    pub status: RoomStatus,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl<'r> FromRow<'r, PgRow> for Room {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let detail: Option<String> = row.try_get("detail")?;
        let direction: Option<String> = row.try_get("direction")?;
        let direction_pattern: Option<Value> = row.try_get("direction_pattern")?;
        let image_count: i64 = row.try_get("image_count")?;

        let status = RoomStatus::derive(
            detail.as_deref(),
            direction.as_deref(),
            direction_pattern.as_ref(),
            image_count,
        );

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            detail,
            floor_id: row.try_get("floor_id")?,
            creator_id: row.try_get("creator_id")?,
            direction,
            direction_pattern,
            starting_point: row.try_get("starting_point")?,
            status,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Audit snapshot of a room; the derived status is not part of the record.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot<'a> {
    pub id: RoomId,
    pub name: &'a str,
    pub code: &'a str,
    pub detail: Option<&'a str>,
    pub floor_id: FloorId,
    pub creator_id: UserId,
    pub direction: Option<&'a str>,
    pub direction_pattern: Option<&'a Value>,
    pub starting_point: Option<i32>,
    pub is_deleted: bool,
}

impl Room {
    pub fn snapshot(&self) -> RoomSnapshot<'_> {
        RoomSnapshot {
            id: self.id,
            name: &self.name,
            code: &self.code,
            detail: self.detail.as_deref(),
            floor_id: self.floor_id,
            creator_id: self.creator_id,
            direction: self.direction.as_deref(),
            direction_pattern: self.direction_pattern.as_ref(),
            starting_point: self.starting_point,
            is_deleted: self.is_deleted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoomImage {
    pub id: RoomImageId,
    pub room_id: RoomId,
    pub image_location: String,
    pub is_main_image: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomWithImages {
    #[serde(flatten)]
    pub room: Room,
    /// Active images, main image first
    pub images: Vec<RoomImage>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateRoomDto {
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 20), custom(function = "crate::common::not_blank"))]
    pub code: String,
    pub floor_id: FloorId,
    #[validate(length(max = 2000))]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateRoomDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100), custom(function = "crate::common::not_blank"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 20), custom(function = "crate::common::not_blank"))]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<FloorId>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddDirectionsDto {
    /// Route description consumed by the wayfinding client
    #[schema(value_type = Object)]
    #[validate(custom(function = "validate_direction_pattern"))]
    pub direction_pattern: Value,
    #[validate(range(min = 0))]
    pub starting_point: i32,
}

fn validate_direction_pattern(pattern: &Value) -> Result<(), validator::ValidationError> {
    if matches!(pattern, Value::Object(_) | Value::Array(_)) && has_pattern(pattern) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("direction_pattern")
            .with_message("direction_pattern must be a non-empty object or array".into()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomSortBy {
    #[default]
    Id,
    Name,
    Code,
    FloorId,
    CreatedAt,
    UpdatedAt,
}

impl RoomSortBy {
    pub fn column(self) -> &'static str {
        match self {
            RoomSortBy::Id => "id",
            RoomSortBy::Name => "name",
            RoomSortBy::Code => "code",
            RoomSortBy::FloorId => "floor_id",
            RoomSortBy::CreatedAt => "created_at",
            RoomSortBy::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomFilterParams {
    /// Matches name, code or detail, case-insensitively
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub floor_id: Option<i32>,
    pub status: Option<RoomStatus>,
    pub sort_by: Option<RoomSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_deleted: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomPhotoFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_deleted: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// `?image_ids=1,2,3`
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageIdsQuery {
    /// Comma-separated image ids
    #[serde(default)]
    pub image_ids: String,
}

impl ImageIdsQuery {
    /// Distinct ids in ascending order. Blank or malformed lists are rejected.
    pub fn parse(&self) -> Result<Vec<RoomImageId>, AppError> {
        let raw = self.image_ids.trim();
        if raw.is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Selected images ids are missing."
            )));
        }

        let mut ids = raw
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<i32>()
                    .ok()
                    .filter(|id| *id > 0)
                    .map(RoomImageId)
                    .ok_or_else(|| {
                        AppError::bad_request(anyhow::anyhow!("Invalid image id '{}'", part))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

envelopes!(Room => RoomResponse, RoomListResponse);
envelopes!(RoomWithImages => RoomDetailResponse, RoomDetailListResponse);
envelopes!(RoomImage => RoomImageResponse, RoomImageListResponse);

/// Images created by one upload; not paginated.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomImagesUploadedResponse {
    pub message: String,
    pub data: Vec<RoomImage>,
}
