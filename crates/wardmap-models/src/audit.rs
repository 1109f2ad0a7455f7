//! Audit log vocabulary.
//!
//! Every mutation appends a row to `logs` tagged with a [`LogType`] (which
//! entity kind) and a [`LogMethod`] (what happened). Both are closed enums
//! whose discriminants are the ids seeded into `log_types` and `log_methods`.

use serde::Serialize;
use serde_json::{Map, Value, json};
use utoipa::ToSchema;

use crate::ids::{LogId, UserId};

pub const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    Floor = 1,
    Room = 2,
    User = 3,
    RoomImages = 4,
    Department = 5,
    Item = 6,
}

impl LogType {
    pub const ALL: [LogType; 6] = [
        LogType::Floor,
        LogType::Room,
        LogType::User,
        LogType::RoomImages,
        LogType::Department,
        LogType::Item,
    ];

    /// Name stored in `log_types.name`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogType::Floor => "FLOOR",
            LogType::Room => "ROOM",
            LogType::User => "USER",
            LogType::RoomImages => "ROOM_IMAGES",
            LogType::Department => "DEPARTMENT",
            LogType::Item => "ITEM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogMethod {
    Create = 1,
    Update = 2,
    SoftDelete = 3,
    Delete = 4,
    Retrieve = 5,
}

impl LogMethod {
    pub const ALL: [LogMethod; 5] = [
        LogMethod::Create,
        LogMethod::Update,
        LogMethod::SoftDelete,
        LogMethod::Delete,
        LogMethod::Retrieve,
    ];

    /// Name stored in `log_methods.name`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogMethod::Create => "CREATE",
            LogMethod::Update => "UPDATE",
            LogMethod::SoftDelete => "SOFT_DELETE",
            LogMethod::Delete => "DELETE",
            LogMethod::Retrieve => "RETRIEVE",
        }
    }
}

/// A row of the `logs` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LogEntry {
    pub id: LogId,
    pub user_id: UserId,
    pub type_id: LogType,
    pub method_id: LogMethod,
    #[schema(value_type = Object)]
    pub log: Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The values `current` held for exactly the fields present in `update`.
///
/// Update DTOs skip absent fields when serialized, so the keys of the
/// serialized update are the fields the request touched. A field the
/// current record lacks is recorded as `null`.
pub fn previous_values<C, U>(current: &C, update: &U) -> Value
where
    C: Serialize,
    U: Serialize,
{
    let current = serde_json::to_value(current).unwrap_or(Value::Null);
    let update = serde_json::to_value(update).unwrap_or(Value::Null);

    let Value::Object(touched) = update else {
        return Value::Object(Map::new());
    };

    let previous = touched
        .keys()
        .map(|key| {
            let old = current.get(key).cloned().unwrap_or(Value::Null);
            (key.clone(), old)
        })
        .collect();

    Value::Object(previous)
}

/// Payload for credential changes; the hash never reaches the log.
pub fn redacted_password() -> Value {
    json!({ "password": REDACTED })
}
