//! Existence guard.
//!
//! Mutations check, in this order, that the acting user exists and is
//! active, that the target (and any parent) exists in a state the operation
//! accepts, and that the natural key is free. The reads are independent and
//! are awaited together; their results are then evaluated in that order so
//! the first failing check decides the error.
//!
//! Natural keys are also backed by partial unique indexes, so a collision
//! that slips past the check still surfaces as a 409 from the write.

use std::fmt::Display;

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::ids::UserId;
use wardmap_models::{LifecycleState, LogType, Requirement};

/// An audited table keyed by a serial id. Only tables with an `is_deleted`
/// column may go through [`Lifecycle::transition`](crate::utils::lifecycle::Lifecycle::transition).
pub trait Managed {
    const TABLE: &'static str;
    /// Name used in error messages.
    const KIND: &'static str;
    const LOG_TYPE: LogType;
}

pub struct FloorEntity;
pub struct RoomEntity;
pub struct UserEntity;
pub struct DepartmentEntity;
pub struct ItemEntity;

impl Managed for FloorEntity {
    const TABLE: &'static str = "floors";
    const KIND: &'static str = "Floor";
    const LOG_TYPE: LogType = LogType::Floor;
}

impl Managed for RoomEntity {
    const TABLE: &'static str = "rooms";
    const KIND: &'static str = "Room";
    const LOG_TYPE: LogType = LogType::Room;
}

impl Managed for UserEntity {
    const TABLE: &'static str = "users";
    const KIND: &'static str = "User";
    const LOG_TYPE: LogType = LogType::User;
}

impl Managed for DepartmentEntity {
    const TABLE: &'static str = "departments";
    const KIND: &'static str = "Department";
    const LOG_TYPE: LogType = LogType::Department;
}

impl Managed for ItemEntity {
    const TABLE: &'static str = "items";
    const KIND: &'static str = "Item";
    const LOG_TYPE: LogType = LogType::Item;
}

pub fn not_found(kind: &str, id: impl Display) -> AppError {
    AppError::not_found(anyhow!("{} with the id {} not found.", kind, id))
}

pub fn not_found_in(
    kind: &str,
    id: impl Display,
    parent: &str,
    parent_id: impl Display,
) -> AppError {
    AppError::not_found(anyhow!(
        "{} with the id {} not found in {} with the id {}",
        kind,
        id,
        parent,
        parent_id
    ))
}

pub fn already_exists(kind: &str) -> AppError {
    AppError::conflict(anyhow!("{} already exists.", kind))
}

/// Unique violations become 409, dangling references 404.
pub fn write_error(kind: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return already_exists(kind);
            }
            if db_err.is_foreign_key_violation() {
                return AppError::not_found(anyhow!("Referenced record does not exist."));
            }
        }
        AppError::from(e)
    }
}

/// Rows still pointing at the target block a hard delete.
pub fn purge_error(kind: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_foreign_key_violation()
        {
            return AppError::conflict(anyhow!(
                "{} is still referenced and cannot be deleted.",
                kind
            ));
        }
        AppError::from(e)
    }
}

pub struct Guard;

impl Guard {
    /// The acting user must exist and not be soft-deleted.
    #[instrument(skip(db))]
    pub async fn actor(db: &PgPool, id: UserId) -> Result<(), AppError> {
        Self::entity::<UserEntity>(db, id.into_inner(), Requirement::Active).await
    }

    /// Current lifecycle state, `None` when the row does not exist.
    pub async fn state<M: Managed>(db: &PgPool, id: i32) -> Result<Option<LifecycleState>, AppError> {
        let sql = format!("SELECT is_deleted FROM {} WHERE id = $1", M::TABLE);
        let is_deleted = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;

        Ok(is_deleted.map(LifecycleState::from_deleted))
    }

    /// Fails with not found unless the row exists in a state `requirement` admits.
    pub async fn entity<M: Managed>(
        db: &PgPool,
        id: i32,
        requirement: Requirement,
    ) -> Result<(), AppError> {
        match Self::state::<M>(db, id).await? {
            Some(state) if requirement.admits(state) => Ok(()),
            _ => Err(not_found(M::KIND, id)),
        }
    }

    /// Turns the outcome of a natural-key lookup into a conflict.
    pub fn taken(exists: bool, kind: &str) -> Result<(), AppError> {
        if exists {
            Err(already_exists(kind))
        } else {
            Ok(())
        }
    }
}
