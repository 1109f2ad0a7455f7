//! Soft delete, retrieve and purge.
//!
//! Floors, rooms and users share one state machine
//! ([`wardmap_models::lifecycle`]); this module applies it to a table and
//! writes the audit entry in the same transaction.

use serde_json::Value;
use sqlx::PgPool;
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::ids::UserId;
use wardmap_models::{LogMethod, Plan, Transition};

use crate::utils::audit::AuditLogger;
use crate::utils::guard::{Guard, Managed, not_found, purge_error, write_error};

pub struct Lifecycle;

impl Lifecycle {
    /// Applies `transition` to row `id` of `M`.
    ///
    /// Returns [`Plan::NoOp`] when the row is already in the target state; in
    /// that case nothing is written or logged.
    #[instrument(skip(db), fields(table = M::TABLE))]
    pub async fn transition<M: Managed>(
        db: &PgPool,
        actor: UserId,
        id: i32,
        transition: Transition,
    ) -> Result<Plan, AppError> {
        let (actor_check, state) = tokio::join!(Guard::actor(db, actor), Guard::state::<M>(db, id));
        actor_check?;
        let state = state?.ok_or_else(|| not_found(M::KIND, id))?;

        match transition.plan(state) {
            Plan::NotFound => return Err(not_found(M::KIND, id)),
            Plan::NoOp => return Ok(Plan::NoOp),
            Plan::Apply => {}
        }

        let target = transition.target().is_deleted();
        let sql = format!(
            "UPDATE {} SET is_deleted = $2, updated_at = NOW() WHERE id = $1 AND is_deleted <> $2",
            M::TABLE
        );

        let mut tx = db.begin().await?;
        let updated = sqlx::query(&sql)
            .bind(id)
            .bind(target)
            .execute(&mut *tx)
            .await
            .map_err(write_error(M::KIND))?;

        // A concurrent request got there first.
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return match transition.plan(transition.target()) {
                Plan::NotFound => Err(not_found(M::KIND, id)),
                plan => Ok(plan),
            };
        }

        AuditLogger::record(
            &mut *tx,
            actor,
            M::LOG_TYPE,
            transition.method(),
            transition.marker(),
        )
        .await?;
        tx.commit().await?;

        Ok(Plan::Apply)
    }

    /// Removes row `id` of `M` in either lifecycle state and logs the row as
    /// it was. Returns that snapshot.
    #[instrument(skip(db), fields(table = M::TABLE))]
    pub async fn purge<M: Managed>(db: &PgPool, actor: UserId, id: i32) -> Result<Value, AppError> {
        let select = format!("SELECT to_jsonb(t) FROM {} t WHERE t.id = $1", M::TABLE);
        let snapshot = sqlx::query_scalar::<_, Value>(&select)
            .bind(id)
            .fetch_optional(db);

        let (actor_check, snapshot) = tokio::join!(Guard::actor(db, actor), snapshot);
        actor_check?;
        let snapshot = snapshot?.ok_or_else(|| not_found(M::KIND, id))?;

        let delete = format!("DELETE FROM {} WHERE id = $1", M::TABLE);

        let mut tx = db.begin().await?;
        let deleted = sqlx::query(&delete)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(purge_error(M::KIND))?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(not_found(M::KIND, id));
        }

        AuditLogger::record(&mut *tx, actor, M::LOG_TYPE, LogMethod::Delete, snapshot.clone())
            .await?;
        tx.commit().await?;

        Ok(snapshot)
    }
}
