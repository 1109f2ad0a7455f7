use serde_json::Value;
use sqlx::PgExecutor;
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::audit::LogEntry;
use wardmap_models::ids::{LogId, UserId};
use wardmap_models::{LogMethod, LogType};

use crate::metrics;

pub struct AuditLogger;

impl AuditLogger {
    /// Appends an entry. Callers pass their open transaction so the entry
    /// commits or rolls back with the change it describes.
    #[instrument(skip(executor, payload))]
    pub async fn record<'e, E>(
        executor: E,
        actor: UserId,
        log_type: LogType,
        method: LogMethod,
        payload: Value,
    ) -> Result<LogId, AppError>
    where
        E: PgExecutor<'e>,
    {
        let id = sqlx::query_scalar::<_, LogId>(
            r#"INSERT INTO logs (user_id, type_id, method_id, log)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(actor)
        .bind(log_type)
        .bind(method)
        .bind(payload)
        .fetch_one(executor)
        .await?;

        metrics::track_audit_entry(log_type, method);

        Ok(id)
    }

    /// Entries of one type, oldest first.
    #[instrument(skip(executor))]
    pub async fn entries<'e, E>(executor: E, log_type: LogType) -> Result<Vec<LogEntry>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let entries = sqlx::query_as::<_, LogEntry>(
            r#"SELECT id, user_id, type_id, method_id, log, created_at
               FROM logs
               WHERE type_id = $1
               ORDER BY id"#,
        )
        .bind(log_type)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }
}
