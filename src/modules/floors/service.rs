use serde_json::{Value, json};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use wardmap_core::file_storage::{FileStorage, ImageCategory};
use wardmap_core::{AppError, PaginationMeta};
use wardmap_models::audit::previous_values;
use wardmap_models::ids::{FloorId, UserId};
use wardmap_models::{LogMethod, LogType, Plan, Requirement, Transition};

use crate::metrics;
use crate::modules::floors::model::{CreateFloorDto, Floor, FloorFilterParams, UpdateFloorDto};
use crate::utils::audit::AuditLogger;
use crate::utils::guard::{FloorEntity, Guard, Managed, not_found, write_error};
use crate::utils::lifecycle::Lifecycle;
use crate::utils::uploads::{self, FLOOR_IMAGE_TYPES, UploadedFile};

const FLOOR_COLUMNS: &str =
    "id, name, level, code, image_location, creator_id, is_deleted, created_at, updated_at";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &FloorFilterParams) {
    qb.push(" WHERE is_deleted = ")
        .push_bind(filters.is_deleted.unwrap_or(false));

    if let Some(level) = filters.level {
        qb.push(" AND level = ").push_bind(level);
    }

    if let Some(search) = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct FloorService;

impl FloorService {
    async fn find(db: &PgPool, id: FloorId) -> Result<Option<Floor>, AppError> {
        let floor = sqlx::query_as::<_, Floor>(&format!(
            "SELECT {} FROM floors WHERE id = $1",
            FLOOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(floor)
    }

    /// Whether another active floor already has this natural key.
    async fn key_taken(
        db: &PgPool,
        name: &str,
        code: &str,
        level: i32,
        except: Option<FloorId>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM floors
                   WHERE lower(name) = lower($1) AND lower(code) = lower($2) AND level = $3
                     AND NOT is_deleted
                     AND ($4::INT4 IS NULL OR id <> $4)
               )"#,
        )
        .bind(name)
        .bind(code)
        .bind(level)
        .bind(except)
        .fetch_one(db)
        .await?;

        Ok(taken)
    }

    #[instrument(skip(db))]
    pub async fn create_floor(
        db: &PgPool,
        actor: UserId,
        dto: CreateFloorDto,
    ) -> Result<Floor, AppError> {
        let (actor_check, taken) = tokio::join!(
            Guard::actor(db, actor),
            Self::key_taken(db, &dto.name, &dto.code, dto.level, None)
        );
        actor_check?;
        Guard::taken(taken?, FloorEntity::KIND)?;

        let mut tx = db.begin().await?;
        let floor = sqlx::query_as::<_, Floor>(&format!(
            "INSERT INTO floors (name, level, code, creator_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            FLOOR_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(dto.level)
        .bind(dto.code.trim())
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error(FloorEntity::KIND))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Floor,
            LogMethod::Create,
            serde_json::to_value(&floor)?,
        )
        .await?;
        tx.commit().await?;

        Ok(floor)
    }

    #[instrument(skip(db))]
    pub async fn get_floors(
        db: &PgPool,
        filters: FloorFilterParams,
    ) -> Result<(Vec<Floor>, PaginationMeta), AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let sort_by = filters.sort_by.unwrap_or_default();
        let sort_order = filters.sort_order.unwrap_or_default();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM floors");
        push_filters(&mut count, &filters);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM floors", FLOOR_COLUMNS));
        push_filters(&mut query, &filters);
        query
            .push(format!(
                " ORDER BY {} {}, id ASC LIMIT ",
                sort_by.column(),
                sort_order.as_sql()
            ))
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let floors = query.build_query_as::<Floor>().fetch_all(db).await?;

        Ok((floors, filters.pagination.meta(total)))
    }

    /// An active floor.
    #[instrument(skip(db))]
    pub async fn get_floor(db: &PgPool, id: FloorId) -> Result<Floor, AppError> {
        Self::find(db, id)
            .await?
            .filter(|floor| !floor.is_deleted)
            .ok_or_else(|| not_found(FloorEntity::KIND, id))
    }

    /// Fails unless the floor exists and is active.
    pub async fn ensure_active(db: &PgPool, id: FloorId) -> Result<(), AppError> {
        Guard::entity::<FloorEntity>(db, id.into_inner(), Requirement::Active).await
    }

    #[instrument(skip(db))]
    pub async fn update_floor(
        db: &PgPool,
        actor: UserId,
        id: FloorId,
        dto: UpdateFloorDto,
    ) -> Result<Floor, AppError> {
        let (actor_check, current) = tokio::join!(Guard::actor(db, actor), Self::get_floor(db, id));
        actor_check?;
        let current = current?;

        let name = dto.name.as_deref().map(str::trim).unwrap_or(&current.name);
        let code = dto.code.as_deref().map(str::trim).unwrap_or(&current.code);
        let level = dto.level.unwrap_or(current.level);
        Guard::taken(
            Self::key_taken(db, name, code, level, Some(id)).await?,
            FloorEntity::KIND,
        )?;

        let mut tx = db.begin().await?;
        let floor = sqlx::query_as::<_, Floor>(&format!(
            r#"UPDATE floors
               SET name = $2, code = $3, level = $4, updated_at = NOW()
               WHERE id = $1 AND NOT is_deleted
               RETURNING {}"#,
            FLOOR_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(code)
        .bind(level)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error(FloorEntity::KIND))?
        .ok_or_else(|| not_found(FloorEntity::KIND, id))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Floor,
            LogMethod::Update,
            previous_values(&current, &dto),
        )
        .await?;
        tx.commit().await?;

        Ok(floor)
    }

    /// Stores a new floor map and points the floor at it. The file it
    /// replaces is removed once the change is committed.
    #[instrument(skip(db, storage, files))]
    pub async fn upload_map(
        db: &PgPool,
        storage: &dyn FileStorage,
        max_file_size: usize,
        actor: UserId,
        id: FloorId,
        files: Vec<UploadedFile>,
    ) -> Result<Floor, AppError> {
        let (actor_check, current) = tokio::join!(Guard::actor(db, actor), Self::get_floor(db, id));
        actor_check?;
        let current = current?;

        uploads::validate_images(&files, FLOOR_IMAGE_TYPES, 1, max_file_size)?;
        let keys = uploads::store_images(storage, ImageCategory::Floor, id.into_inner(), &files).await?;

        let Some(key) = keys.first() else {
            return Err(AppError::bad_request(anyhow::anyhow!("Please upload at least one file.")));
        };

        match Self::set_map(db, actor, current.id, key).await {
            Ok((floor, replaced)) => {
                metrics::track_images_uploaded(ImageCategory::Floor.label(), keys.len());
                if let Some(old) = replaced.filter(|old| old != key) {
                    uploads::discard(storage, std::slice::from_ref(&old)).await;
                }
                Ok(floor)
            }
            Err(e) => {
                uploads::discard(storage, &keys).await;
                Err(e)
            }
        }
    }

    /// Returns the updated floor and the map location it replaced. The row is
    /// locked first so concurrent uploads each see the map they overwrite.
    async fn set_map(
        db: &PgPool,
        actor: UserId,
        id: FloorId,
        key: &str,
    ) -> Result<(Floor, Option<String>), AppError> {
        let mut tx = db.begin().await?;
        let replaced: Option<String> = sqlx::query_scalar(
            "SELECT image_location FROM floors WHERE id = $1 AND NOT is_deleted FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found(FloorEntity::KIND, id))?;

        let floor = sqlx::query_as::<_, Floor>(&format!(
            r#"UPDATE floors SET image_location = $2, updated_at = NOW()
               WHERE id = $1 AND NOT is_deleted
               RETURNING {}"#,
            FLOOR_COLUMNS
        ))
        .bind(id)
        .bind(key)
        .fetch_one(&mut *tx)
        .await?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Floor,
            LogMethod::Update,
            json!({ "image_location": replaced }),
        )
        .await?;
        tx.commit().await?;

        Ok((floor, replaced))
    }

    #[instrument(skip(db))]
    pub async fn soft_delete_floor(db: &PgPool, actor: UserId, id: FloorId) -> Result<Plan, AppError> {
        Lifecycle::transition::<FloorEntity>(db, actor, id.into_inner(), Transition::SoftDelete).await
    }

    #[instrument(skip(db))]
    pub async fn retrieve_floor(db: &PgPool, actor: UserId, id: FloorId) -> Result<Plan, AppError> {
        Lifecycle::transition::<FloorEntity>(db, actor, id.into_inner(), Transition::Retrieve).await
    }

    /// Hard delete. Floors that still own rooms, deleted or not, cannot be purged.
    #[instrument(skip(db, storage))]
    pub async fn purge_floor(
        db: &PgPool,
        storage: &dyn FileStorage,
        actor: UserId,
        id: FloorId,
    ) -> Result<(), AppError> {
        let snapshot = Lifecycle::purge::<FloorEntity>(db, actor, id.into_inner()).await?;

        if let Some(Value::String(key)) = snapshot.get("image_location") {
            uploads::discard(storage, std::slice::from_ref(key)).await;
        }

        Ok(())
    }
}
