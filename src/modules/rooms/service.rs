use serde_json::json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use wardmap_core::file_storage::{FileStorage, ImageCategory};
use wardmap_core::{AppError, PaginationMeta};
use wardmap_models::audit::previous_values;
use wardmap_models::ids::{FloorId, RoomId, RoomImageId, UserId};
use wardmap_models::{LogMethod, LogType, Plan, Requirement, Transition};

use crate::metrics;
use crate::modules::floors::service::FloorService;
use crate::modules::rooms::model::{
    AddDirectionsDto, CreateRoomDto, Room, RoomFilterParams, RoomImage, RoomPhotoFilterParams,
    RoomStatus, RoomWithImages, UpdateRoomDto,
};
use crate::utils::audit::AuditLogger;
use crate::utils::guard::{
    FloorEntity, Guard, Managed, RoomEntity, not_found, not_found_in, write_error,
};
use crate::utils::lifecycle::Lifecycle;
use crate::utils::uploads::{self, ROOM_IMAGE_TYPES, UploadedFile};

/// Rooms with the active image count the derived status needs.
const ROOM_SELECT: &str = r#"SELECT r.id, r.name, r.code, r.detail, r.floor_id, r.creator_id,
       r.direction, r.direction_pattern, r.starting_point, r.is_deleted,
       r.created_at, r.updated_at,
       (SELECT COUNT(*) FROM room_images i WHERE i.room_id = r.id AND NOT i.is_deleted)
           AS image_count
FROM rooms r"#;

/// SQL form of [`RoomStatus::derive`].
const COMPLETE_PREDICATE: &str = r#"(NULLIF(btrim(r.detail, E' \t\r\n'), '') IS NOT NULL
    AND NULLIF(btrim(r.direction, E' \t\r\n'), '') IS NOT NULL
    AND r.direction_pattern IS NOT NULL
    AND r.direction_pattern NOT IN ('null'::jsonb, '{}'::jsonb, '[]'::jsonb, '""'::jsonb)
    AND EXISTS (SELECT 1 FROM room_images i WHERE i.room_id = r.id AND NOT i.is_deleted))"#;

const IMAGE_COLUMNS: &str =
    "id, room_id, image_location, is_main_image, is_deleted, created_at, updated_at";

const IMAGE_KIND: &str = "Room image";

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &RoomFilterParams,
    floor: Option<FloorId>,
) {
    qb.push(" WHERE r.is_deleted = ")
        .push_bind(filters.is_deleted.unwrap_or(false));

    if let Some(floor_id) = floor.or(filters.floor_id.map(FloorId)) {
        qb.push(" AND r.floor_id = ").push_bind(floor_id);
    }

    match filters.status {
        Some(RoomStatus::Complete) => {
            qb.push(" AND ").push(COMPLETE_PREDICATE);
        }
        Some(RoomStatus::Incomplete) => {
            qb.push(" AND NOT ").push(COMPLETE_PREDICATE);
        }
        None => {}
    }

    if let Some(search) = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", search);
        qb.push(" AND (r.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR r.code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR r.detail ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct RoomService;

impl RoomService {
    async fn find<'e, E>(executor: E, id: RoomId) -> Result<Option<Room>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("{} WHERE r.id = $1", ROOM_SELECT);
        let room = sqlx::query_as::<_, Room>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(room)
    }

    async fn get_active(db: &PgPool, id: RoomId) -> Result<Room, AppError> {
        Self::find(db, id)
            .await?
            .filter(|room| !room.is_deleted)
            .ok_or_else(|| not_found(RoomEntity::KIND, id))
    }

    async fn key_taken(
        db: &PgPool,
        name: &str,
        code: &str,
        except: Option<RoomId>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM rooms
                   WHERE lower(name) = lower($1) AND lower(code) = lower($2)
                     AND NOT is_deleted
                     AND ($3::INT4 IS NULL OR id <> $3)
               )"#,
        )
        .bind(name)
        .bind(code)
        .bind(except)
        .fetch_one(db)
        .await?;

        Ok(taken)
    }

    async fn ensure_active(db: &PgPool, id: RoomId) -> Result<(), AppError> {
        Guard::entity::<RoomEntity>(db, id.into_inner(), Requirement::Active).await
    }

    #[instrument(skip(db))]
    pub async fn create_room(
        db: &PgPool,
        actor: UserId,
        dto: CreateRoomDto,
    ) -> Result<Room, AppError> {
        let (actor_check, floor_check, taken) = tokio::join!(
            Guard::actor(db, actor),
            FloorService::ensure_active(db, dto.floor_id),
            Self::key_taken(db, dto.name.trim(), dto.code.trim(), None)
        );
        actor_check?;
        floor_check?;
        Guard::taken(taken?, RoomEntity::KIND)?;

        let mut tx = db.begin().await?;
        let id = sqlx::query_scalar::<_, RoomId>(
            r#"INSERT INTO rooms (name, code, floor_id, detail, creator_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(dto.name.trim())
        .bind(dto.code.trim())
        .bind(dto.floor_id)
        .bind(&dto.detail)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error(RoomEntity::KIND))?;

        let room = Self::find(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(RoomEntity::KIND, id))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Room,
            LogMethod::Create,
            serde_json::to_value(room.snapshot())?,
        )
        .await?;
        tx.commit().await?;

        Ok(room)
    }

    async fn list(
        db: &PgPool,
        filters: RoomFilterParams,
        floor: Option<FloorId>,
    ) -> Result<(Vec<Room>, PaginationMeta), AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let sort_by = filters.sort_by.unwrap_or_default();
        let sort_order = filters.sort_order.unwrap_or_default();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM rooms r");
        push_filters(&mut count, &filters, floor);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut query = QueryBuilder::<Postgres>::new(ROOM_SELECT);
        push_filters(&mut query, &filters, floor);
        query
            .push(format!(
                " ORDER BY r.{} {}, r.id ASC LIMIT ",
                sort_by.column(),
                sort_order.as_sql()
            ))
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rooms = query.build_query_as::<Room>().fetch_all(db).await?;

        Ok((rooms, filters.pagination.meta(total)))
    }

    #[instrument(skip(db))]
    pub async fn get_rooms(
        db: &PgPool,
        filters: RoomFilterParams,
    ) -> Result<(Vec<Room>, PaginationMeta), AppError> {
        Self::list(db, filters, None).await
    }

    #[instrument(skip(db))]
    pub async fn get_rooms_in_floor(
        db: &PgPool,
        floor_id: FloorId,
        filters: RoomFilterParams,
    ) -> Result<(Vec<Room>, PaginationMeta), AppError> {
        FloorService::ensure_active(db, floor_id).await?;
        Self::list(db, filters, Some(floor_id)).await
    }

    #[instrument(skip(db))]
    pub async fn get_room_in_floor(
        db: &PgPool,
        floor_id: FloorId,
        room_id: RoomId,
    ) -> Result<Room, AppError> {
        let (floor_check, room) =
            tokio::join!(FloorService::ensure_active(db, floor_id), Self::find(db, room_id));
        floor_check?;

        room?
            .filter(|room| !room.is_deleted && room.floor_id == floor_id)
            .ok_or_else(|| not_found_in(RoomEntity::KIND, room_id, FloorEntity::KIND, floor_id))
    }

    /// An active room with its active images, main image first.
    #[instrument(skip(db))]
    pub async fn get_room(db: &PgPool, id: RoomId) -> Result<RoomWithImages, AppError> {
        let room = Self::get_active(db, id).await?;
        let images = sqlx::query_as::<_, RoomImage>(&format!(
            r#"SELECT {} FROM room_images
               WHERE room_id = $1 AND NOT is_deleted
               ORDER BY is_main_image DESC, id"#,
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_all(db)
        .await?;

        Ok(RoomWithImages { room, images })
    }

    #[instrument(skip(db))]
    pub async fn get_room_photos(
        db: &PgPool,
        id: RoomId,
        filters: RoomPhotoFilterParams,
    ) -> Result<(Vec<RoomImage>, PaginationMeta), AppError> {
        Self::ensure_active(db, id).await?;

        let is_deleted = filters.is_deleted.unwrap_or(false);
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM room_images WHERE room_id = $1 AND is_deleted = $2",
        )
        .bind(id)
        .bind(is_deleted)
        .fetch_one(db)
        .await?;

        let images = sqlx::query_as::<_, RoomImage>(&format!(
            r#"SELECT {} FROM room_images
               WHERE room_id = $1 AND is_deleted = $2
               ORDER BY is_main_image DESC, id
               LIMIT $3 OFFSET $4"#,
            IMAGE_COLUMNS
        ))
        .bind(id)
        .bind(is_deleted)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok((images, filters.pagination.meta(total)))
    }

    /// Returns the room re-read after the change, so its status reflects it.
    #[instrument(skip(db))]
    pub async fn update_room(
        db: &PgPool,
        actor: UserId,
        id: RoomId,
        dto: UpdateRoomDto,
    ) -> Result<Room, AppError> {
        let floor_check = async {
            match dto.floor_id {
                Some(floor_id) => FloorService::ensure_active(db, floor_id).await,
                None => Ok(()),
            }
        };
        let (actor_check, current, floor_check) =
            tokio::join!(Guard::actor(db, actor), Self::get_active(db, id), floor_check);
        actor_check?;
        let current = current?;
        floor_check?;

        let name = dto.name.as_deref().map(str::trim).unwrap_or(&current.name);
        let code = dto.code.as_deref().map(str::trim).unwrap_or(&current.code);
        Guard::taken(
            Self::key_taken(db, name, code, Some(id)).await?,
            RoomEntity::KIND,
        )?;

        let mut tx = db.begin().await?;
        let updated = sqlx::query(
            r#"UPDATE rooms
               SET name = $2,
                   code = $3,
                   detail = COALESCE($4, detail),
                   direction = COALESCE($5, direction),
                   floor_id = $6,
                   updated_at = NOW()
               WHERE id = $1 AND NOT is_deleted"#,
        )
        .bind(id)
        .bind(name)
        .bind(code)
        .bind(&dto.detail)
        .bind(&dto.direction)
        .bind(dto.floor_id.unwrap_or(current.floor_id))
        .execute(&mut *tx)
        .await
        .map_err(write_error(RoomEntity::KIND))?;

        if updated.rows_affected() == 0 {
            return Err(not_found(RoomEntity::KIND, id));
        }

        let room = Self::find(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(RoomEntity::KIND, id))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Room,
            LogMethod::Update,
            previous_values(&current.snapshot(), &dto),
        )
        .await?;
        tx.commit().await?;

        Ok(room)
    }

    #[instrument(skip(db))]
    pub async fn add_directions(
        db: &PgPool,
        actor: UserId,
        id: RoomId,
        dto: AddDirectionsDto,
    ) -> Result<Room, AppError> {
        let (actor_check, current) = tokio::join!(Guard::actor(db, actor), Self::get_active(db, id));
        actor_check?;
        let current = current?;

        let mut tx = db.begin().await?;
        let updated = sqlx::query(
            r#"UPDATE rooms
               SET direction_pattern = $2, starting_point = $3, updated_at = NOW()
               WHERE id = $1 AND NOT is_deleted"#,
        )
        .bind(id)
        .bind(&dto.direction_pattern)
        .bind(dto.starting_point)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(not_found(RoomEntity::KIND, id));
        }

        let room = Self::find(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(RoomEntity::KIND, id))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Room,
            LogMethod::Update,
            json!({
                "direction_pattern": current.direction_pattern,
                "starting_point": current.starting_point,
            }),
        )
        .await?;
        tx.commit().await?;

        Ok(room)
    }

    /// Validates the batch, stores the files and records one image row per
    /// file. The first file becomes the main image when the room has no
    /// active one.
    #[instrument(skip(db, storage, files), fields(files = files.len()))]
    pub async fn upload_room_images(
        db: &PgPool,
        storage: &dyn FileStorage,
        max_files: usize,
        max_file_size: usize,
        actor: UserId,
        id: RoomId,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<RoomImage>, AppError> {
        let (actor_check, room_check) =
            tokio::join!(Guard::actor(db, actor), Self::ensure_active(db, id));
        actor_check?;
        room_check?;

        uploads::validate_images(&files, ROOM_IMAGE_TYPES, max_files, max_file_size)?;
        let keys = uploads::store_images(storage, ImageCategory::Room, id.into_inner(), &files).await?;

        match Self::insert_images(db, actor, id, &keys).await {
            Ok(images) => {
                metrics::track_images_uploaded(ImageCategory::Room.label(), images.len());
                Ok(images)
            }
            Err(e) => {
                uploads::discard(storage, &keys).await;
                Err(e)
            }
        }
    }

    async fn insert_images(
        db: &PgPool,
        actor: UserId,
        id: RoomId,
        keys: &[String],
    ) -> Result<Vec<RoomImage>, AppError> {
        let mut tx = db.begin().await?;

        // Serializes uploads to one room so only one of them can claim the main image.
        sqlx::query_scalar::<_, RoomId>("SELECT id FROM rooms WHERE id = $1 AND NOT is_deleted FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(RoomEntity::KIND, id))?;

        let has_main = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM room_images
                   WHERE room_id = $1 AND is_main_image AND NOT is_deleted
               )"#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let insert = format!(
            r#"INSERT INTO room_images (room_id, image_location, is_main_image)
               VALUES ($1, $2, $3)
               RETURNING {}"#,
            IMAGE_COLUMNS
        );

        let mut images = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            let image = sqlx::query_as::<_, RoomImage>(&insert)
                .bind(id)
                .bind(key)
                .bind(index == 0 && !has_main)
                .fetch_one(&mut *tx)
                .await?;
            images.push(image);
        }

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Room,
            LogMethod::Update,
            json!({ "image_locations": keys }),
        )
        .await?;
        tx.commit().await?;

        Ok(images)
    }

    /// Soft deletes or retrieves images of one room. Every id must belong to
    /// the room, otherwise nothing changes. Images already in the target state
    /// are left alone; if that is all of them nothing is logged.
    #[instrument(skip(db))]
    pub async fn set_images_state(
        db: &PgPool,
        actor: UserId,
        room_id: RoomId,
        image_ids: Vec<RoomImageId>,
        transition: Transition,
    ) -> Result<Plan, AppError> {
        let owned = sqlx::query_scalar::<_, RoomImageId>(
            "SELECT id FROM room_images WHERE room_id = $1 AND id = ANY($2)",
        )
        .bind(room_id)
        .bind(&image_ids)
        .fetch_all(db);

        let (actor_check, room_check, owned) =
            tokio::join!(Guard::actor(db, actor), Self::ensure_active(db, room_id), owned);
        actor_check?;
        room_check?;
        let owned = owned?;

        if let Some(missing) = image_ids.iter().find(|id| !owned.contains(id)) {
            return Err(not_found_in(IMAGE_KIND, missing, RoomEntity::KIND, room_id));
        }

        let target = transition.target().is_deleted();

        let mut tx = db.begin().await?;
        let updated = sqlx::query(
            r#"UPDATE room_images
               SET is_deleted = $3, updated_at = NOW()
               WHERE room_id = $1 AND id = ANY($2) AND is_deleted <> $3"#,
        )
        .bind(room_id)
        .bind(&image_ids)
        .bind(target)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Plan::NoOp);
        }

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::RoomImages,
            transition.method(),
            json!({ "image_ids": image_ids }),
        )
        .await?;
        tx.commit().await?;

        Ok(Plan::Apply)
    }

    #[instrument(skip(db))]
    pub async fn soft_delete_room(db: &PgPool, actor: UserId, id: RoomId) -> Result<Plan, AppError> {
        Lifecycle::transition::<RoomEntity>(db, actor, id.into_inner(), Transition::SoftDelete).await
    }

    #[instrument(skip(db))]
    pub async fn retrieve_room(db: &PgPool, actor: UserId, id: RoomId) -> Result<Plan, AppError> {
        Lifecycle::transition::<RoomEntity>(db, actor, id.into_inner(), Transition::Retrieve).await
    }

    /// Hard delete. Image rows cascade; their files are removed afterwards.
    #[instrument(skip(db, storage))]
    pub async fn purge_room(
        db: &PgPool,
        storage: &dyn FileStorage,
        actor: UserId,
        id: RoomId,
    ) -> Result<(), AppError> {
        let locations = sqlx::query_scalar::<_, String>(
            "SELECT image_location FROM room_images WHERE room_id = $1",
        )
        .bind(id)
        .fetch_all(db)
        .await?;

        Lifecycle::purge::<RoomEntity>(db, actor, id.into_inner()).await?;
        uploads::discard(storage, &locations).await;

        Ok(())
    }
}
