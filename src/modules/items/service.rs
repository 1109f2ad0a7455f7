use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use wardmap_core::{AppError, PaginationMeta};
use wardmap_models::audit::previous_values;
use wardmap_models::ids::{DepartmentId, ItemId, UserId};
use wardmap_models::{LogMethod, LogType};

use crate::modules::departments::service::DepartmentService;
use crate::modules::items::model::{CreateItemDto, Item, ItemFilterParams, UpdateItemDto};
use crate::utils::audit::AuditLogger;
use crate::utils::guard::{Guard, ItemEntity, Managed, not_found, write_error};
use crate::utils::lifecycle::Lifecycle;

const ITEM_COLUMNS: &str = "id, description, price, department_id, created_at, updated_at";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ItemFilterParams) {
    qb.push(" WHERE TRUE");

    if let Some(department_id) = filters.department_id {
        qb.push(" AND department_id = ")
            .push_bind(DepartmentId(department_id));
    }

    if let Some(search) = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        qb.push(" AND description ILIKE ")
            .push_bind(format!("%{}%", search));
    }
}

async fn ensure_department(db: &PgPool, id: Option<DepartmentId>) -> Result<(), AppError> {
    match id {
        Some(id) => DepartmentService::ensure_exists(db, id).await,
        None => Ok(()),
    }
}

pub struct ItemService;

impl ItemService {
    #[instrument(skip(db))]
    pub async fn create_item(
        db: &PgPool,
        actor: UserId,
        dto: CreateItemDto,
    ) -> Result<Item, AppError> {
        let (actor_check, department_check) =
            tokio::join!(Guard::actor(db, actor), ensure_department(db, dto.department_id));
        actor_check?;
        department_check?;

        let mut tx = db.begin().await?;
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"INSERT INTO items (description, price, department_id)
               VALUES ($1, $2, $3)
               RETURNING {}"#,
            ITEM_COLUMNS
        ))
        .bind(dto.description.trim())
        .bind(dto.price)
        .bind(dto.department_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error(ItemEntity::KIND))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Item,
            LogMethod::Create,
            serde_json::to_value(&item)?,
        )
        .await?;
        tx.commit().await?;

        Ok(item)
    }

    #[instrument(skip(db))]
    pub async fn get_items(
        db: &PgPool,
        filters: ItemFilterParams,
    ) -> Result<(Vec<Item>, PaginationMeta), AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let sort_by = filters.sort_by.unwrap_or_default();
        let sort_order = filters.sort_order.unwrap_or_default();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_filters(&mut count, &filters);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM items", ITEM_COLUMNS));
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

        let items = query.build_query_as::<Item>().fetch_all(db).await?;

        Ok((items, filters.pagination.meta(total)))
    }

    #[instrument(skip(db))]
    pub async fn get_item(db: &PgPool, id: ItemId) -> Result<Item, AppError> {
        sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found(ItemEntity::KIND, id))
    }

    #[instrument(skip(db))]
    pub async fn update_item(
        db: &PgPool,
        actor: UserId,
        id: ItemId,
        dto: UpdateItemDto,
    ) -> Result<Item, AppError> {
        let (actor_check, current, department_check) = tokio::join!(
            Guard::actor(db, actor),
            Self::get_item(db, id),
            ensure_department(db, dto.department_id)
        );
        actor_check?;
        let current = current?;
        department_check?;

        let mut tx = db.begin().await?;
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"UPDATE items
               SET description = COALESCE($2, description),
                   price = COALESCE($3, price),
                   department_id = COALESCE($4, department_id),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(dto.description.as_deref().map(str::trim))
        .bind(dto.price)
        .bind(dto.department_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error(ItemEntity::KIND))?
        .ok_or_else(|| not_found(ItemEntity::KIND, id))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Item,
            LogMethod::Update,
            previous_values(&current, &dto),
        )
        .await?;
        tx.commit().await?;

        Ok(item)
    }

    #[instrument(skip(db))]
    pub async fn delete_item(db: &PgPool, actor: UserId, id: ItemId) -> Result<(), AppError> {
        Lifecycle::purge::<ItemEntity>(db, actor, id.into_inner()).await?;
        Ok(())
    }
}
