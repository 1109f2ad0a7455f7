use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use wardmap_core::{AppError, PaginationMeta};
use wardmap_models::audit::previous_values;
use wardmap_models::ids::{DepartmentId, DivisionId, UserId};
use wardmap_models::{LogMethod, LogType};

use crate::modules::departments::model::{
    CreateDepartmentDto, Department, DepartmentFilterParams, DepartmentWithDivision, Division,
    UpdateDepartmentDto,
};
use crate::utils::audit::AuditLogger;
use crate::utils::guard::{DepartmentEntity, Guard, Managed, not_found, write_error};
use crate::utils::lifecycle::Lifecycle;

const DEPARTMENT_COLUMNS: &str = "id, name, code, division_id, created_at, updated_at";

#[derive(FromRow)]
struct DepartmentRow {
    #[sqlx(flatten)]
    department: Department,
    division_code: String,
    division_name: String,
}

impl From<DepartmentRow> for DepartmentWithDivision {
    fn from(row: DepartmentRow) -> Self {
        let division = Division {
            id: row.department.division_id,
            code: row.division_code,
            name: row.division_name,
        };
        Self {
            department: row.department,
            division,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &DepartmentFilterParams) {
    qb.push(" WHERE TRUE");

    if let Some(division_id) = filters.division_id {
        qb.push(" AND division_id = ").push_bind(DivisionId(division_id));
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

async fn ensure_division(db: &PgPool, id: Option<DivisionId>) -> Result<(), AppError> {
    let Some(id) = id else {
        return Ok(());
    };

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM divisions WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(not_found("Division", id))
    }
}

pub struct DepartmentService;

impl DepartmentService {
    pub async fn ensure_exists(db: &PgPool, id: DepartmentId) -> Result<(), AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM departments WHERE id = $1)")
                .bind(id)
                .fetch_one(db)
                .await?;

        if exists {
            Ok(())
        } else {
            Err(not_found(DepartmentEntity::KIND, id))
        }
    }

    async fn find(db: &PgPool, id: DepartmentId) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(&format!(
            "SELECT {} FROM departments WHERE id = $1",
            DEPARTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found(DepartmentEntity::KIND, id))
    }

    /// Codes are unique across all departments.
    async fn code_taken(
        db: &PgPool,
        code: &str,
        except: Option<DepartmentId>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM departments
                   WHERE lower(code) = lower($1) AND ($2::INT4 IS NULL OR id <> $2)
               )"#,
        )
        .bind(code)
        .bind(except)
        .fetch_one(db)
        .await?;

        Ok(taken)
    }

    #[instrument(skip(db))]
    pub async fn create_department(
        db: &PgPool,
        actor: UserId,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let (actor_check, division_check, taken) = tokio::join!(
            Guard::actor(db, actor),
            ensure_division(db, Some(dto.division_id)),
            Self::code_taken(db, dto.code.trim(), None)
        );
        actor_check?;
        division_check?;
        Guard::taken(taken?, DepartmentEntity::KIND)?;

        let mut tx = db.begin().await?;
        let department = sqlx::query_as::<_, Department>(&format!(
            r#"INSERT INTO departments (name, code, division_id)
               VALUES ($1, $2, $3)
               RETURNING {}"#,
            DEPARTMENT_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(dto.code.trim())
        .bind(dto.division_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error(DepartmentEntity::KIND))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Department,
            LogMethod::Create,
            serde_json::to_value(&department)?,
        )
        .await?;
        tx.commit().await?;

        Ok(department)
    }

    #[instrument(skip(db))]
    pub async fn get_departments(
        db: &PgPool,
        filters: DepartmentFilterParams,
    ) -> Result<(Vec<Department>, PaginationMeta), AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let sort_by = filters.sort_by.unwrap_or_default();
        let sort_order = filters.sort_order.unwrap_or_default();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM departments");
        push_filters(&mut count, &filters);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM departments",
            DEPARTMENT_COLUMNS
        ));
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

        let departments = query.build_query_as::<Department>().fetch_all(db).await?;

        Ok((departments, filters.pagination.meta(total)))
    }

    #[instrument(skip(db))]
    pub async fn get_department(
        db: &PgPool,
        id: DepartmentId,
    ) -> Result<DepartmentWithDivision, AppError> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"SELECT d.id, d.name, d.code, d.division_id, d.created_at, d.updated_at,
                      v.code AS division_code, v.name AS division_name
               FROM departments d
               JOIN divisions v ON v.id = d.division_id
               WHERE d.id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found(DepartmentEntity::KIND, id))?;

        Ok(row.into())
    }

    #[instrument(skip(db))]
    pub async fn get_divisions(db: &PgPool) -> Result<Vec<Division>, AppError> {
        let divisions =
            sqlx::query_as::<_, Division>("SELECT id, code, name FROM divisions ORDER BY id")
                .fetch_all(db)
                .await?;

        Ok(divisions)
    }

    #[instrument(skip(db))]
    pub async fn update_department(
        db: &PgPool,
        actor: UserId,
        id: DepartmentId,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        let code_check = async {
            match dto.code.as_deref() {
                Some(code) => Self::code_taken(db, code.trim(), Some(id)).await,
                None => Ok(false),
            }
        };
        let (actor_check, current, division_check, taken) = tokio::join!(
            Guard::actor(db, actor),
            Self::find(db, id),
            ensure_division(db, dto.division_id),
            code_check
        );
        actor_check?;
        let current = current?;
        division_check?;
        Guard::taken(taken?, DepartmentEntity::KIND)?;

        let mut tx = db.begin().await?;
        let department = sqlx::query_as::<_, Department>(&format!(
            r#"UPDATE departments
               SET name = COALESCE($2, name),
                   code = COALESCE($3, code),
                   division_id = COALESCE($4, division_id),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            DEPARTMENT_COLUMNS
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.code.as_deref().map(str::trim))
        .bind(dto.division_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error(DepartmentEntity::KIND))?
        .ok_or_else(|| not_found(DepartmentEntity::KIND, id))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::Department,
            LogMethod::Update,
            previous_values(&current, &dto),
        )
        .await?;
        tx.commit().await?;

        Ok(department)
    }

    /// Hard delete; departments still assigned to users or doctors stay.
    #[instrument(skip(db))]
    pub async fn delete_department(
        db: &PgPool,
        actor: UserId,
        id: DepartmentId,
    ) -> Result<(), AppError> {
        Lifecycle::purge::<DepartmentEntity>(db, actor, id.into_inner()).await?;
        Ok(())
    }
}
