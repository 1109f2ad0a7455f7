use anyhow::anyhow;
use serde_json::json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use wardmap_core::password::{hash_password, normalize_secret_answer, verify_password};
use wardmap_core::{AppError, PaginationMeta};
use wardmap_models::audit::{REDACTED, previous_values, redacted_password};
use wardmap_models::ids::{DepartmentId, UserId};
use wardmap_models::{LogMethod, LogType, Plan, Transition};

use crate::modules::departments::service::DepartmentService;
use crate::modules::secret_questions::service::SecretQuestionService;
use crate::modules::users::model::{
    ChangePasswordDto, CreateUserDto, USER_COLUMNS, UpdateSecretDto, UpdateUserDto, User,
    UserCredentials, UserFilterParams, UserSecret, VerifyPasswordDto,
};
use crate::utils::audit::AuditLogger;
use crate::utils::guard::{Guard, Managed, UserEntity, not_found, write_error};
use crate::utils::lifecycle::Lifecycle;

const CREDENTIAL_COLUMNS: &str = "id, employee_id, first_name, last_name, password, refresh_token, \
     secret_question_id, secret_answer, is_deleted";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &UserFilterParams) {
    qb.push(" WHERE is_deleted = ")
        .push_bind(filters.is_deleted.unwrap_or(false));

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
        let pattern = format!("%{}%", search);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR middle_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR employee_id ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

async fn ensure_department(db: &PgPool, id: Option<DepartmentId>) -> Result<(), AppError> {
    match id {
        Some(id) => DepartmentService::ensure_exists(db, id).await,
        None => Ok(()),
    }
}

pub struct UserService;

impl UserService {
    async fn find(db: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(user)
    }

    /// Employee ids are unique across all users; full names only among
    /// active ones.
    async fn key_taken(
        db: &PgPool,
        employee_id: Option<&str>,
        first_name: &str,
        middle_name: Option<&str>,
        last_name: &str,
        except: Option<UserId>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM users
                   WHERE ($5::INT4 IS NULL OR id <> $5)
                     AND (
                         ($1::TEXT IS NOT NULL AND employee_id = $1)
                         OR (NOT is_deleted
                             AND lower(first_name) = lower($2)
                             AND lower(COALESCE(middle_name, '')) = lower(COALESCE($3, ''))
                             AND lower(last_name) = lower($4))
                     )
               )"#,
        )
        .bind(employee_id)
        .bind(first_name)
        .bind(middle_name)
        .bind(last_name)
        .bind(except)
        .fetch_one(db)
        .await?;

        Ok(taken)
    }

    async fn insert<'e, E>(executor: E, dto: &CreateUserDto, password_hash: &str) -> Result<User, AppError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (employee_id, first_name, middle_name, last_name, password, department_id)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(dto.employee_id.trim())
        .bind(dto.first_name.trim())
        .bind(dto.middle_name.as_deref().map(str::trim))
        .bind(dto.last_name.trim())
        .bind(password_hash)
        .bind(dto.department_id)
        .fetch_one(executor)
        .await
        .map_err(write_error(UserEntity::KIND))?;

        Ok(user)
    }

    async fn ensure_free(db: &PgPool, dto: &CreateUserDto) -> Result<bool, AppError> {
        Self::key_taken(
            db,
            Some(dto.employee_id.trim()),
            dto.first_name.trim(),
            dto.middle_name.as_deref().map(str::trim),
            dto.last_name.trim(),
            None,
        )
        .await
    }

    /// Creates a user on behalf of an authenticated actor.
    #[instrument(skip(db, dto), fields(employee_id = %dto.employee_id))]
    pub async fn create_user(
        db: &PgPool,
        actor: UserId,
        dto: CreateUserDto,
    ) -> Result<User, AppError> {
        let (actor_check, department_check, taken) = tokio::join!(
            Guard::actor(db, actor),
            ensure_department(db, dto.department_id),
            Self::ensure_free(db, &dto)
        );
        actor_check?;
        department_check?;
        Guard::taken(taken?, UserEntity::KIND)?;

        let password_hash = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;
        let user = Self::insert(&mut *tx, &dto, &password_hash).await?;
        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::User,
            LogMethod::Create,
            serde_json::to_value(&user)?,
        )
        .await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Self-registration. With no one else acting, the new user is logged as
    /// the actor of their own creation.
    #[instrument(skip(db, dto), fields(employee_id = %dto.employee_id))]
    pub async fn register_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let (department_check, taken) = tokio::join!(
            ensure_department(db, dto.department_id),
            Self::ensure_free(db, &dto)
        );
        department_check?;
        Guard::taken(taken?, UserEntity::KIND)?;

        let password_hash = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;
        let user = Self::insert(&mut *tx, &dto, &password_hash).await?;
        AuditLogger::record(
            &mut *tx,
            user.id,
            LogType::User,
            LogMethod::Create,
            serde_json::to_value(&user)?,
        )
        .await?;
        tx.commit().await?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<(Vec<User>, PaginationMeta), AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let sort_by = filters.sort_by.unwrap_or_default();
        let sort_order = filters.sort_order.unwrap_or_default();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, &filters);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
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

        let users = query.build_query_as::<User>().fetch_all(db).await?;

        Ok((users, filters.pagination.meta(total)))
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        Self::find(db, id)
            .await?
            .filter(|user| !user.is_deleted)
            .ok_or_else(|| not_found(UserEntity::KIND, id))
    }

    /// The question the user picked, if any. The answer never leaves the table.
    #[instrument(skip(db))]
    pub async fn get_user_secret(db: &PgPool, id: UserId) -> Result<UserSecret, AppError> {
        let secret = sqlx::query_as::<_, UserSecret>(
            r#"SELECT u.id AS user_id, u.secret_question_id, q.question
               FROM users u
               LEFT JOIN secret_questions q ON q.id = u.secret_question_id
               WHERE u.id = $1 AND NOT u.is_deleted"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found(UserEntity::KIND, id))?;

        Ok(secret)
    }

    #[instrument(skip(db))]
    pub async fn update_user(
        db: &PgPool,
        actor: UserId,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let (actor_check, current, department_check) = tokio::join!(
            Guard::actor(db, actor),
            Self::get_user(db, id),
            ensure_department(db, dto.department_id)
        );
        actor_check?;
        let current = current?;
        department_check?;

        let first_name = dto.first_name.as_deref().map(str::trim).unwrap_or(&current.first_name);
        let middle_name = dto
            .middle_name
            .as_deref()
            .map(str::trim)
            .or(current.middle_name.as_deref());
        let last_name = dto.last_name.as_deref().map(str::trim).unwrap_or(&current.last_name);
        Guard::taken(
            Self::key_taken(db, None, first_name, middle_name, last_name, Some(id)).await?,
            UserEntity::KIND,
        )?;

        let mut tx = db.begin().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET first_name = $2,
                   middle_name = $3,
                   last_name = $4,
                   department_id = COALESCE($5, department_id),
                   updated_at = NOW()
               WHERE id = $1 AND NOT is_deleted
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(first_name)
        .bind(middle_name)
        .bind(last_name)
        .bind(dto.department_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error(UserEntity::KIND))?
        .ok_or_else(|| not_found(UserEntity::KIND, id))?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::User,
            LogMethod::Update,
            previous_values(&current, &dto),
        )
        .await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Secret material of an active user, by id.
    pub async fn credentials(db: &PgPool, id: UserId) -> Result<UserCredentials, AppError> {
        sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND NOT is_deleted",
            CREDENTIAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found(UserEntity::KIND, id))
    }

    /// Secret material of an active user, by employee id.
    pub async fn credentials_by_employee_id(
        db: &PgPool,
        employee_id: &str,
    ) -> Result<UserCredentials, AppError> {
        sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {} FROM users WHERE employee_id = $1 AND NOT is_deleted",
            CREDENTIAL_COLUMNS
        ))
        .bind(employee_id.trim())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::not_found(anyhow!(
                "User with the employee id {} not found.",
                employee_id.trim()
            ))
        })
    }

    /// Stores or clears the refresh token of a user.
    pub async fn set_refresh_token(
        db: &PgPool,
        id: UserId,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(db)
            .await?;

        Ok(())
    }

    /// Replaces the password hash and drops the stored refresh token, logging
    /// a redacted entry in the same transaction.
    pub async fn replace_password(
        db: &PgPool,
        actor: UserId,
        id: UserId,
        new_password: &str,
    ) -> Result<(), AppError> {
        let password_hash = hash_password(new_password)?;

        let mut tx = db.begin().await?;
        let updated = sqlx::query(
            r#"UPDATE users
               SET password = $2, refresh_token = NULL, updated_at = NOW()
               WHERE id = $1 AND NOT is_deleted"#,
        )
        .bind(id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(not_found(UserEntity::KIND, id));
        }

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::User,
            LogMethod::Update,
            redacted_password(),
        )
        .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Only the user themselves may touch their credentials.
    fn ensure_caller(actor: UserId, id: UserId) -> Result<(), AppError> {
        if actor == id {
            Ok(())
        } else {
            Err(AppError::bad_request(anyhow!("Ids mismatch.")))
        }
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        actor: UserId,
        id: UserId,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        Self::ensure_caller(actor, id)?;
        let credentials = Self::credentials(db, id).await?;

        if !verify_password(&dto.old_password, &credentials.password)? {
            return Err(AppError::bad_request(anyhow!("Old password is incorrect.")));
        }

        Self::replace_password(db, actor, id, &dto.new_password).await
    }

    #[instrument(skip(db, dto))]
    pub async fn update_user_secret(
        db: &PgPool,
        actor: UserId,
        id: UserId,
        dto: UpdateSecretDto,
    ) -> Result<UserSecret, AppError> {
        Self::ensure_caller(actor, id)?;
        let (credentials, question_check) = tokio::join!(
            Self::credentials(db, id),
            SecretQuestionService::ensure_exists(db, dto.secret_question_id)
        );
        let credentials = credentials?;
        question_check?;

        let answer_hash = hash_password(&normalize_secret_answer(&dto.secret_answer))?;

        let mut tx = db.begin().await?;
        sqlx::query(
            r#"UPDATE users
               SET secret_question_id = $2, secret_answer = $3, updated_at = NOW()
               WHERE id = $1 AND NOT is_deleted"#,
        )
        .bind(id)
        .bind(dto.secret_question_id)
        .bind(&answer_hash)
        .execute(&mut *tx)
        .await?;

        AuditLogger::record(
            &mut *tx,
            actor,
            LogType::User,
            LogMethod::Update,
            json!({
                "secret_question_id": credentials.secret_question_id,
                "secret_answer": REDACTED,
            }),
        )
        .await?;
        tx.commit().await?;

        Self::get_user_secret(db, id).await
    }

    #[instrument(skip(db, dto))]
    pub async fn verify_password(
        db: &PgPool,
        actor: UserId,
        id: UserId,
        dto: VerifyPasswordDto,
    ) -> Result<(), AppError> {
        Self::ensure_caller(actor, id)?;
        let credentials = Self::credentials(db, id).await?;

        if verify_password(&dto.password, &credentials.password)? {
            Ok(())
        } else {
            Err(AppError::bad_request(anyhow!("Incorrect password.")))
        }
    }

    #[instrument(skip(db))]
    pub async fn soft_delete_user(db: &PgPool, actor: UserId, id: UserId) -> Result<Plan, AppError> {
        if actor == id {
            return Err(AppError::bad_request(anyhow!(
                "You cannot delete your own account."
            )));
        }

        Lifecycle::transition::<UserEntity>(db, actor, id.into_inner(), Transition::SoftDelete).await
    }

    #[instrument(skip(db))]
    pub async fn retrieve_user(db: &PgPool, actor: UserId, id: UserId) -> Result<Plan, AppError> {
        Lifecycle::transition::<UserEntity>(db, actor, id.into_inner(), Transition::Retrieve).await
    }
}
