use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use wardmap_auth::{
    create_access_token, create_password_reset_token, create_refresh_token,
    verify_password_reset_token, verify_refresh_token,
};
use wardmap_config::JwtConfig;
use wardmap_core::AppError;
use wardmap_core::password::{normalize_secret_answer, verify_password};
use wardmap_models::ids::UserId;
use wardmap_models::users::{CreateUserDto, User, UserCredentials};

use crate::metrics;
use crate::modules::auth::model::{
    ForgotPasswordDto, LoginRequestDto, RefreshTokenRequestDto, ResetPasswordDto,
};
use crate::modules::users::service::UserService;
use crate::utils::guard::Guard;

/// Tokens handed out by a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

fn access_token_for(
    credentials: &UserCredentials,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let token = create_access_token(
        credentials.id.into_inner(),
        &credentials.employee_id,
        &credentials.first_name,
        &credentials.last_name,
        jwt_config,
    )?;
    metrics::track_jwt_issued("access");
    Ok(token)
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto), fields(employee_id = %dto.employee_id))]
    pub async fn register_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        UserService::register_user(db, dto).await
    }

    /// Checks the password and issues an access token. The stored refresh
    /// token is handed back while it still verifies; otherwise a new one is
    /// issued and stored.
    #[instrument(skip(db, dto, jwt_config), fields(employee_id = %dto.employee_id))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequestDto,
        jwt_config: &JwtConfig,
    ) -> Result<LoginOutcome, AppError> {
        let credentials = match UserService::credentials_by_employee_id(db, &dto.employee_id).await
        {
            Ok(credentials) => credentials,
            Err(e) => {
                metrics::track_user_login_failure("unknown_user");
                return Err(e);
            }
        };

        if !verify_password(&dto.password, &credentials.password)? {
            metrics::track_user_login_failure("wrong_password");
            return Err(AppError::bad_request(anyhow!("Invalid password.")));
        }

        let access_token = access_token_for(&credentials, jwt_config)?;

        let reusable = credentials.refresh_token.as_deref().filter(|token| {
            verify_refresh_token(token, jwt_config)
                .is_ok_and(|claims| claims.sub == credentials.id.into_inner())
        });

        let refresh_token = match reusable {
            Some(token) => token.to_string(),
            None => {
                let token = create_refresh_token(credentials.id.into_inner(), jwt_config)?;
                UserService::set_refresh_token(db, credentials.id, Some(&token)).await?;
                metrics::track_jwt_issued("refresh");
                token
            }
        };

        let user = UserService::get_user(db, credentials.id).await?;
        metrics::track_user_login_success();
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            access_token,
            refresh_token,
            user,
        })
    }

    /// A refresh token only counts while it is the one stored for an active user.
    #[instrument(skip_all)]
    pub async fn refresh_access_token(
        db: &PgPool,
        dto: RefreshTokenRequestDto,
        jwt_config: &JwtConfig,
    ) -> Result<String, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;
        let credentials = UserService::credentials(db, UserId(claims.sub)).await?;

        if credentials.refresh_token.as_deref() != Some(dto.refresh_token.as_str()) {
            return Err(AppError::not_found(anyhow!("Refresh token not found.")));
        }

        access_token_for(&credentials, jwt_config)
    }

    #[instrument(skip(db))]
    pub async fn logout_user(db: &PgPool, actor: UserId) -> Result<(), AppError> {
        Guard::actor(db, actor).await?;
        UserService::set_refresh_token(db, actor, None).await?;
        tracing::info!(user_id = %actor, "User logged out");
        Ok(())
    }

    /// Exchanges a correct secret question and answer for a short-lived
    /// password reset token.
    #[instrument(skip(db, dto, jwt_config), fields(employee_id = %dto.employee_id))]
    pub async fn forgot_password(
        db: &PgPool,
        dto: ForgotPasswordDto,
        jwt_config: &JwtConfig,
    ) -> Result<String, AppError> {
        let credentials = UserService::credentials_by_employee_id(db, &dto.employee_id).await?;
        let incorrect = || AppError::bad_request(anyhow!("Secret question or answer is incorrect."));

        if credentials.secret_question_id != Some(dto.secret_question_id) {
            return Err(incorrect());
        }
        let stored = credentials.secret_answer.as_deref().ok_or_else(incorrect)?;
        if !verify_password(&normalize_secret_answer(&dto.secret_answer), stored)? {
            return Err(incorrect());
        }

        let token = create_password_reset_token(credentials.id.into_inner(), jwt_config)?;
        metrics::track_jwt_issued("reset");
        Ok(token)
    }

    /// Sets a new password and logs the user out everywhere.
    #[instrument(skip_all)]
    pub async fn reset_password(
        db: &PgPool,
        dto: ResetPasswordDto,
        jwt_config: &JwtConfig,
    ) -> Result<(), AppError> {
        let claims = verify_password_reset_token(&dto.reset_token, jwt_config)?;
        let id = UserId(claims.sub);

        UserService::replace_password(db, id, id, &dto.new_password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use wardmap_auth::verify_token;
    use wardmap_models::ids::SecretQuestionId;
    use wardmap_models::users::UpdateSecretDto;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-access-secret-at-least-32-characters".to_string(),
            refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            reset_token_expiry: 600,
        }
    }

    async fn register(pool: &PgPool) -> User {
        AuthService::register_user(
            pool,
            CreateUserDto {
                employee_id: "00001111".to_string(),
                first_name: "Niel".to_string(),
                middle_name: None,
                last_name: "Marketing".to_string(),
                password: "abcd_1234".to_string(),
                department_id: None,
            },
        )
        .await
        .unwrap()
    }

    fn login(password: &str) -> LoginRequestDto {
        LoginRequestDto {
            employee_id: "00001111".to_string(),
            password: password.to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_issues_and_reuses_refresh_token(pool: PgPool) {
        let config = jwt_config();
        let user = register(&pool).await;

        let first = AuthService::login_user(&pool, login("abcd_1234"), &config)
            .await
            .unwrap();
        assert_eq!(first.user.id, user.id);
        assert_eq!(verify_token(&first.access_token, &config).unwrap().sub, user.id.0);

        let second = AuthService::login_user(&pool, login("abcd_1234"), &config)
            .await
            .unwrap();
        assert_eq!(first.refresh_token, second.refresh_token);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_failures(pool: PgPool) {
        let config = jwt_config();
        register(&pool).await;

        let err = AuthService::login_user(&pool, login("wrong_pass"), &config)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut unknown = login("abcd_1234");
        unknown.employee_id = "99999999".to_string();
        let err = AuthService::login_user(&pool, unknown, &config).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_refresh_requires_stored_token(pool: PgPool) {
        let config = jwt_config();
        let user = register(&pool).await;
        let outcome = AuthService::login_user(&pool, login("abcd_1234"), &config)
            .await
            .unwrap();

        let access = AuthService::refresh_access_token(
            &pool,
            RefreshTokenRequestDto {
                refresh_token: outcome.refresh_token.clone(),
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(verify_token(&access, &config).unwrap().sub, user.id.0);

        AuthService::logout_user(&pool, user.id).await.unwrap();
        let err = AuthService::refresh_access_token(
            &pool,
            RefreshTokenRequestDto {
                refresh_token: outcome.refresh_token,
            },
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = AuthService::refresh_access_token(
            &pool,
            RefreshTokenRequestDto {
                refresh_token: "garbage".to_string(),
            },
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_password_recovery(pool: PgPool) {
        let config = jwt_config();
        let user = register(&pool).await;
        let question = sqlx::query_scalar::<_, SecretQuestionId>(
            "INSERT INTO secret_questions (question) VALUES ('First pet?') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        UserService::update_user_secret(
            &pool,
            user.id,
            user.id,
            UpdateSecretDto {
                secret_question_id: question,
                secret_answer: "Fluffy".to_string(),
            },
        )
        .await
        .unwrap();
        AuthService::login_user(&pool, login("abcd_1234"), &config)
            .await
            .unwrap();

        let wrong = ForgotPasswordDto {
            employee_id: "00001111".to_string(),
            secret_question_id: question,
            secret_answer: "Rex".to_string(),
        };
        let err = AuthService::forgot_password(&pool, wrong, &config).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let right = ForgotPasswordDto {
            employee_id: "00001111".to_string(),
            secret_question_id: question,
            secret_answer: " fluffy ".to_string(),
        };
        let reset_token = AuthService::forgot_password(&pool, right, &config).await.unwrap();

        AuthService::reset_password(
            &pool,
            ResetPasswordDto {
                reset_token,
                new_password: "brand_new_pass".to_string(),
            },
            &config,
        )
        .await
        .unwrap();

        let credentials = UserService::credentials(&pool, user.id).await.unwrap();
        assert!(credentials.refresh_token.is_none());
        assert!(
            AuthService::login_user(&pool, login("brand_new_pass"), &config)
                .await
                .is_ok()
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_access_token_is_not_a_reset_token(pool: PgPool) {
        let config = jwt_config();
        register(&pool).await;
        let outcome = AuthService::login_user(&pool, login("abcd_1234"), &config)
            .await
            .unwrap();

        let err = AuthService::reset_password(
            &pool,
            ResetPasswordDto {
                reset_token: outcome.access_token,
                new_password: "brand_new_pass".to_string(),
            },
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
