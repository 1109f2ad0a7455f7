use std::sync::Arc;

use sqlx::PgPool;
use wardmap_config::{CorsConfig, JwtConfig, RateLimitConfig, UploadConfig};
use wardmap_core::file_storage::{FileStorage, LocalFileStorage};
use wardmap_db::init_db_pool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub upload_config: UploadConfig,
    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    /// Local disk storage rooted at the configured upload directory.
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        rate_limit_config: RateLimitConfig,
        upload_config: UploadConfig,
    ) -> Self {
        let storage = LocalFileStorage::with_max_size(
            upload_config.upload_dir.clone(),
            upload_config.max_file_size,
        );

        Self {
            db,
            jwt_config,
            cors_config,
            rate_limit_config,
            upload_config,
            storage: Arc::new(storage),
        }
    }
}

pub async fn init_app_state() -> Result<AppState, sqlx::Error> {
    Ok(AppState::new(
        init_db_pool().await?,
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        RateLimitConfig::from_env(),
        UploadConfig::from_env(),
    ))
}
