use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;
use wardmap_config::IpGovernorConfig;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::auth::router::init_auth_router;
use crate::modules::departments::router::init_department_router;
use crate::modules::doctors::router::init_doctor_router;
use crate::modules::floors::router::init_floor_router;
use crate::modules::items::router::init_item_router;
use crate::modules::rooms::router::init_room_router;
use crate::modules::secret_questions::router::init_secret_question_router;
use crate::modules::server_status::router::init_server_status_router;
use crate::modules::users::router::init_user_router;
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    let limits = &state.rate_limit_config;
    let (general, auth) = if limits.enabled {
        (
            limits.general_governor_config(),
            limits.auth_governor_config(),
        )
    } else {
        (None, None)
    };

    let api = Router::new()
        .nest("/auth", rate_limited(init_auth_router(), auth))
        .nest("/user", init_user_router())
        .nest("/floor", init_floor_router(&state.upload_config))
        .nest("/room", init_room_router(&state.upload_config))
        .nest("/department", init_department_router())
        .nest("/item", init_item_router())
        .nest("/doctor", init_doctor_router())
        .nest("/secret-question", init_secret_question_router())
        .nest("/server-status", init_server_status_router());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", rate_limited(api, general))
        .nest_service(
            &state.upload_config.public_path,
            ServeDir::new(&state.upload_config.upload_dir),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

fn rate_limited(router: Router<AppState>, config: Option<IpGovernorConfig>) -> Router<AppState> {
    match config {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => router,
    }
}
