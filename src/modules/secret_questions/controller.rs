use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use wardmap_core::{AppError, PaginationParams};
use wardmap_models::ids::SecretQuestionId;

use crate::modules::secret_questions::model::{
    SecretQuestionListResponse, SecretQuestionResponse,
};
use crate::modules::secret_questions::service::SecretQuestionService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/secret-question",
    params(PaginationParams),
    responses((status = 200, description = "Secret questions", body = SecretQuestionListResponse)),
    tag = "Secret Questions"
)]
#[instrument(skip(state))]
pub async fn get_secret_questions(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<SecretQuestionListResponse>, AppError> {
    let (questions, meta) =
        SecretQuestionService::get_secret_questions(&state.db, pagination).await?;

    Ok(Json(SecretQuestionListResponse::new(
        "Secret questions loaded successfully.",
        questions,
        meta,
    )))
}

#[utoipa::path(
    get,
    path = "/api/secret-question/{id}",
    params(("id" = i32, Path, description = "Secret question ID")),
    responses(
        (status = 200, description = "Secret question", body = SecretQuestionResponse),
        (status = 404, description = "Secret question not found")
    ),
    tag = "Secret Questions"
)]
#[instrument(skip(state))]
pub async fn get_secret_question(
    State(state): State<AppState>,
    Path(id): Path<SecretQuestionId>,
) -> Result<Json<SecretQuestionResponse>, AppError> {
    let question = SecretQuestionService::get_secret_question(&state.db, id).await?;

    Ok(Json(SecretQuestionResponse::new(
        format!("Secret question with the id {} found.", id),
        question,
    )))
}
