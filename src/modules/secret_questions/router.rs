use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_secret_question, get_secret_questions};

pub fn init_secret_question_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_secret_questions))
        .route("/{id}", get(get_secret_question))
}
