use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_doctor, get_doctors};

pub fn init_doctor_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_doctors))
        .route("/{id}", get(get_doctor))
}
