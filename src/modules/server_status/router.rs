use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::get_server_status;

pub fn init_server_status_router() -> Router<AppState> {
    Router::new().route("/", get(get_server_status))
}
