use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_item, delete_item, get_item, get_items, update_item};

pub fn init_item_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item).get(get_items))
        .route("/{id}", get(get_item).patch(update_item).delete(delete_item))
}
