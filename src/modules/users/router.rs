use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    change_password, create_user, get_user, get_user_secret, get_users, retrieve_user,
    soft_delete_user, update_user, update_user_secret, verify_password,
};

pub fn init_user_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(get_users))
        .route("/{id}", get(get_user).patch(update_user))
        .route("/{id}/secret", get(get_user_secret).patch(update_user_secret))
        .route("/{id}/change-password", patch(change_password))
        .route("/{id}/verify-password", post(verify_password))
        .route("/{id}/soft-delete", delete(soft_delete_user))
        .route("/{id}/retrieve", patch(retrieve_user))
}
