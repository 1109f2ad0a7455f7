use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};

use wardmap_config::UploadConfig;

use crate::state::AppState;

use super::controller::{
    create_floor, get_floor, get_floor_room, get_floor_rooms, get_floors, purge_floor,
    retrieve_floor, soft_delete_floor, update_floor, upload_floor_map,
};

pub fn init_floor_router(upload: &UploadConfig) -> Router<AppState> {
    Router::new()
        .route("/", post(create_floor).get(get_floors))
        .route(
            "/{id}",
            get(get_floor).patch(update_floor).delete(purge_floor),
        )
        .route("/{id}/room", get(get_floor_rooms))
        .route("/{id}/room/{room_id}", get(get_floor_room))
        .route(
            "/{id}/upload",
            patch(upload_floor_map).layer(DefaultBodyLimit::max(upload.body_limit(1))),
        )
        .route("/{id}/soft-delete", delete(soft_delete_floor))
        .route("/{id}/retrieve", patch(retrieve_floor))
}
