use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};

use wardmap_config::UploadConfig;

use crate::state::AppState;

use super::controller::{
    add_directions, create_room, delete_room_images, get_room, get_room_photos, get_rooms,
    purge_room, retrieve_room, retrieve_room_images, soft_delete_room, update_room,
    upload_room_images,
};

pub fn init_room_router(upload: &UploadConfig) -> Router<AppState> {
    Router::new()
        .route("/", post(create_room).get(get_rooms))
        .route("/{id}", get(get_room).patch(update_room).delete(purge_room))
        .route("/{id}/photos", get(get_room_photos))
        .route("/{id}/directions", post(add_directions))
        .route(
            "/{id}/upload",
            post(upload_room_images)
                .layer(DefaultBodyLimit::max(upload.body_limit(upload.max_room_images))),
        )
        .route("/{id}/delete-images", delete(delete_room_images))
        .route("/{id}/retrieve-images", patch(retrieve_room_images))
        .route("/{id}/soft-delete", delete(soft_delete_room))
        .route("/{id}/retrieve", patch(retrieve_room))
}
