use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::MessageResponse;
use wardmap_models::ids::{FloorId, RoomId};
use wardmap_models::rooms::{RoomFilterParams, RoomListResponse, RoomResponse};

use crate::middleware::auth::AuthUser;
use crate::modules::floors::model::{
    CreateFloorDto, FloorFilterParams, FloorListResponse, FloorResponse, UpdateFloorDto,
};
use crate::modules::floors::service::FloorService;
use crate::modules::rooms::service::RoomService;
use crate::state::AppState;
use crate::utils::uploads::collect_files;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/floor",
    request_body = CreateFloorDto,
    responses(
        (status = 201, description = "Floor created", body = FloorResponse),
        (status = 400, description = "Invalid input or missing token"),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "Acting user not found"),
        (status = 409, description = "An active floor with the same name, code and level exists"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Floors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateFloorDto>,
) -> Result<(StatusCode, Json<FloorResponse>), AppError> {
    let floor = FloorService::create_floor(&state.db, auth_user.user_id(), dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(FloorResponse::new("Floor created successfully", floor)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/floor",
    params(FloorFilterParams),
    responses(
        (status = 200, description = "Floors", body = FloorListResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Floors"
)]
#[instrument(skip(state))]
pub async fn get_floors(
    State(state): State<AppState>,
    Query(filters): Query<FloorFilterParams>,
) -> Result<Json<FloorListResponse>, AppError> {
    let (floors, meta) = FloorService::get_floors(&state.db, filters).await?;

    Ok(Json(FloorListResponse::new(
        "Floors loaded successfully.",
        floors,
        meta,
    )))
}

#[utoipa::path(
    get,
    path = "/api/floor/{id}",
    params(("id" = i32, Path, description = "Floor ID")),
    responses(
        (status = 200, description = "Floor", body = FloorResponse),
        (status = 404, description = "Floor not found")
    ),
    tag = "Floors"
)]
#[instrument(skip(state))]
pub async fn get_floor(
    State(state): State<AppState>,
    Path(id): Path<FloorId>,
) -> Result<Json<FloorResponse>, AppError> {
    let floor = FloorService::get_floor(&state.db, id).await?;

    Ok(Json(FloorResponse::new(
        format!("Floor with the id {} found.", id),
        floor,
    )))
}

#[utoipa::path(
    get,
    path = "/api/floor/{id}/room",
    params(("id" = i32, Path, description = "Floor ID"), RoomFilterParams),
    responses(
        (status = 200, description = "Rooms of the floor", body = RoomListResponse),
        (status = 404, description = "Floor not found")
    ),
    tag = "Floors"
)]
#[instrument(skip(state))]
pub async fn get_floor_rooms(
    State(state): State<AppState>,
    Path(id): Path<FloorId>,
    Query(filters): Query<RoomFilterParams>,
) -> Result<Json<RoomListResponse>, AppError> {
    let (rooms, meta) = RoomService::get_rooms_in_floor(&state.db, id, filters).await?;

    Ok(Json(RoomListResponse::new(
        format!("Rooms of the floor with the id {} found.", id),
        rooms,
        meta,
    )))
}

#[utoipa::path(
    get,
    path = "/api/floor/{id}/room/{room_id}",
    params(
        ("id" = i32, Path, description = "Floor ID"),
        ("room_id" = i32, Path, description = "Room ID")
    ),
    responses(
        (status = 200, description = "Room of the floor", body = RoomResponse),
        (status = 404, description = "Floor not found, or room not on this floor")
    ),
    tag = "Floors"
)]
#[instrument(skip(state))]
pub async fn get_floor_room(
    State(state): State<AppState>,
    Path((id, room_id)): Path<(FloorId, RoomId)>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = RoomService::get_room_in_floor(&state.db, id, room_id).await?;

    Ok(Json(RoomResponse::new(
        format!(
            "Room with the id {} found in floor with the floor id {}.",
            room_id, id
        ),
        room,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/floor/{id}",
    params(("id" = i32, Path, description = "Floor ID")),
    request_body = UpdateFloorDto,
    responses(
        (status = 200, description = "Floor updated", body = FloorResponse),
        (status = 404, description = "Acting user or active floor not found"),
        (status = 409, description = "An active floor with the same name, code and level exists")
    ),
    tag = "Floors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<FloorId>,
    ValidatedJson(dto): ValidatedJson<UpdateFloorDto>,
) -> Result<Json<FloorResponse>, AppError> {
    let floor = FloorService::update_floor(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(FloorResponse::new(
        format!("Floor with the id {} updated successfully.", id),
        floor,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/floor/{id}/upload",
    params(("id" = i32, Path, description = "Floor ID")),
    request_body(content_type = "multipart/form-data", description = "Floor map image in the `file` field"),
    responses(
        (status = 200, description = "Map stored", body = FloorResponse),
        (status = 400, description = "Missing file or not an image"),
        (status = 404, description = "Acting user or active floor not found")
    ),
    tag = "Floors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn upload_floor_map(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<FloorId>,
    mut multipart: Multipart,
) -> Result<Json<FloorResponse>, AppError> {
    let files = collect_files(&mut multipart, "file").await?;
    let floor = FloorService::upload_map(
        &state.db,
        state.storage.as_ref(),
        state.upload_config.max_file_size,
        auth_user.user_id(),
        id,
        files,
    )
    .await?;

    Ok(Json(FloorResponse::new(
        format!("Map has been set to the floor with the id {}", id),
        floor,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/floor/{id}/soft-delete",
    params(("id" = i32, Path, description = "Floor ID")),
    responses(
        (status = 200, description = "Floor moved to trash", body = MessageResponse),
        (status = 404, description = "Acting user or floor not found")
    ),
    tag = "Floors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn soft_delete_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<FloorId>,
) -> Result<Json<MessageResponse>, AppError> {
    FloorService::soft_delete_floor(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Floor with the id {} moved to trash.",
        id
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/floor/{id}/retrieve",
    params(("id" = i32, Path, description = "Floor ID")),
    responses(
        (status = 200, description = "Floor retrieved", body = MessageResponse),
        (status = 404, description = "Acting user or soft-deleted floor not found"),
        (status = 409, description = "An active floor now uses the same natural key")
    ),
    tag = "Floors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn retrieve_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<FloorId>,
) -> Result<Json<MessageResponse>, AppError> {
    FloorService::retrieve_floor(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Floor with the id {} retrieved.",
        id
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/floor/{id}",
    params(("id" = i32, Path, description = "Floor ID")),
    responses(
        (status = 200, description = "Floor deleted", body = MessageResponse),
        (status = 404, description = "Acting user or floor not found"),
        (status = 409, description = "The floor still owns rooms")
    ),
    tag = "Floors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn purge_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<FloorId>,
) -> Result<Json<MessageResponse>, AppError> {
    FloorService::purge_floor(&state.db, state.storage.as_ref(), auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Floor with the id {} deleted successfully.",
        id
    ))))
}
