use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::ids::{RoomId, RoomImageId};
use wardmap_models::{MessageResponse, Transition};

use crate::middleware::auth::AuthUser;
use crate::modules::rooms::model::{
    AddDirectionsDto, CreateRoomDto, ImageIdsQuery, RoomDetailResponse, RoomFilterParams,
    RoomImageListResponse, RoomImagesUploadedResponse, RoomListResponse, RoomPhotoFilterParams,
    RoomResponse, UpdateRoomDto,
};
use crate::modules::rooms::service::RoomService;
use crate::state::AppState;
use crate::utils::uploads::collect_files;
use crate::validator::ValidatedJson;

fn join_ids(ids: &[RoomImageId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[utoipa::path(
    post,
    path = "/api/room",
    request_body = CreateRoomDto,
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 400, description = "Invalid input or missing token"),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "Acting user or active floor not found"),
        (status = 409, description = "An active room with the same name and code exists"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateRoomDto>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    let room = RoomService::create_room(&state.db, auth_user.user_id(), dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(RoomResponse::new("Room created successfully", room)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/room",
    params(RoomFilterParams),
    responses(
        (status = 200, description = "Rooms", body = RoomListResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Rooms"
)]
#[instrument(skip(state))]
pub async fn get_rooms(
    State(state): State<AppState>,
    Query(filters): Query<RoomFilterParams>,
) -> Result<Json<RoomListResponse>, AppError> {
    let (rooms, meta) = RoomService::get_rooms(&state.db, filters).await?;

    Ok(Json(RoomListResponse::new(
        "Rooms loaded successfully.",
        rooms,
        meta,
    )))
}

#[utoipa::path(
    get,
    path = "/api/room/{id}",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room with its active images", body = RoomDetailResponse),
        (status = 404, description = "Room not found")
    ),
    tag = "Rooms"
)]
#[instrument(skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
) -> Result<Json<RoomDetailResponse>, AppError> {
    let room = RoomService::get_room(&state.db, id).await?;

    Ok(Json(RoomDetailResponse::new(
        format!("Room with the id {} loaded successfully", id),
        room,
    )))
}

#[utoipa::path(
    get,
    path = "/api/room/{id}/photos",
    params(("id" = i32, Path, description = "Room ID"), RoomPhotoFilterParams),
    responses(
        (status = 200, description = "Images of the room", body = RoomImageListResponse),
        (status = 404, description = "Room not found")
    ),
    tag = "Rooms"
)]
#[instrument(skip(state))]
pub async fn get_room_photos(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Query(filters): Query<RoomPhotoFilterParams>,
) -> Result<Json<RoomImageListResponse>, AppError> {
    let (images, meta) = RoomService::get_room_photos(&state.db, id, filters).await?;

    Ok(Json(RoomImageListResponse::new(
        format!("Images of the room with the id {} loaded successfully.", id),
        images,
        meta,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/room/{id}",
    params(("id" = i32, Path, description = "Room ID")),
    request_body = UpdateRoomDto,
    responses(
        (status = 200, description = "Room updated", body = RoomResponse),
        (status = 404, description = "Acting user, active room or target floor not found"),
        (status = 409, description = "An active room with the same name and code exists")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_room(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
    ValidatedJson(dto): ValidatedJson<UpdateRoomDto>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = RoomService::update_room(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(RoomResponse::new(
        format!("Room with the id {} updated successfully.", id),
        room,
    )))
}

#[utoipa::path(
    post,
    path = "/api/room/{id}/directions",
    params(("id" = i32, Path, description = "Room ID")),
    request_body = AddDirectionsDto,
    responses(
        (status = 200, description = "Directions stored", body = RoomResponse),
        (status = 404, description = "Acting user or active room not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn add_directions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
    ValidatedJson(dto): ValidatedJson<AddDirectionsDto>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = RoomService::add_directions(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(RoomResponse::new(
        format!("The room with the id {}'s directions added successfully.", id),
        room,
    )))
}

#[utoipa::path(
    post,
    path = "/api/room/{id}/upload",
    params(("id" = i32, Path, description = "Room ID")),
    request_body(content_type = "multipart/form-data", description = "JPEG, PNG or GIF images in the `files` field"),
    responses(
        (status = 201, description = "Images stored", body = RoomImagesUploadedResponse),
        (status = 400, description = "No files, too many files, or a file is not an accepted image"),
        (status = 404, description = "Acting user or active room not found"),
        (status = 413, description = "Request body too large")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn upload_room_images(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RoomImagesUploadedResponse>), AppError> {
    let files = collect_files(&mut multipart, "files").await?;
    let images = RoomService::upload_room_images(
        &state.db,
        state.storage.as_ref(),
        state.upload_config.max_room_images,
        state.upload_config.max_file_size,
        auth_user.user_id(),
        id,
        files,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoomImagesUploadedResponse {
            message: format!("Images uploaded to the room with the id {} successfully.", id),
            data: images,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/room/{id}/delete-images",
    params(("id" = i32, Path, description = "Room ID"), ImageIdsQuery),
    responses(
        (status = 200, description = "Images moved to trash", body = MessageResponse),
        (status = 400, description = "Missing or malformed image ids"),
        (status = 404, description = "Acting user, active room, or one of the images not found")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_room_images(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
    Query(query): Query<ImageIdsQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let ids = query.parse()?;
    RoomService::set_images_state(
        &state.db,
        auth_user.user_id(),
        id,
        ids.clone(),
        Transition::SoftDelete,
    )
    .await?;

    Ok(Json(MessageResponse::new(format!(
        "Room Images with the ids {} deleted of room with the id {}.",
        join_ids(&ids),
        id
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/room/{id}/retrieve-images",
    params(("id" = i32, Path, description = "Room ID"), ImageIdsQuery),
    responses(
        (status = 200, description = "Images retrieved", body = MessageResponse),
        (status = 400, description = "Missing or malformed image ids"),
        (status = 404, description = "Acting user, active room, or one of the images not found")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn retrieve_room_images(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
    Query(query): Query<ImageIdsQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let ids = query.parse()?;
    RoomService::set_images_state(
        &state.db,
        auth_user.user_id(),
        id,
        ids.clone(),
        Transition::Retrieve,
    )
    .await?;

    Ok(Json(MessageResponse::new(format!(
        "Room Images with the ids {} retrieved of room with the id {}.",
        join_ids(&ids),
        id
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/room/{id}/soft-delete",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room moved to trash", body = MessageResponse),
        (status = 404, description = "Acting user or room not found")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn soft_delete_room(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Json<MessageResponse>, AppError> {
    RoomService::soft_delete_room(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Room with the id {} moved to trash.",
        id
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/room/{id}/retrieve",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room retrieved", body = MessageResponse),
        (status = 404, description = "Acting user or soft-deleted room not found"),
        (status = 409, description = "An active room now uses the same natural key")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn retrieve_room(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Json<MessageResponse>, AppError> {
    RoomService::retrieve_room(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Room with the id {} retrieved.",
        id
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/room/{id}",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room deleted with its images", body = MessageResponse),
        (status = 404, description = "Acting user or room not found")
    ),
    tag = "Rooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn purge_room(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Json<MessageResponse>, AppError> {
    RoomService::purge_room(&state.db, state.storage.as_ref(), auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Room with the id {} deleted successfully.",
        id
    ))))
}
