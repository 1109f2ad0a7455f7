use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::MessageResponse;
use wardmap_models::ids::ItemId;

use crate::middleware::auth::AuthUser;
use crate::modules::items::model::{
    CreateItemDto, ItemFilterParams, ItemListResponse, ItemResponse, UpdateItemDto,
};
use crate::modules::items::service::ItemService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/item",
    request_body = CreateItemDto,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 404, description = "Acting user or department not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Items",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateItemDto>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    let item = ItemService::create_item(&state.db, auth_user.user_id(), dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse::new("Item created successfully", item)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/item",
    params(ItemFilterParams),
    responses(
        (status = 200, description = "Items", body = ItemListResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Items"
)]
#[instrument(skip(state))]
pub async fn get_items(
    State(state): State<AppState>,
    Query(filters): Query<ItemFilterParams>,
) -> Result<Json<ItemListResponse>, AppError> {
    let (items, meta) = ItemService::get_items(&state.db, filters).await?;

    Ok(Json(ItemListResponse::new("Items loaded successfully", items, meta)))
}

#[utoipa::path(
    get,
    path = "/api/item/{id}",
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 404, description = "Item not found")
    ),
    tag = "Items"
)]
#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = ItemService::get_item(&state.db, id).await?;

    Ok(Json(ItemResponse::new(
        format!("Item with the id {} found.", id),
        item,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/item/{id}",
    params(("id" = i32, Path, description = "Item ID")),
    request_body = UpdateItemDto,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 404, description = "Acting user, item or department not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Items",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ItemId>,
    ValidatedJson(dto): ValidatedJson<UpdateItemDto>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = ItemService::update_item(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(ItemResponse::new(
        format!("Item with the id {} updated successfully.", id),
        item,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/item/{id}",
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 404, description = "Acting user or item not found")
    ),
    tag = "Items",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<ItemId>,
) -> Result<Json<MessageResponse>, AppError> {
    ItemService::delete_item(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Item with the id {} deleted successfully.",
        id
    ))))
}
