use axum::Json;

use wardmap_models::MessageResponse;

/// Liveness probe. Does not touch the database.
#[utoipa::path(
    get,
    path = "/api/server-status",
    responses((status = 200, description = "Server is up", body = MessageResponse)),
    tag = "Server Status"
)]
pub async fn get_server_status() -> Json<MessageResponse> {
    Json(MessageResponse::new("Server is running"))
}
