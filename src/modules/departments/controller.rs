use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::MessageResponse;
use wardmap_models::ids::DepartmentId;

use crate::middleware::auth::AuthUser;
use crate::modules::departments::model::{
    CreateDepartmentDto, DepartmentDetailResponse, DepartmentFilterParams,
    DepartmentListResponse, DepartmentResponse, DivisionListResponse, UpdateDepartmentDto,
};
use crate::modules::departments::service::DepartmentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/department",
    request_body = CreateDepartmentDto,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 404, description = "Acting user or division not found"),
        (status = 409, description = "Department code already in use"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateDepartmentDto>,
) -> Result<(StatusCode, Json<DepartmentResponse>), AppError> {
    let department = DepartmentService::create_department(&state.db, auth_user.user_id(), dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(DepartmentResponse::new(
            "Department created successfully",
            department,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/department",
    params(DepartmentFilterParams),
    responses(
        (status = 200, description = "Departments", body = DepartmentListResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Departments"
)]
#[instrument(skip(state))]
pub async fn get_departments(
    State(state): State<AppState>,
    Query(filters): Query<DepartmentFilterParams>,
) -> Result<Json<DepartmentListResponse>, AppError> {
    let (departments, meta) = DepartmentService::get_departments(&state.db, filters).await?;

    Ok(Json(DepartmentListResponse::new(
        "Departments loaded successfully.",
        departments,
        meta,
    )))
}

#[utoipa::path(
    get,
    path = "/api/department/divisions",
    responses((status = 200, description = "All divisions", body = DivisionListResponse)),
    tag = "Departments"
)]
#[instrument(skip(state))]
pub async fn get_divisions(
    State(state): State<AppState>,
) -> Result<Json<DivisionListResponse>, AppError> {
    let divisions = DepartmentService::get_divisions(&state.db).await?;

    Ok(Json(DivisionListResponse {
        message: "Divisions loaded successfully.".to_string(),
        data: divisions,
    }))
}

#[utoipa::path(
    get,
    path = "/api/department/{id}",
    params(("id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department with its division", body = DepartmentDetailResponse),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments"
)]
#[instrument(skip(state))]
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<DepartmentId>,
) -> Result<Json<DepartmentDetailResponse>, AppError> {
    let department = DepartmentService::get_department(&state.db, id).await?;

    Ok(Json(DepartmentDetailResponse::new(
        format!("Department with the id {} found.", id),
        department,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/department/{id}",
    params(("id" = i32, Path, description = "Department ID")),
    request_body = UpdateDepartmentDto,
    responses(
        (status = 200, description = "Department updated", body = DepartmentResponse),
        (status = 404, description = "Acting user, department or division not found"),
        (status = 409, description = "Department code already in use")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DepartmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateDepartmentDto>,
) -> Result<Json<DepartmentResponse>, AppError> {
    let department =
        DepartmentService::update_department(&state.db, auth_user.user_id(), id, dto).await?;

    Ok(Json(DepartmentResponse::new(
        format!("Department with the id {} updated successfully.", id),
        department,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/department/{id}",
    params(("id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 404, description = "Acting user or department not found"),
        (status = 409, description = "Department is still assigned to users or doctors")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DepartmentId>,
) -> Result<Json<MessageResponse>, AppError> {
    DepartmentService::delete_department(&state.db, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Department with the id {} deleted successfully.",
        id
    ))))
}
