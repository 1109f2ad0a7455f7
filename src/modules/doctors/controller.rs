use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use wardmap_core::AppError;
use wardmap_models::ids::DoctorId;

use crate::modules::doctors::model::{DoctorFilterParams, DoctorListResponse, DoctorResponse};
use crate::modules::doctors::service::DoctorService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/doctor",
    params(DoctorFilterParams),
    responses(
        (status = 200, description = "Doctors", body = DoctorListResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Doctors"
)]
#[instrument(skip(state))]
pub async fn get_doctors(
    State(state): State<AppState>,
    Query(filters): Query<DoctorFilterParams>,
) -> Result<Json<DoctorListResponse>, AppError> {
    let (doctors, meta) = DoctorService::get_doctors(&state.db, filters).await?;

    Ok(Json(DoctorListResponse::new(
        "Doctors loaded successfully.",
        doctors,
        meta,
    )))
}

#[utoipa::path(
    get,
    path = "/api/doctor/{id}",
    params(("id" = i32, Path, description = "Doctor ID")),
    responses(
        (status = 200, description = "Doctor", body = DoctorResponse),
        (status = 404, description = "Doctor not found")
    ),
    tag = "Doctors"
)]
#[instrument(skip(state))]
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<DoctorId>,
) -> Result<Json<DoctorResponse>, AppError> {
    let doctor = DoctorService::get_doctor(&state.db, id).await?;

    Ok(Json(DoctorResponse::new(
        format!("Doctor with the id {} found.", id),
        doctor,
    )))
}
