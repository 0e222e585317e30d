use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateAvailabilityRequest, UpdateAvailabilityRequest};
use crate::DoctorCellState;

/// Public doctor directory listing.
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<DoctorCellState>>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.doctors.list().await?;

    Ok(Json(json!({
        "success": true,
        "data": doctors,
    })))
}

/// Public view of a doctor's weekly availability windows.
#[axum::debug_handler]
pub async fn list_doctor_availabilities(
    State(state): State<Arc<DoctorCellState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let availabilities = state.availability.list_for_doctor(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": availabilities,
    })))
}

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<DoctorCellState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let owner_id = require_doctor(&user)?;

    let availability = state.availability.create(owner_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability created successfully",
        "data": availability,
    })))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<DoctorCellState>>,
    Path(availability_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let owner_id = require_doctor(&user)?;

    let availability = state
        .availability
        .update(owner_id, availability_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability updated successfully",
        "data": availability,
    })))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<Arc<DoctorCellState>>,
    Path(availability_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let owner_id = require_doctor(&user)?;

    state.availability.delete(owner_id, availability_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability deleted successfully",
    })))
}

/// Availability windows are created/edited/deleted exclusively by their
/// owning doctor.
fn require_doctor(user: &User) -> Result<Uuid, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden(
            "Only doctors can manage availabilities".to_string(),
        ));
    }

    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}
