use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentListQuery, AvailableSlotsQuery, BookAppointmentRequest,
    UpdateAppointmentRequest, UpdateStatusRequest,
};
use crate::services::slots::DEFAULT_SLOT_MINUTES;
use crate::AppointmentCellState;

/// Available booking slots for a doctor on a date, derived from the
/// doctor's weekly availability minus active bookings.
#[axum::debug_handler]
pub async fn available_slots(
    State(state): State<Arc<AppointmentCellState>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .slots
        .generate_slots(query.doctor_id, query.date, query.duration)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "doctor_id": query.doctor_id,
            "date": query.date,
            "duration": query.duration.unwrap_or(DEFAULT_SLOT_MINUTES),
            "available_slots": slots,
        },
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // Patients may only book for themselves; staff book on anyone's behalf.
    if user.is_patient() && !user.matches_id(request.patient_id) {
        return Err(AppError::Forbidden(
            "Patients can only book their own appointments".to_string(),
        ));
    }

    let appointment = state.booking.book(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Appointment booked successfully",
            "data": appointment,
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.booking.list(&user, query).await?;

    Ok(Json(json!({
        "success": true,
        "data": appointments,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.get(appointment_id).await?;
    require_participant_or_staff(&user, &appointment)?;

    Ok(Json(json!({
        "success": true,
        "data": appointment,
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let current = state.booking.get(appointment_id).await?;
    require_participant_or_staff(&user, &current)?;

    let appointment = state.booking.reschedule(appointment_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment updated successfully",
        "data": appointment,
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    // Only the treating doctor or staff drive the clinical lifecycle.
    let current = state.booking.get(appointment_id).await?;
    if !user.is_staff() && !user.matches_id(current.doctor_id) {
        return Err(AppError::Forbidden(
            "Only the doctor or clinic staff can change appointment status".to_string(),
        ));
    }

    let appointment = state
        .booking
        .change_status(appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment status updated successfully",
        "data": appointment,
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let current = state.booking.get(appointment_id).await?;
    require_participant_or_staff(&user, &current)?;

    let appointment = state.booking.cancel(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully",
        "data": appointment,
    })))
}

/// Patients and doctors only see appointments they take part in.
fn require_participant_or_staff(user: &User, appointment: &Appointment) -> Result<(), AppError> {
    if user.is_staff()
        || user.matches_id(appointment.patient_id)
        || user.matches_id(appointment.doctor_id)
    {
        return Ok(());
    }

    Err(AppError::Forbidden(
        "You do not have access to this appointment".to_string(),
    ))
}
