use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API-facing error taxonomy. Every variant maps to a stable HTTP status and
/// machine-readable `error_code` string that clients dispatch on.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slot not available: {0}")]
    SlotUnavailable(String),

    #[error("Availability overlap: {0}")]
    Overlap(String),

    #[error("Appointment closed: {0}")]
    AppointmentClosed(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::DoctorNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::AppointmentClosed(_)
            | AppError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SlotUnavailable(_) | AppError::Overlap(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DoctorNotFound(_) => "DOCTOR_NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::SlotUnavailable(_) => "SLOT_NOT_AVAILABLE",
            AppError::Overlap(_) => "OVERLAP",
            AppError::AppointmentClosed(_) => "APPOINTMENT_CLOSED",
            AppError::InvalidTransition(_) => "INVALID_STATUS_TRANSITION",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::debug!("Request rejected: {}: {}", status, message);
        }

        let body = Json(json!({
            "success": false,
            "message": message,
            "error_code": self.error_code(),
        }));

        (status, body).into_response()
    }
}
