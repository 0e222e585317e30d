use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::time::{hhmm, hhmm_option, TimeRange};

// ==============================================================================
// DOCTOR DIRECTORY MODELS
// ==============================================================================

/// Directory entry for a doctor. User CRUD proper lives with the identity
/// collaborator; this is the surface the scheduling core needs for
/// existence/role checks and public listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// Recurring weekly open window declared by a doctor.
///
/// `day_of_week` is ISO: 1 = Monday .. 7 = Sunday. Windows for the same
/// doctor and day must not overlap; the repository rejects violations
/// instead of merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: u8,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub day_of_week: Option<u8>,
    #[serde(default, with = "hhmm_option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm_option")]
    pub end_time: Option<NaiveTime>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Availability not found")]
    WindowNotFound,

    #[error("Availability overlaps an existing window")]
    Overlap,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::DoctorNotFound => AppError::DoctorNotFound("Doctor not found".to_string()),
            DoctorError::WindowNotFound => AppError::NotFound("Availability not found".to_string()),
            DoctorError::Overlap => {
                AppError::Overlap("Availability overlaps an existing window".to_string())
            }
            DoctorError::Validation(msg) => AppError::Validation(msg),
            DoctorError::Storage(msg) => AppError::Internal(msg),
        }
    }
}
