use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::time::TimeRange;

use crate::models::{
    AvailabilityWindow, CreateAvailabilityRequest, DoctorError, UpdateAvailabilityRequest,
};
use crate::repository::{AvailabilityRepository, DoctorRepository};

/// Management of a doctor's recurring weekly availability windows.
///
/// Ownership rules live here (only the owning doctor may mutate a window);
/// the overlap invariant itself is enforced by the repository.
pub struct AvailabilityService {
    windows: Arc<dyn AvailabilityRepository>,
    doctors: Arc<dyn DoctorRepository>,
}

impl AvailabilityService {
    pub fn new(windows: Arc<dyn AvailabilityRepository>, doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { windows, doctors }
    }

    /// Public view of a doctor's declared windows, ordered by day then start.
    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Fetching availability for doctor: {}", doctor_id);

        if self.doctors.get(doctor_id).await?.is_none() {
            return Err(DoctorError::DoctorNotFound);
        }

        self.windows.list_for_doctor(doctor_id).await
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, DoctorError> {
        debug!("Creating availability for doctor: {}", owner_id);

        Self::validate_day_of_week(request.day_of_week)?;
        let range = TimeRange::new(request.start_time, request.end_time)
            .map_err(|e| DoctorError::Validation(e.to_string()))?;

        let now = Utc::now();
        let window = AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id: owner_id,
            day_of_week: request.day_of_week,
            start_time: range.start,
            end_time: range.end,
            created_at: now,
            updated_at: now,
        };

        let created = self.windows.add(window).await?;
        info!("Availability {} created for doctor {}", created.id, owner_id);
        Ok(created)
    }

    /// Partial update; unsupplied fields keep their current values. The
    /// merged window is re-validated and re-checked for overlap (excluding
    /// itself) before persisting.
    pub async fn update(
        &self,
        owner_id: Uuid,
        window_id: Uuid,
        request: UpdateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, DoctorError> {
        debug!("Updating availability: {}", window_id);

        let mut window = self.get_owned(owner_id, window_id).await?;

        if let Some(day) = request.day_of_week {
            Self::validate_day_of_week(day)?;
            window.day_of_week = day;
        }
        if let Some(start) = request.start_time {
            window.start_time = start;
        }
        if let Some(end) = request.end_time {
            window.end_time = end;
        }

        TimeRange::new(window.start_time, window.end_time)
            .map_err(|e| DoctorError::Validation(e.to_string()))?;
        window.updated_at = Utc::now();

        self.windows.update(window).await
    }

    /// Removing a window does not cancel appointments already booked inside
    /// the now-closed period.
    pub async fn delete(&self, owner_id: Uuid, window_id: Uuid) -> Result<(), DoctorError> {
        debug!("Deleting availability: {}", window_id);

        self.get_owned(owner_id, window_id).await?;
        self.windows.remove(window_id).await?;

        info!("Availability {} deleted by doctor {}", window_id, owner_id);
        Ok(())
    }

    async fn get_owned(
        &self,
        owner_id: Uuid,
        window_id: Uuid,
    ) -> Result<AvailabilityWindow, DoctorError> {
        let window = self
            .windows
            .get(window_id)
            .await?
            .ok_or(DoctorError::WindowNotFound)?;

        if window.doctor_id != owner_id {
            // Do not leak other doctors' window ids.
            return Err(DoctorError::WindowNotFound);
        }

        Ok(window)
    }

    fn validate_day_of_week(day: u8) -> Result<(), DoctorError> {
        if !(1..=7).contains(&day) {
            return Err(DoctorError::Validation(
                "day_of_week must be between 1 (Monday) and 7 (Sunday)".to_string(),
            ));
        }
        Ok(())
    }
}
