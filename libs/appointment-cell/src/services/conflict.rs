use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::time::TimeRange;

use crate::models::AppointmentError;
use crate::repository::AppointmentRepository;

/// Single source of truth for "is this interval free".
///
/// Both the slot generator's per-candidate check and the booking
/// orchestrator's pre-create check go through [`TimeRange::overlaps`], so
/// advertised free slots and accepted bookings cannot diverge.
pub struct ConflictChecker {
    appointments: Arc<dyn AppointmentRepository>,
}

impl ConflictChecker {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    /// True iff any active appointment for the doctor on `date` overlaps
    /// `range`. `exclude_appointment_id` lets a reschedule ignore the
    /// appointment being moved.
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        range: TimeRange,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking conflicts for doctor {} on {} from {} to {}",
            doctor_id, date, range.start, range.end
        );

        let booked = self
            .appointments
            .list_active_for_doctor_on_date(doctor_id, date)
            .await?;

        let conflict = booked
            .iter()
            .filter(|apt| Some(apt.id) != exclude_appointment_id)
            .any(|apt| apt.time_range().overlaps(&range));

        if conflict {
            warn!(
                "Conflict detected for doctor {} on {} at {}-{}",
                doctor_id, date, range.start, range.end
            );
        }

        Ok(conflict)
    }
}
