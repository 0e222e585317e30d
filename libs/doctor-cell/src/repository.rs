use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AvailabilityWindow, Doctor, DoctorError};

/// Doctor directory lookups, backed by whatever user store the deployment
/// uses. The booking path only needs existence-with-role validation.
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn get(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError>;

    async fn list(&self) -> Result<Vec<Doctor>, DoctorError>;

    async fn insert(&self, doctor: Doctor) -> Result<Doctor, DoctorError>;
}

/// Per-doctor weekly availability windows.
///
/// The non-overlap invariant for a given doctor+day is enforced here, at the
/// repository boundary: `add` and `update` fail with [`DoctorError::Overlap`]
/// rather than persisting (or merging) a conflicting window. Implementations
/// should use [`ensure_no_window_overlap`] so the check shares the same
/// half-open semantics as the appointment conflict checker.
///
/// Removing or shrinking a window deliberately leaves already-booked
/// appointments untouched.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Windows for one ISO weekday, ordered by start time. Empty means the
    /// doctor is closed that day; that is a normal condition, not an error.
    async fn list_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError>;

    /// All windows for a doctor, ordered by day then start time.
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DoctorError>;

    async fn get(&self, id: Uuid) -> Result<Option<AvailabilityWindow>, DoctorError>;

    async fn add(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DoctorError>;

    /// Replaces the stored window; the overlap check excludes the window
    /// being updated itself.
    async fn update(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DoctorError>;

    async fn remove(&self, id: Uuid) -> Result<(), DoctorError>;
}

/// Overlap guard shared by repository implementations. `existing` is the full
/// set of windows already stored for the candidate's doctor; windows on other
/// days never conflict, and the candidate's own id is skipped so updates do
/// not collide with themselves.
pub fn ensure_no_window_overlap(
    existing: &[AvailabilityWindow],
    candidate: &AvailabilityWindow,
) -> Result<(), DoctorError> {
    let range = candidate.time_range();
    for window in existing {
        if window.id == candidate.id || window.day_of_week != candidate.day_of_week {
            continue;
        }
        if window.time_range().overlaps(&range) {
            return Err(DoctorError::Overlap);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn window(day: u8, start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
        AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn overlapping_window_on_same_day_is_rejected() {
        let existing = vec![window(1, (9, 0), (12, 0))];
        let candidate = window(1, (11, 0), (13, 0));

        assert!(matches!(
            ensure_no_window_overlap(&existing, &candidate),
            Err(DoctorError::Overlap)
        ));
    }

    #[test]
    fn touching_window_is_allowed() {
        let existing = vec![window(1, (9, 0), (12, 0))];
        let candidate = window(1, (12, 0), (14, 0));

        assert!(ensure_no_window_overlap(&existing, &candidate).is_ok());
    }

    #[test]
    fn other_days_never_conflict() {
        let existing = vec![window(1, (9, 0), (12, 0))];
        let candidate = window(2, (9, 0), (12, 0));

        assert!(ensure_no_window_overlap(&existing, &candidate).is_ok());
    }

    #[test]
    fn update_skips_its_own_row() {
        let mut stored = window(1, (9, 0), (12, 0));
        let existing = vec![stored.clone()];

        // Widening the same window must not conflict with itself.
        stored.end_time = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        assert!(ensure_no_window_overlap(&existing, &stored).is_ok());
    }
}
