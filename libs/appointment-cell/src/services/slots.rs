use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::repository::{AvailabilityRepository, DoctorRepository};
use shared_models::time::TimeRange;

use crate::models::{AppointmentError, TimeSlot};
use crate::repository::AppointmentRepository;

pub const DEFAULT_SLOT_MINUTES: u32 = 30;
pub const MIN_SLOT_MINUTES: u32 = 15;
pub const MAX_SLOT_MINUTES: u32 = 120;

/// Projects a doctor's weekly availability onto a concrete date and marks
/// each candidate slot against the active bookings for that date.
pub struct SlotGenerator {
    doctors: Arc<dyn DoctorRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl SlotGenerator {
    pub fn new(
        doctors: Arc<dyn DoctorRepository>,
        availability: Arc<dyn AvailabilityRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            doctors,
            availability,
            appointments,
        }
    }

    /// All slots of `duration` minutes for the doctor on `date`, in window
    /// order, each flagged available or not. A doctor with no windows on
    /// that weekday yields an empty list.
    pub async fn generate_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        duration: Option<u32>,
    ) -> Result<Vec<TimeSlot>, AppointmentError> {
        let duration = duration.unwrap_or(DEFAULT_SLOT_MINUTES);
        if !(MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES).contains(&duration) {
            return Err(AppointmentError::Validation(format!(
                "Slot duration must be between {} and {} minutes",
                MIN_SLOT_MINUTES, MAX_SLOT_MINUTES
            )));
        }

        if self.doctors.get(doctor_id).await?.is_none() {
            return Err(AppointmentError::DoctorNotFound);
        }

        // ISO weekday, 1 = Monday.
        let day_of_week = date.weekday().number_from_monday() as u8;
        let windows = self.availability.list_for_day(doctor_id, day_of_week).await?;
        if windows.is_empty() {
            debug!("Doctor {} has no availability on {} (day {})", doctor_id, date, day_of_week);
            return Ok(Vec::new());
        }

        let booked = self
            .appointments
            .list_active_for_doctor_on_date(doctor_id, date)
            .await?;

        let step = Duration::minutes(i64::from(duration));
        let mut slots = Vec::new();

        for window in &windows {
            let mut start = window.start_time;
            loop {
                // Wrapping past midnight would restart the walk at 00:00.
                let (end, wrapped) = start.overflowing_add_signed(step);
                if wrapped != 0 || end > window.end_time {
                    break;
                }

                let range = TimeRange { start, end };
                let available = !booked.iter().any(|apt| apt.time_range().overlaps(&range));
                slots.push(TimeSlot {
                    start_time: start,
                    end_time: end,
                    available,
                });

                start = end;
            }
        }

        debug!(
            "Generated {} slots ({} min) for doctor {} on {}",
            slots.len(),
            duration,
            doctor_id,
            date
        );
        Ok(slots)
    }
}
