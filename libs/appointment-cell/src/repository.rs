use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentStatus, ScheduleChange,
};

/// Booked appointments per doctor and calendar date.
///
/// This trait is persistence only: `create` assumes the conflict check has
/// already happened upstream (the booking orchestrator holds the per-doctor
/// lock around check-then-write) and does not re-validate overlap. The one
/// rule implementations do enforce is terminal-state immutability:
/// `update_status` and `update_schedule` fail with
/// [`AppointmentError::Closed`] once an appointment is completed or
/// cancelled.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Appointments with status in {scheduled, confirmed, in_progress} for
    /// the doctor on the given date, ordered by start time. Cancelled and
    /// completed appointments are excluded; their slots are free again.
    async fn list_active_for_doctor_on_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError>;

    async fn update_schedule(
        &self,
        id: Uuid,
        change: ScheduleChange,
    ) -> Result<Appointment, AppointmentError>;

    /// Filtered listing ordered by date then start time, newest date first.
    async fn search(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError>;
}
