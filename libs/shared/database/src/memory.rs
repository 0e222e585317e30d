use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentStatus, ScheduleChange,
};
use appointment_cell::repository::AppointmentRepository;
use doctor_cell::models::{AvailabilityWindow, Doctor, DoctorError};
use doctor_cell::repository::{ensure_no_window_overlap, AvailabilityRepository, DoctorRepository};

/// In-memory reference store backing all three repositories.
///
/// One store instance is shared across the cells so the slot generator and
/// the booking path observe the same data. Each collection sits behind its
/// own `RwLock`; cross-collection atomicity is not needed because the
/// booking orchestrator already serializes check-then-write per doctor.
#[derive(Default)]
pub struct MemoryStore {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    windows: RwLock<HashMap<Uuid, AvailabilityWindow>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DoctorRepository for MemoryStore {
    async fn get(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Doctor>, DoctorError> {
        let mut doctors: Vec<Doctor> = self.doctors.read().await.values().cloned().collect();
        doctors.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(doctors)
    }

    async fn insert(&self, doctor: Doctor) -> Result<Doctor, DoctorError> {
        debug!("Inserting doctor {} ({})", doctor.id, doctor.full_name());
        self.doctors.write().await.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn list_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let mut windows: Vec<AvailabilityWindow> = self
            .windows
            .read()
            .await
            .values()
            .filter(|w| w.doctor_id == doctor_id && w.day_of_week == day_of_week)
            .cloned()
            .collect();
        windows.sort_by_key(|w| w.start_time);
        Ok(windows)
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let mut windows: Vec<AvailabilityWindow> = self
            .windows
            .read()
            .await
            .values()
            .filter(|w| w.doctor_id == doctor_id)
            .cloned()
            .collect();
        windows.sort_by_key(|w| (w.day_of_week, w.start_time));
        Ok(windows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AvailabilityWindow>, DoctorError> {
        Ok(self.windows.read().await.get(&id).cloned())
    }

    async fn add(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DoctorError> {
        let mut windows = self.windows.write().await;
        let existing: Vec<AvailabilityWindow> = windows
            .values()
            .filter(|w| w.doctor_id == window.doctor_id)
            .cloned()
            .collect();
        ensure_no_window_overlap(&existing, &window)?;

        windows.insert(window.id, window.clone());
        Ok(window)
    }

    async fn update(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DoctorError> {
        let mut windows = self.windows.write().await;
        if !windows.contains_key(&window.id) {
            return Err(DoctorError::WindowNotFound);
        }

        let existing: Vec<AvailabilityWindow> = windows
            .values()
            .filter(|w| w.doctor_id == window.doctor_id)
            .cloned()
            .collect();
        ensure_no_window_overlap(&existing, &window)?;

        windows.insert(window.id, window.clone());
        Ok(window)
    }

    async fn remove(&self, id: Uuid) -> Result<(), DoctorError> {
        match self.windows.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DoctorError::WindowNotFound),
        }
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn list_active_for_doctor_on_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut active: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.date == date && a.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|a| a.start_time);
        Ok(active)
    }

    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        debug!("Storing appointment {}", appointment.id);
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.get_mut(&id).ok_or(AppointmentError::NotFound)?;

        // Completed and cancelled rows are immutable at the storage layer
        // too, so no caller can sidestep the lifecycle checks.
        if appointment.status.is_terminal() {
            return Err(AppointmentError::Closed);
        }

        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn update_schedule(
        &self,
        id: Uuid,
        change: ScheduleChange,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.get_mut(&id).ok_or(AppointmentError::NotFound)?;

        if appointment.status.is_terminal() {
            return Err(AppointmentError::Closed);
        }

        appointment.date = change.date;
        appointment.start_time = change.start_time;
        appointment.end_time = change.end_time;
        if let Some(appointment_type) = change.appointment_type {
            appointment.appointment_type = appointment_type;
        }
        if let Some(reason) = change.reason {
            appointment.reason = Some(reason);
        }
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn search(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let mut matched: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| {
                filter.patient_id.is_none_or(|id| a.patient_id == id)
                    && filter.doctor_id.is_none_or(|id| a.doctor_id == id)
                    && filter.status.is_none_or(|s| a.status == s)
                    && filter.date.is_none_or(|d| a.date == d)
            })
            .cloned()
            .collect();

        // Newest day first, chronological within the day.
        matched.sort_by(|a, b| b.date.cmp(&a.date).then(a.start_time.cmp(&b.start_time)));
        Ok(matched)
    }
}
