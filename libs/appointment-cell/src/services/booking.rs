use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::repository::DoctorRepository;
use notification_cell::models::{NotificationEvent, ReminderKind};
use notification_cell::services::dispatcher::NotificationDispatcher;
use shared_models::auth::User;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentListQuery, AppointmentStatus,
    BookAppointmentRequest, ScheduleChange, UpdateAppointmentRequest,
};
use crate::repository::AppointmentRepository;
use crate::services::conflict::ConflictChecker;
use crate::services::lifecycle::AppointmentLifecycle;
use crate::services::locks::DoctorLocks;

const MAX_REASON_LENGTH: usize = 500;

/// Booking orchestrator: validation, conflict detection, lifecycle
/// enforcement and event emission around the appointment repository.
pub struct BookingService {
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
    conflicts: ConflictChecker,
    lifecycle: AppointmentLifecycle,
    notifier: NotificationDispatcher,
    locks: DoctorLocks,
}

impl BookingService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        doctors: Arc<dyn DoctorRepository>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            conflicts: ConflictChecker::new(appointments.clone()),
            appointments,
            doctors,
            lifecycle: AppointmentLifecycle::new(),
            notifier,
            locks: DoctorLocks::new(),
        }
    }

    /// Books an appointment for the requested slot. Secretary-created
    /// bookings skip the confirmation step and start out confirmed.
    pub async fn book(
        &self,
        created_by: &User,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking request: patient {} with doctor {} on {} at {}",
            request.patient_id, request.doctor_id, request.date, request.start_time
        );

        if self.doctors.get(request.doctor_id).await?.is_none() {
            return Err(AppointmentError::DoctorNotFound);
        }

        let range = validate_schedule(
            request.date,
            request.start_time,
            request.end_time,
            request.reason.as_deref(),
        )?;

        let status = if created_by.is_secretary() {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Scheduled
        };

        // Hold the doctor's lock across check-then-create so two requests
        // for the same slot cannot both pass the conflict check.
        let lock = self.locks.for_doctor(request.doctor_id);
        let _guard = lock.lock().await;

        if self
            .conflicts
            .has_conflict(request.doctor_id, request.date, range, None)
            .await?
        {
            return Err(AppointmentError::SlotUnavailable);
        }

        let now = Utc::now();
        let appointment = self
            .appointments
            .create(Appointment {
                id: Uuid::new_v4(),
                patient_id: request.patient_id,
                doctor_id: request.doctor_id,
                date: request.date,
                start_time: request.start_time,
                end_time: request.end_time,
                status,
                appointment_type: request.appointment_type,
                reason: request.reason,
                notes: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            "Appointment {} booked ({}) for patient {} with doctor {}",
            appointment.id, appointment.status, appointment.patient_id, appointment.doctor_id
        );

        self.notifier.publish(NotificationEvent::AppointmentCreated {
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
        });

        Ok(appointment)
    }

    pub async fn get(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .get(id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Partial reschedule. Unsupplied fields keep their current values; the
    /// merged schedule is re-validated and re-checked for conflicts, with
    /// the appointment's own interval excluded.
    pub async fn reschedule(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get(id).await?;
        if current.status.is_terminal() {
            warn!("Reschedule attempted on closed appointment {}", id);
            return Err(AppointmentError::Closed);
        }

        let date = request.date.unwrap_or(current.date);
        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        let reason = request.reason.clone().or_else(|| current.reason.clone());

        let range = validate_schedule(date, start_time, end_time, reason.as_deref())?;

        let lock = self.locks.for_doctor(current.doctor_id);
        let _guard = lock.lock().await;

        if self
            .conflicts
            .has_conflict(current.doctor_id, date, range, Some(id))
            .await?
        {
            return Err(AppointmentError::SlotUnavailable);
        }

        let updated = self
            .appointments
            .update_schedule(
                id,
                ScheduleChange {
                    date,
                    start_time,
                    end_time,
                    appointment_type: request.appointment_type,
                    reason: request.reason,
                },
            )
            .await?;

        info!(
            "Appointment {} rescheduled to {} {}-{}",
            id, updated.date, updated.start_time, updated.end_time
        );
        Ok(updated)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let current = self.get(id).await?;
        self.lifecycle
            .validate_transition(current.status, AppointmentStatus::Cancelled)?;

        let cancelled = self
            .appointments
            .update_status(id, AppointmentStatus::Cancelled)
            .await?;

        info!("Appointment {} cancelled", id);
        self.notifier.publish(NotificationEvent::AppointmentCancelled {
            appointment_id: cancelled.id,
            patient_id: cancelled.patient_id,
            doctor_id: cancelled.doctor_id,
        });

        Ok(cancelled)
    }

    pub async fn change_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get(id).await?;
        self.lifecycle.validate_transition(current.status, status)?;

        let updated = self.appointments.update_status(id, status).await?;
        info!("Appointment {} moved {} -> {}", id, current.status, status);

        match status {
            AppointmentStatus::Confirmed => {
                self.notifier.publish(NotificationEvent::AppointmentConfirmed {
                    appointment_id: updated.id,
                    patient_id: updated.patient_id,
                    doctor_id: updated.doctor_id,
                });
            }
            AppointmentStatus::Cancelled => {
                self.notifier.publish(NotificationEvent::AppointmentCancelled {
                    appointment_id: updated.id,
                    patient_id: updated.patient_id,
                    doctor_id: updated.doctor_id,
                });
            }
            _ => {}
        }

        Ok(updated)
    }

    /// Role-scoped listing: patients see their own appointments, doctors
    /// their own schedule, secretaries and admins everything (optionally
    /// narrowed by the query filters).
    pub async fn list(
        &self,
        user: &User,
        query: AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut filter = AppointmentFilter {
            status: query.status,
            date: query.date,
            ..AppointmentFilter::default()
        };

        if user.is_patient() {
            filter.patient_id = Some(parse_user_id(user)?);
        } else if user.is_doctor() {
            filter.doctor_id = Some(parse_user_id(user)?);
        } else {
            filter.doctor_id = query.doctor_id;
        }

        self.appointments.search(filter).await
    }

    /// Publishes reminder events for appointments whose lead time elapsed
    /// within the last `scan_interval`. Called periodically; the interval
    /// window keeps each reminder from firing more than once.
    pub async fn emit_due_reminders(
        &self,
        now: DateTime<Utc>,
        scan_interval: StdDuration,
    ) -> Result<usize, AppointmentError> {
        let now = now.naive_utc();
        let window = Duration::from_std(scan_interval)
            .map_err(|e| AppointmentError::Validation(e.to_string()))?;
        let mut emitted = 0;

        for kind in ReminderKind::ALL {
            let lead = Duration::minutes(kind.lead_minutes());

            // The due window can straddle midnight, in which case the
            // matching appointments sit on two calendar dates.
            let mut target_dates = vec![(now + lead).date()];
            let window_start_date = (now + lead - window).date();
            if window_start_date != target_dates[0] {
                target_dates.push(window_start_date);
            }

            for target_date in target_dates {
                let appointments = self
                    .appointments
                    .search(AppointmentFilter {
                        date: Some(target_date),
                        ..AppointmentFilter::default()
                    })
                    .await?;

                for apt in appointments.iter().filter(|a| a.is_active()) {
                    let due_at = apt.date.and_time(apt.start_time) - lead;
                    if due_at <= now && due_at > now - window {
                        debug!("Reminder ({:?}) due for appointment {}", kind, apt.id);
                        self.notifier.publish(NotificationEvent::AppointmentReminder {
                            appointment_id: apt.id,
                            patient_id: apt.patient_id,
                            doctor_id: apt.doctor_id,
                            reminder: kind,
                        });
                        emitted += 1;
                    }
                }
            }
        }

        Ok(emitted)
    }
}

fn parse_user_id(user: &User) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppointmentError::Validation("Invalid user id in token".to_string()))
}

/// Shared schedule validation for booking and reschedule.
fn validate_schedule(
    date: chrono::NaiveDate,
    start_time: chrono::NaiveTime,
    end_time: chrono::NaiveTime,
    reason: Option<&str>,
) -> Result<shared_models::time::TimeRange, AppointmentError> {
    let range = shared_models::time::TimeRange::new(start_time, end_time)
        .map_err(|e| AppointmentError::InvalidTime(e.to_string()))?;

    if date < Utc::now().date_naive() {
        return Err(AppointmentError::Validation(
            "Appointment date must be today or in the future".to_string(),
        ));
    }

    if reason.is_some_and(|r| r.chars().count() > MAX_REASON_LENGTH) {
        return Err(AppointmentError::Validation(format!(
            "Reason must not exceed {} characters",
            MAX_REASON_LENGTH
        )));
    }

    Ok(range)
}
