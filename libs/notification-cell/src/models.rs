use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain events emitted by the booking orchestrator. Fan-out to email, SMS
/// and push, along with per-user notification preferences, is entirely the
/// downstream collaborator's responsibility; events carry only the ids it
/// needs to do its job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    #[serde(rename = "appointment.created")]
    AppointmentCreated {
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
    },
    #[serde(rename = "appointment.confirmed")]
    AppointmentConfirmed {
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
    },
    #[serde(rename = "appointment.cancelled")]
    AppointmentCancelled {
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
    },
    #[serde(rename = "appointment.reminder")]
    AppointmentReminder {
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        reminder: ReminderKind,
    },
}

impl NotificationEvent {
    pub fn appointment_id(&self) -> Uuid {
        match self {
            NotificationEvent::AppointmentCreated { appointment_id, .. }
            | NotificationEvent::AppointmentConfirmed { appointment_id, .. }
            | NotificationEvent::AppointmentCancelled { appointment_id, .. }
            | NotificationEvent::AppointmentReminder { appointment_id, .. } => *appointment_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::AppointmentCreated { .. } => "appointment.created",
            NotificationEvent::AppointmentConfirmed { .. } => "appointment.confirmed",
            NotificationEvent::AppointmentCancelled { .. } => "appointment.cancelled",
            NotificationEvent::AppointmentReminder { .. } => "appointment.reminder",
        }
    }
}

/// How far ahead of the appointment a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderKind {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "48h")]
    TwoDays,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 3] =
        [ReminderKind::OneHour, ReminderKind::OneDay, ReminderKind::TwoDays];

    pub fn lead_minutes(&self) -> i64 {
        match self {
            ReminderKind::OneHour => 60,
            ReminderKind::OneDay => 24 * 60,
            ReminderKind::TwoDays => 48 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_dotted_type_tag() {
        let event = NotificationEvent::AppointmentCreated {
            appointment_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            doctor_id: Uuid::nil(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "appointment.created");
    }

    #[test]
    fn reminder_kind_uses_short_labels() {
        let event = NotificationEvent::AppointmentReminder {
            appointment_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            doctor_id: Uuid::nil(),
            reminder: ReminderKind::OneDay,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reminder"], "24h");
    }
}
