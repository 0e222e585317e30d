use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentType,
};
use appointment_cell::repository::AppointmentRepository;
use appointment_cell::services::slots::SlotGenerator;
use doctor_cell::models::{AvailabilityWindow, Doctor};
use doctor_cell::repository::{AvailabilityRepository, DoctorRepository};
use shared_database::MemoryStore;

struct Fixture {
    store: Arc<MemoryStore>,
    generator: SlotGenerator,
    doctor_id: Uuid,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let doctor_id = Uuid::new_v4();

    DoctorRepository::insert(
        store.as_ref(),
        Doctor {
            id: doctor_id,
            first_name: "Ada".to_string(),
            last_name: "Okafor".to_string(),
            specialty: Some("Cardiology".to_string()),
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let generator = SlotGenerator::new(store.clone(), store.clone(), store.clone());
    Fixture {
        store,
        generator,
        doctor_id,
    }
}

impl Fixture {
    async fn add_window(&self, day: u8, start: &str, end: &str) {
        AvailabilityRepository::add(
            self.store.as_ref(),
            AvailabilityWindow {
                id: Uuid::new_v4(),
                doctor_id: self.doctor_id,
                day_of_week: day,
                start_time: parse_time(start),
                end_time: parse_time(end),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    }

    async fn add_appointment(&self, date: NaiveDate, start: &str, end: &str, status: AppointmentStatus) {
        AppointmentRepository::create(
            self.store.as_ref(),
            Appointment {
                id: Uuid::new_v4(),
                patient_id: Uuid::new_v4(),
                doctor_id: self.doctor_id,
                date,
                start_time: parse_time(start),
                end_time: parse_time(end),
                status,
                appointment_type: AppointmentType::Consultation,
                reason: None,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    }
}

fn parse_time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}

/// First Monday strictly in the future, so booking-date validation never
/// interferes.
fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Days::new(1);
    while date.weekday() != Weekday::Mon {
        date = date + Days::new(1);
    }
    date
}

#[tokio::test]
async fn four_hour_window_yields_eight_half_hour_slots() {
    let fx = fixture().await;
    fx.add_window(1, "08:00", "12:00").await;

    let slots = fx
        .generator
        .generate_slots(fx.doctor_id, next_monday(), None)
        .await
        .unwrap();

    assert_eq!(slots.len(), 8);
    assert_eq!(slots[0].start_time, parse_time("08:00"));
    assert_eq!(slots[7].end_time, parse_time("12:00"));
    assert!(slots.iter().all(|s| s.available));
}

#[tokio::test]
async fn partial_slot_at_window_end_is_not_emitted() {
    let fx = fixture().await;
    fx.add_window(1, "09:00", "09:50").await;

    let slots = fx
        .generator
        .generate_slots(fx.doctor_id, next_monday(), Some(30))
        .await
        .unwrap();

    // 09:30-09:50 is only twenty minutes, so just one slot fits.
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start_time, parse_time("09:00"));
    assert_eq!(slots[0].end_time, parse_time("09:30"));
}

#[tokio::test]
async fn booked_slot_is_flagged_unavailable() {
    let fx = fixture().await;
    fx.add_window(1, "09:00", "11:00").await;

    let date = next_monday();
    fx.add_appointment(date, "09:30", "10:00", AppointmentStatus::Confirmed)
        .await;

    let slots = fx
        .generator
        .generate_slots(fx.doctor_id, date, None)
        .await
        .unwrap();

    assert_eq!(slots.len(), 4);
    let flags: Vec<bool> = slots.iter().map(|s| s.available).collect();
    assert_eq!(flags, vec![true, false, true, true]);
}

#[tokio::test]
async fn cancelled_appointment_frees_its_slot() {
    let fx = fixture().await;
    fx.add_window(1, "09:00", "10:00").await;

    let date = next_monday();
    fx.add_appointment(date, "09:00", "09:30", AppointmentStatus::Cancelled)
        .await;

    let slots = fx
        .generator
        .generate_slots(fx.doctor_id, date, None)
        .await
        .unwrap();

    assert!(slots.iter().all(|s| s.available));
}

#[tokio::test]
async fn day_without_windows_yields_no_slots() {
    let fx = fixture().await;
    // Monday only; ask for the following Tuesday.
    fx.add_window(1, "08:00", "12:00").await;

    let slots = fx
        .generator
        .generate_slots(fx.doctor_id, next_monday() + Days::new(1), None)
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn multiple_windows_are_walked_in_order() {
    let fx = fixture().await;
    fx.add_window(1, "14:00", "15:00").await;
    fx.add_window(1, "09:00", "10:00").await;

    let slots = fx
        .generator
        .generate_slots(fx.doctor_id, next_monday(), Some(60))
        .await
        .unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].start_time, parse_time("09:00"));
    assert_eq!(slots[1].start_time, parse_time("14:00"));
}

#[tokio::test]
async fn out_of_range_duration_is_rejected() {
    let fx = fixture().await;
    fx.add_window(1, "08:00", "12:00").await;

    for duration in [10, 121] {
        assert_matches!(
            fx.generator
                .generate_slots(fx.doctor_id, next_monday(), Some(duration))
                .await,
            Err(AppointmentError::Validation(_))
        );
    }
}

#[tokio::test]
async fn unknown_doctor_is_an_error() {
    let fx = fixture().await;

    assert_matches!(
        fx.generator
            .generate_slots(Uuid::new_v4(), next_monday(), None)
            .await,
        Err(AppointmentError::DoctorNotFound)
    );
}
