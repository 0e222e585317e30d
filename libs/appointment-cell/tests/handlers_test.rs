use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::appointment_routes;
use appointment_cell::services::booking::BookingService;
use appointment_cell::services::slots::SlotGenerator;
use appointment_cell::AppointmentCellState;
use doctor_cell::models::{AvailabilityWindow, Doctor};
use doctor_cell::repository::{AvailabilityRepository, DoctorRepository};
use notification_cell::{MemorySink, NotificationDispatcher, RetryPolicy};
use shared_database::MemoryStore;
use shared_utils::test_utils::{test_config_arc, TestUser, TEST_JWT_SECRET};

struct TestApp {
    app: Router,
    store: Arc<MemoryStore>,
    doctor_id: Uuid,
}

async fn test_app() -> TestApp {
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

    let dispatcher =
        NotificationDispatcher::spawn(Arc::new(MemorySink::new()), RetryPolicy::default());
    let state = Arc::new(AppointmentCellState {
        booking: BookingService::new(store.clone(), store.clone(), dispatcher),
        slots: SlotGenerator::new(store.clone(), store.clone(), store.clone()),
        config: test_config_arc(),
    });

    TestApp {
        app: appointment_routes(state),
        store,
        doctor_id,
    }
}

impl TestApp {
    async fn open_window(&self, date: NaiveDate, start: &str, end: &str) {
        AvailabilityRepository::add(
            self.store.as_ref(),
            AvailabilityWindow {
                id: Uuid::new_v4(),
                doctor_id: self.doctor_id,
                day_of_week: date.weekday().number_from_monday() as u8,
                start_time: start.parse().unwrap(),
                end_time: end.parse().unwrap(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }
}

fn booking_body(patient_id: Uuid, doctor_id: Uuid, date: NaiveDate, start: &str, end: &str) -> Value {
    json!({
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "date": date,
        "start_time": start,
        "end_time": end,
        "type": "consultation",
        "reason": "Routine checkup",
    })
}

fn post_booking(user: &TestUser, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, user.bearer(TEST_JWT_SECRET))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn future_date() -> NaiveDate {
    Utc::now().date_naive() + Days::new(7)
}

#[tokio::test]
async fn available_slots_returns_the_expected_shape() {
    let tx = test_app().await;
    let date = future_date();
    tx.open_window(date, "09:00", "11:00").await;

    let user = TestUser::patient("patient@example.com");
    let request = Request::builder()
        .uri(format!(
            "/available-slots?doctor_id={}&date={}",
            tx.doctor_id, date
        ))
        .header(header::AUTHORIZATION, user.bearer(TEST_JWT_SECRET))
        .body(Body::empty())
        .unwrap();

    let (status, body) = tx.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["doctor_id"], json!(tx.doctor_id));
    assert_eq!(body["data"]["duration"], json!(30));

    let slots = body["data"]["available_slots"].as_array().unwrap();
    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0]["start_time"], json!("09:00"));
    assert_eq!(slots[0]["available"], json!(true));
}

#[tokio::test]
async fn booking_returns_created_with_the_appointment() {
    let tx = test_app().await;
    let user = TestUser::patient("patient@example.com");
    let body = booking_body(user.id, tx.doctor_id, future_date(), "09:00", "09:30");

    let (status, json) = tx.send(post_booking(&user, &body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], serde_json::json!(true));
    assert_eq!(json["data"]["status"], serde_json::json!("scheduled"));
    assert_eq!(json["data"]["start_time"], serde_json::json!("09:00"));
}

#[tokio::test]
async fn double_booking_returns_conflict() {
    let tx = test_app().await;
    let user = TestUser::patient("patient@example.com");
    let body = booking_body(user.id, tx.doctor_id, future_date(), "09:00", "09:30");

    let (status, _) = tx.send(post_booking(&user, &body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = tx.send(post_booking(&user, &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], serde_json::json!(false));
    assert_eq!(json["error_code"], serde_json::json!("SLOT_NOT_AVAILABLE"));
}

#[tokio::test]
async fn cancelling_twice_returns_appointment_closed() {
    let tx = test_app().await;
    let user = TestUser::patient("patient@example.com");
    let body = booking_body(user.id, tx.doctor_id, future_date(), "09:00", "09:30");

    let (_, created) = tx.send(post_booking(&user, &body)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let cancel = |user: &TestUser| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/{}", id))
            .header(header::AUTHORIZATION, user.bearer(TEST_JWT_SECRET))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = tx.send(cancel(&user)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = tx.send(cancel(&user)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], serde_json::json!("APPOINTMENT_CLOSED"));
}

#[tokio::test]
async fn invalid_status_transition_is_unprocessable() {
    let tx = test_app().await;
    let secretary = TestUser::secretary("desk@example.com");
    let body = booking_body(Uuid::new_v4(), tx.doctor_id, future_date(), "09:00", "09:30");

    let (_, created) = tx.send(post_booking(&secretary, &body)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // Secretary bookings start confirmed; completed requires in_progress.
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/{}/status", id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, secretary.bearer(TEST_JWT_SECRET))
        .body(Body::from(json!({"status": "completed"}).to_string()))
        .unwrap();

    let (status, json) = tx.send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_code"], serde_json::json!("INVALID_STATUS_TRANSITION"));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let tx = test_app().await;

    let request = Request::builder()
        .uri(format!(
            "/available-slots?doctor_id={}&date={}",
            tx.doctor_id,
            future_date()
        ))
        .body(Body::empty())
        .unwrap();

    let (status, _) = tx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn patient_cannot_book_for_someone_else() {
    let tx = test_app().await;
    let user = TestUser::patient("patient@example.com");
    let body = booking_body(Uuid::new_v4(), tx.doctor_id, future_date(), "09:00", "09:30");

    let (status, json) = tx.send(post_booking(&user, &body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error_code"], serde_json::json!("FORBIDDEN"));
}

#[tokio::test]
async fn outsider_cannot_read_an_appointment() {
    let tx = test_app().await;
    let owner = TestUser::patient("owner@example.com");
    let body = booking_body(owner.id, tx.doctor_id, future_date(), "09:00", "09:30");

    let (_, created) = tx.send(post_booking(&owner, &body)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let outsider = TestUser::patient("other@example.com");
    let request = Request::builder()
        .uri(format!("/{}", id))
        .header(header::AUTHORIZATION, outsider.bearer(TEST_JWT_SECRET))
        .body(Body::empty())
        .unwrap();

    let (status, _) = tx.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_doctor_maps_to_not_found() {
    let tx = test_app().await;
    let user = TestUser::patient("patient@example.com");
    let body = booking_body(user.id, Uuid::new_v4(), future_date(), "09:00", "09:30");

    let (status, json) = tx.send(post_booking(&user, &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], serde_json::json!("DOCTOR_NOT_FOUND"));
}
