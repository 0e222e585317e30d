use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::{
    MemorySink, NotificationDispatcher, NotificationEvent, NotificationSink, RetryPolicy,
    WebhookSink,
};

fn created_event() -> NotificationEvent {
    NotificationEvent::AppointmentCreated {
        appointment_id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
    }
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within timeout");
}

#[tokio::test]
async fn published_events_reach_the_sink_in_order() {
    let sink = Arc::new(MemorySink::new());
    let dispatcher = NotificationDispatcher::spawn(sink.clone(), fast_retries());

    let first = created_event();
    let second = created_event();
    dispatcher.publish(first.clone());
    dispatcher.publish(second.clone());

    wait_for(|| sink.delivered().len() == 2).await;
    assert_eq!(sink.delivered(), vec![first, second]);
}

#[tokio::test]
async fn webhook_sink_posts_the_event_as_json() {
    let server = MockServer::start().await;
    let event = created_event();

    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_partial_json(serde_json::json!({
            "type": "appointment.created",
            "appointment_id": event.appointment_id(),
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = WebhookSink::new(format!("{}/events", server.uri()));
    sink.deliver(&event).await.unwrap();
}

#[tokio::test]
async fn transient_webhook_failures_are_retried() {
    let server = MockServer::start().await;

    // First two attempts fail, the third succeeds.
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(WebhookSink::new(format!("{}/events", server.uri())));
    let dispatcher = NotificationDispatcher::spawn(sink, fast_retries());
    dispatcher.publish(created_event());

    wait_for_requests(&server, 3).await;
}

#[tokio::test]
async fn delivery_failure_never_surfaces_to_the_publisher() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = Arc::new(WebhookSink::new(format!("{}/events", server.uri())));
    let dispatcher = NotificationDispatcher::spawn(sink, fast_retries());

    // Exhausts every retry; publish itself stays infallible.
    dispatcher.publish(created_event());
    wait_for_requests(&server, 3).await;
}

async fn wait_for_requests(server: &MockServer, count: usize) {
    for _ in 0..200 {
        let received = server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0);
        if received >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("webhook did not receive {} requests within timeout", count);
}
