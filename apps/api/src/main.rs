use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::booking::BookingService;
use appointment_cell::services::slots::SlotGenerator;
use appointment_cell::AppointmentCellState;
use doctor_cell::repository::{AvailabilityRepository, DoctorRepository};
use doctor_cell::services::availability::AvailabilityService;
use doctor_cell::DoctorCellState;
use notification_cell::{LogSink, NotificationDispatcher, NotificationSink, RetryPolicy, WebhookSink};
use shared_config::AppConfig;
use shared_database::MemoryStore;

const REMINDER_SCAN_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic booking API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // One store instance shared by every repository trait.
    let store = Arc::new(MemoryStore::new());
    let doctors: Arc<dyn DoctorRepository> = store.clone();
    let availability: Arc<dyn AvailabilityRepository> = store.clone();

    // Notification events go to the configured webhook, or into the logs.
    let sink: Arc<dyn NotificationSink> = if config.has_notification_webhook() {
        Arc::new(WebhookSink::new(config.notification_webhook_url.clone()))
    } else {
        Arc::new(LogSink)
    };
    let dispatcher = NotificationDispatcher::spawn(sink, RetryPolicy::default());

    let doctor_state = Arc::new(DoctorCellState {
        availability: AvailabilityService::new(availability.clone(), doctors.clone()),
        doctors: doctors.clone(),
        config: config.clone(),
    });

    let appointment_state = Arc::new(AppointmentCellState {
        booking: BookingService::new(store.clone(), doctors.clone(), dispatcher),
        slots: SlotGenerator::new(doctors, availability, store.clone()),
        config: config.clone(),
    });

    spawn_reminder_scanner(appointment_state.clone());

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(doctor_state, appointment_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.bind_port)
        .parse()
        .unwrap();
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Periodic reminder sweep; each pass publishes reminders whose lead time
/// elapsed since the previous pass.
fn spawn_reminder_scanner(state: Arc<AppointmentCellState>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REMINDER_SCAN_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = state
                .booking
                .emit_due_reminders(Utc::now(), REMINDER_SCAN_INTERVAL)
                .await
            {
                warn!("Reminder scan failed: {}", e);
            }
        }
    });
}
