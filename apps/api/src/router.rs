use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentCellState;
use doctor_cell::router::doctor_routes;
use doctor_cell::DoctorCellState;

pub fn create_router(
    doctor_state: Arc<DoctorCellState>,
    appointment_state: Arc<AppointmentCellState>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
}
