pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::booking::BookingService;
use crate::services::slots::SlotGenerator;

/// Shared state for the appointment cell routes.
pub struct AppointmentCellState {
    pub booking: BookingService,
    pub slots: SlotGenerator,
    pub config: Arc<AppConfig>,
}
