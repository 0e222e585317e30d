pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;

use crate::repository::DoctorRepository;
use crate::services::availability::AvailabilityService;

/// Shared state for the doctor cell routes.
pub struct DoctorCellState {
    pub availability: AvailabilityService,
    pub doctors: Arc<dyn DoctorRepository>,
    pub config: Arc<AppConfig>,
}
