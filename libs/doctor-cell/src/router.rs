use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::DoctorCellState;

pub fn doctor_routes(state: Arc<DoctorCellState>) -> Router {
    // Directory and availability listings are public so patients can browse
    // doctors before authenticating.
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route(
            "/{doctor_id}/availabilities",
            get(handlers::list_doctor_availabilities),
        );

    // Window management requires an authenticated doctor.
    let protected_routes = Router::new()
        .route("/availabilities", post(handlers::create_availability))
        .route("/availabilities/{availability_id}", put(handlers::update_availability))
        .route("/availabilities/{availability_id}", delete(handlers::delete_availability))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
