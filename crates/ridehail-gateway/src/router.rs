//! Axum router construction for the role gateways.
//!
//! Assembles the rider, driver and dispatcher routes plus `/health` into a
//! single [`Router`] with CORS and request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, dispatch, driver, rider};
use crate::state::AppState;

/// Build the complete Axum router.
///
/// Literal segments such as `/history` are matched before the `{id}`
/// capture that shares their prefix.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Rider
        .route("/api/rider/rides", post(rider::request_ride))
        .route("/api/rider/rides/history", get(rider::ride_history))
        .route(
            "/api/rider/rides/{id}",
            get(rider::ride_status).delete(rider::cancel_ride),
        )
        .route("/api/rider/notifications", get(rider::notifications))
        .route("/api/rider/profile", get(rider::profile))
        // Driver
        .route("/api/driver/rides/assigned", get(driver::assigned_rides))
        .route("/api/driver/rides/history", get(driver::ride_history))
        .route("/api/driver/rides/{id}/start", post(driver::start_ride))
        .route("/api/driver/rides/{id}/end", post(driver::end_ride))
        .route("/api/driver/earnings", get(driver::earnings))
        .route("/api/driver/profile", get(driver::profile))
        // Dispatcher
        .route("/api/dispatch/rides", get(dispatch::list_rides))
        .route("/api/dispatch/rides/pending", get(dispatch::pending_rides))
        .route("/api/dispatch/rides/live", get(dispatch::live_rides))
        .route("/api/dispatch/rides/{id}", get(dispatch::ride_details))
        .route("/api/dispatch/rides/{id}/assign", post(dispatch::assign_driver))
        .route(
            "/api/dispatch/drivers/available",
            get(dispatch::available_drivers),
        )
        .route(
            "/api/dispatch/drivers/performance",
            get(dispatch::driver_performance),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
