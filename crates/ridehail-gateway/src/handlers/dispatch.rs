//! Dispatcher endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/dispatch/rides/pending` | Rides waiting for a driver, oldest first |
//! | `GET` | `/api/dispatch/rides/live` | Assigned and in-progress rides |
//! | `GET` | `/api/dispatch/rides` | All rides, filtered and paged |
//! | `GET` | `/api/dispatch/rides/{id}` | One ride |
//! | `GET` | `/api/dispatch/drivers/available` | Drivers free for assignment |
//! | `GET` | `/api/dispatch/drivers/performance` | Per-driver ride and earnings report |
//! | `POST` | `/api/dispatch/rides/{id}/assign` | Bind a driver to a pending ride |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use ridehail_db::{DriverStore, PageRequest, PerformanceFilter, RideFilter, RideStore};
use ridehail_types::DriverId;

use super::{check_window, ok, parse_ride_id, ride_not_found};
use crate::error::GatewayError;
use crate::identity::DispatcherIdentity;
use crate::payload::{
    AssignDriverPayload, PerformanceQuery, QueryParams, RideListQuery, ValidatedJson,
};
use crate::state::AppState;

/// Default page size for the full ride listing.
const DEFAULT_PAGE: i64 = 50;

/// `GET /api/dispatch/rides/pending`
pub async fn pending_rides(
    State(state): State<Arc<AppState>>,
    DispatcherIdentity(_): DispatcherIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let rides = RideStore::new(state.pool().pool()).list_pending().await?;
    Ok(ok(rides))
}

/// `GET /api/dispatch/rides/live`
pub async fn live_rides(
    State(state): State<Arc<AppState>>,
    DispatcherIdentity(_): DispatcherIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let rides = RideStore::new(state.pool().pool()).list_live().await?;
    Ok(ok(rides))
}

/// `GET /api/dispatch/rides?status=&from=&to=&limit=&offset=`
pub async fn list_rides(
    State(state): State<Arc<AppState>>,
    DispatcherIdentity(_): DispatcherIdentity,
    QueryParams(query): QueryParams<RideListQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    check_window(query.from, query.to)?;

    let filter = RideFilter {
        status: query.status,
        requested_from: query.from,
        requested_to: query.to,
    };
    let page = PageRequest::clamped(query.limit, query.offset, DEFAULT_PAGE);
    let rides = RideStore::new(state.pool().pool())
        .list(&filter, page)
        .await?;
    Ok(ok(rides))
}

/// `GET /api/dispatch/rides/{id}`
pub async fn ride_details(
    State(state): State<Arc<AppState>>,
    DispatcherIdentity(_): DispatcherIdentity,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let ride_id = parse_ride_id(&id_str)?;
    let ride = RideStore::new(state.pool().pool())
        .get(ride_id)
        .await?
        .ok_or_else(|| ride_not_found(ride_id))?;
    Ok(ok(ride))
}

/// `GET /api/dispatch/drivers/available`
pub async fn available_drivers(
    State(state): State<Arc<AppState>>,
    DispatcherIdentity(_): DispatcherIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let drivers = DriverStore::new(state.pool().pool())
        .list_available()
        .await?;
    Ok(ok(drivers))
}

/// `GET /api/dispatch/drivers/performance?driver_id=&from=&to=`
pub async fn driver_performance(
    State(state): State<Arc<AppState>>,
    DispatcherIdentity(_): DispatcherIdentity,
    QueryParams(query): QueryParams<PerformanceQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    check_window(query.from, query.to)?;

    let filter = PerformanceFilter {
        driver_id: query.driver_id.map(DriverId::from),
        ended_from: query.from,
        ended_to: query.to,
    };
    let report = RideStore::new(state.pool().pool())
        .driver_performance(&filter)
        .await?;
    Ok(ok(report))
}

/// `POST /api/dispatch/rides/{id}/assign`
pub async fn assign_driver(
    State(state): State<Arc<AppState>>,
    DispatcherIdentity(dispatcher_id): DispatcherIdentity,
    Path(id_str): Path<String>,
    ValidatedJson(payload): ValidatedJson<AssignDriverPayload>,
) -> Result<impl IntoResponse, GatewayError> {
    let ride_id = parse_ride_id(&id_str)?;
    let ride = state
        .engine
        .assign_driver(dispatcher_id, ride_id, DriverId::from(payload.driver_id))
        .await?;
    Ok(ok(ride))
}
