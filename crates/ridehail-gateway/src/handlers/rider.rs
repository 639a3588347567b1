//! Rider endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/rider/rides` | Request a ride |
//! | `GET` | `/api/rider/rides/history` | The rider's rides, newest first |
//! | `GET` | `/api/rider/rides/{id}` | One of the rider's rides |
//! | `DELETE` | `/api/rider/rides/{id}` | Cancel a pending ride |
//! | `GET` | `/api/rider/notifications` | The rider's notifications |
//! | `GET` | `/api/rider/profile` | The rider's account and ride totals |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use ridehail_db::{NotificationStore, PageRequest, RideStore, RiderStore};
use ridehail_types::{Place, RideId, RideStatus, RiderProfile};
use serde::Serialize;
use tracing::debug;

use super::{ok, parse_ride_id, ride_not_found};
use crate::error::GatewayError;
use crate::identity::RiderIdentity;
use crate::payload::{PageQuery, QueryParams, RequestRidePayload, ValidatedJson};
use crate::state::AppState;

/// Default page size for the rider's listings.
const DEFAULT_PAGE: i64 = 20;

/// Body returned after a cancellation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CancelledRide {
    /// The ride.
    pub id: RideId,
    /// Always `cancelled`.
    pub status: RideStatus,
}

/// `POST /api/rider/rides`
pub async fn request_ride(
    State(state): State<Arc<AppState>>,
    RiderIdentity(rider_id): RiderIdentity,
    ValidatedJson(payload): ValidatedJson<RequestRidePayload>,
) -> Result<impl IntoResponse, GatewayError> {
    let ride = state
        .engine
        .request_ride(
            rider_id,
            payload.pickup.map(Place::from),
            payload.destination.map(Place::from),
        )
        .await?;
    Ok((StatusCode::CREATED, ok(ride)))
}

/// `GET /api/rider/rides/history`
pub async fn ride_history(
    State(state): State<Arc<AppState>>,
    RiderIdentity(rider_id): RiderIdentity,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let page = PageRequest::clamped(query.limit, query.offset, DEFAULT_PAGE);
    let rides = RideStore::new(state.pool().pool())
        .history_for_rider(rider_id, page)
        .await?;
    Ok(ok(rides))
}

/// `GET /api/rider/rides/{id}`
pub async fn ride_status(
    State(state): State<Arc<AppState>>,
    RiderIdentity(rider_id): RiderIdentity,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let ride_id = parse_ride_id(&id_str)?;
    let ride = RideStore::new(state.pool().pool())
        .get_for_rider(ride_id, rider_id)
        .await?
        .ok_or_else(|| ride_not_found(ride_id))?;
    Ok(ok(ride))
}

/// `DELETE /api/rider/rides/{id}`
pub async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    RiderIdentity(rider_id): RiderIdentity,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let ride_id = parse_ride_id(&id_str)?;
    let ride = state.engine.cancel_ride(rider_id, ride_id).await?;
    debug!(%ride_id, "cancellation acknowledged");
    Ok(ok(CancelledRide {
        id: ride.id,
        status: ride.status,
    }))
}

/// `GET /api/rider/notifications`
pub async fn notifications(
    State(state): State<Arc<AppState>>,
    RiderIdentity(rider_id): RiderIdentity,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let page = PageRequest::clamped(query.limit, query.offset, DEFAULT_PAGE);
    let notes = NotificationStore::new(state.pool().pool().clone())
        .list_for_rider(rider_id, page)
        .await?;
    Ok(ok(notes))
}

/// `GET /api/rider/profile`
pub async fn profile(
    State(state): State<Arc<AppState>>,
    RiderIdentity(rider_id): RiderIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let pool = state.pool().pool();
    let rider = RiderStore::new(pool)
        .get(rider_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("rider {rider_id} not found")))?;
    let stats = RideStore::new(pool).stats_for_rider(rider_id).await?;
    Ok(ok(RiderProfile { rider, stats }))
}
