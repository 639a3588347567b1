//! REST endpoint handlers, grouped by caller role.
//!
//! Transition endpoints go through the [`RideEngine`](ridehail_engine::RideEngine);
//! listings read the store directly through the engine's pool. Every
//! success is wrapped as `{ "success": true, "data": ... }`.

pub mod dispatch;
pub mod driver;
pub mod rider;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use ridehail_types::RideId;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::state::AppState;

/// Success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// The payload.
    pub data: T,
}

/// Wrap `data` in the success envelope.
pub const fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

/// Parse a ride id path segment.
fn parse_ride_id(id_str: &str) -> Result<RideId, GatewayError> {
    Uuid::parse_str(id_str)
        .map(RideId::from)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid ride id '{id_str}': {e}")))
}

fn ride_not_found(ride_id: RideId) -> GatewayError {
    GatewayError::NotFound(format!("ride {ride_id} not found"))
}

fn check_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<(), GatewayError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(GatewayError::InvalidRequest(
            "'from' must not be after 'to'".to_owned(),
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Pool occupancy reported by the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolHealth {
    /// Open connections.
    pub size: u32,
    /// Idle connections.
    pub idle: u32,
    /// Checked-out connections.
    pub in_use: u32,
    /// Configured ceiling.
    pub max_connections: u32,
}

/// Body of a healthy `/health` response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Health {
    /// `"ok"`.
    pub status: &'static str,
    /// `"up"`.
    pub database: &'static str,
    /// Pool occupancy.
    pub pool: PoolHealth,
}

/// Liveness plus database reachability.
///
/// Returns 503 when the database does not answer.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, GatewayError> {
    if let Err(e) = state.pool().ping().await {
        warn!(error = %e, "health check could not reach the database");
        return Err(GatewayError::Unavailable("database unavailable".to_owned()));
    }

    let stats = state.pool().stats();
    let body = Health {
        status: "ok",
        database: "up",
        pool: PoolHealth {
            size: stats.size,
            idle: stats.idle,
            in_use: stats.in_use(),
            max_connections: stats.max_connections,
        },
    };
    Ok((StatusCode::OK, ok(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ride_id_parsing() {
        let id = Uuid::now_v7();
        assert_eq!(parse_ride_id(&id.to_string()).unwrap(), RideId(id));
        assert!(matches!(
            parse_ride_id("ride-1"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn window_bounds_must_be_ordered() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::hours(1);
        assert!(check_window(Some(earlier), Some(later)).is_ok());
        assert!(check_window(Some(earlier), None).is_ok());
        assert!(check_window(Some(later), Some(earlier)).is_err());
    }
}
