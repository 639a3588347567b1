//! Driver endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/driver/rides/assigned` | The driver's active rides |
//! | `GET` | `/api/driver/rides/history` | Rides the driver has served |
//! | `POST` | `/api/driver/rides/{id}/start` | Start an assigned ride |
//! | `POST` | `/api/driver/rides/{id}/end` | End a ride and bill it |
//! | `GET` | `/api/driver/earnings` | Earnings for a day, week or month |
//! | `GET` | `/api/driver/profile` | The driver's account and ride totals |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use chrono::{DateTime, NaiveDate, Utc};
use ridehail_db::{DriverStore, PageRequest, RideStore};
use ridehail_types::{DriverProfile, EarningsPeriod};

use super::{ok, parse_ride_id};
use crate::error::GatewayError;
use crate::identity::DriverIdentity;
use crate::payload::{PeriodQuery, QueryParams};
use crate::state::AppState;

/// Default page size for the driver's history.
const DEFAULT_PAGE: i64 = 20;

fn period_window(
    period: EarningsPeriod,
    date: Option<NaiveDate>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), GatewayError> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    period
        .window(date)
        .ok_or_else(|| GatewayError::InvalidRequest(format!("date {date} is out of range")))
}

/// `GET /api/driver/rides/assigned`
pub async fn assigned_rides(
    State(state): State<Arc<AppState>>,
    DriverIdentity(driver_id): DriverIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let rides = RideStore::new(state.pool().pool())
        .list_active_for_driver(driver_id)
        .await?;
    Ok(ok(rides))
}

/// `GET /api/driver/rides/history`
///
/// Without `period` the whole history is paged; with it, only rides that
/// ended inside the window containing `date`.
pub async fn ride_history(
    State(state): State<Arc<AppState>>,
    DriverIdentity(driver_id): DriverIdentity,
    QueryParams(query): QueryParams<PeriodQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let window = query
        .period
        .map(|period| period_window(period, query.date))
        .transpose()?;
    let page = PageRequest::clamped(query.limit, query.offset, DEFAULT_PAGE);
    let rides = RideStore::new(state.pool().pool())
        .history_for_driver(driver_id, window, page)
        .await?;
    Ok(ok(rides))
}

/// `POST /api/driver/rides/{id}/start`
pub async fn start_ride(
    State(state): State<Arc<AppState>>,
    DriverIdentity(driver_id): DriverIdentity,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let ride_id = parse_ride_id(&id_str)?;
    let ride = state.engine.start_ride(driver_id, ride_id).await?;
    Ok(ok(ride))
}

/// `POST /api/driver/rides/{id}/end`
pub async fn end_ride(
    State(state): State<Arc<AppState>>,
    DriverIdentity(driver_id): DriverIdentity,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let ride_id = parse_ride_id(&id_str)?;
    let ride = state.engine.end_ride(driver_id, ride_id).await?;
    Ok(ok(ride))
}

/// `GET /api/driver/earnings?period=daily|weekly|monthly&date=YYYY-MM-DD`
pub async fn earnings(
    State(state): State<Arc<AppState>>,
    DriverIdentity(driver_id): DriverIdentity,
    QueryParams(query): QueryParams<PeriodQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let period = query.period.unwrap_or(EarningsPeriod::Daily);
    let (start, end) = period_window(period, query.date)?;
    let summary = RideStore::new(state.pool().pool())
        .driver_earnings(driver_id, start, end)
        .await?;
    Ok(ok(summary))
}

/// `GET /api/driver/profile`
pub async fn profile(
    State(state): State<Arc<AppState>>,
    DriverIdentity(driver_id): DriverIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let pool = state.pool().pool();
    let driver = DriverStore::new(pool)
        .get(driver_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("driver {driver_id} not found")))?;
    let stats = RideStore::new(pool).stats_for_driver(driver_id).await?;
    Ok(ok(DriverProfile { driver, stats }))
}
