//! Request payloads and the extractors that parse them.
//!
//! Axum's stock `Json` and `Query` rejections render plain-text bodies.
//! [`ValidatedJson`] and [`QueryParams`] convert them into
//! [`GatewayError::InvalidRequest`] so every failure keeps the JSON error
//! envelope, and [`ValidatedJson`] also runs the payload's `validator`
//! rules before the handler sees it.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use ridehail_types::{Coordinates, EarningsPeriod, Place, RideStatus};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::GatewayError;

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| GatewayError::InvalidRequest(errors.to_string()))?;
        Ok(Self(value))
    }
}

/// Query string parsed into `T`.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// A pickup or drop location as sent by a rider's client.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlacePayload {
    /// Street address.
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    /// Latitude in decimal degrees.
    pub latitude: Option<Decimal>,
    /// Longitude in decimal degrees.
    pub longitude: Option<Decimal>,
}

impl From<PlacePayload> for Place {
    /// Coordinates are kept only when both halves are present.
    fn from(payload: PlacePayload) -> Self {
        let coordinates = match (payload.latitude, payload.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Self {
            address: payload.address,
            coordinates,
        }
    }
}

/// Body of `POST /api/rider/rides`.
///
/// `pickup` is optional here so that its absence reaches the engine's
/// validation and is reported like any other malformed request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RequestRidePayload {
    /// Where the driver should collect the rider.
    #[validate(nested)]
    pub pickup: Option<PlacePayload>,
    /// Where the rider is going, if known.
    #[validate(nested)]
    #[serde(alias = "drop")]
    pub destination: Option<PlacePayload>,
}

/// Body of `POST /api/dispatch/rides/{id}/assign`.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct AssignDriverPayload {
    /// The driver to bind to the ride.
    pub driver_id: Uuid,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// `limit` / `offset` pagination parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// Page size, clamped to the store's bounds.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

/// Query parameters for `GET /api/dispatch/rides`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RideListQuery {
    /// Only rides in this status.
    pub status: Option<RideStatus>,
    /// Only rides requested at or after this RFC 3339 instant.
    pub from: Option<DateTime<Utc>>,
    /// Only rides requested at or before this RFC 3339 instant.
    pub to: Option<DateTime<Utc>>,
    /// Page size.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

/// Query parameters for the driver's earnings and history endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PeriodQuery {
    /// Reporting window; earnings default to `daily`, history to no window.
    pub period: Option<EarningsPeriod>,
    /// Reference date inside the window; defaults to today (UTC).
    pub date: Option<NaiveDate>,
    /// Page size (history only).
    pub limit: Option<i64>,
    /// Rows to skip (history only).
    pub offset: Option<i64>,
}

/// Query parameters for `GET /api/dispatch/drivers/performance`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PerformanceQuery {
    /// Only this driver.
    pub driver_id: Option<Uuid>,
    /// Only rides ended at or after this RFC 3339 instant.
    #[serde(alias = "start_date")]
    pub from: Option<DateTime<Utc>>,
    /// Only rides ended at or before this RFC 3339 instant.
    #[serde(alias = "end_date")]
    pub to: Option<DateTime<Utc>>,
}
