//! Caller identity extractors.
//!
//! Authentication happens upstream; the authenticator forwards the caller's
//! id in a role-specific header. A handler that takes one of these
//! extractors rejects requests without a well-formed id with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ridehail_types::{DispatcherId, DriverId, RiderId};
use uuid::Uuid;

use crate::error::GatewayError;

/// Header carrying the authenticated rider's id.
pub const RIDER_HEADER: &str = "x-rider-id";
/// Header carrying the authenticated driver's id.
pub const DRIVER_HEADER: &str = "x-driver-id";
/// Header carrying the authenticated dispatcher's id.
pub const DISPATCHER_HEADER: &str = "x-dispatcher-id";

fn header_uuid(parts: &Parts, header: &str) -> Result<Uuid, GatewayError> {
    let value = parts
        .headers
        .get(header)
        .ok_or_else(|| GatewayError::Unauthorized(format!("missing {header} header")))?;
    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| GatewayError::Unauthorized(format!("malformed {header} header")))
}

macro_rules! identity_extractor {
    ($(#[$meta:meta])* $name:ident, $id:ty, $header:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub $id);

        impl<S: Send + Sync> FromRequestParts<S> for $name {
            type Rejection = GatewayError;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                header_uuid(parts, $header).map(|id| Self(<$id>::from(id)))
            }
        }
    };
}

identity_extractor!(
    /// The authenticated rider, from [`RIDER_HEADER`].
    RiderIdentity,
    RiderId,
    RIDER_HEADER
);
identity_extractor!(
    /// The authenticated driver, from [`DRIVER_HEADER`].
    DriverIdentity,
    DriverId,
    DRIVER_HEADER
);
identity_extractor!(
    /// The authenticated dispatcher, from [`DISPATCHER_HEADER`].
    DispatcherIdentity,
    DispatcherId,
    DISPATCHER_HEADER
);
