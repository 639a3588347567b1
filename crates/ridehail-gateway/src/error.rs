//! Error types for the role gateways.
//!
//! [`GatewayError`] unifies every failure a handler can produce into a
//! single enum rendered as `{ "success": false, "error", "status" }` by its
//! [`IntoResponse`] implementation. Engine and store faults that indicate a
//! bug or an outage are logged in full and rendered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ridehail_db::DbError;
use ridehail_engine::{ErrorKind, TransitionError};
use tracing::error;

/// Body text for faults whose details must not leave the process.
const INTERNAL_MESSAGE: &str = "internal server error";

/// Errors that can occur in the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Caller identity header is missing or malformed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request body, path or query failed to parse or validate.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested resource does not exist or is not visible to the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// The database is unreachable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A lifecycle transition was refused or failed.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A read-side query failed.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl GatewayError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Transition(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::InvalidTransition | ErrorKind::Conflict => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::DataIntegrity | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "request failed with internal fault");
            INTERNAL_MESSAGE.to_owned()
        } else {
            match &self {
                Self::Unauthorized(msg)
                | Self::InvalidRequest(msg)
                | Self::NotFound(msg)
                | Self::Unavailable(msg) => msg.clone(),
                Self::Transition(e) => e.to_string(),
                Self::Store(e) => e.to_string(),
            }
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use ridehail_engine::Entity;
    use ridehail_types::{RideId, RideStatus};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn transition_kinds_map_to_client_or_server_status() {
        let ride_id = RideId::new();
        let invalid = GatewayError::from(TransitionError::InvalidTransition {
            ride_id,
            from: RideStatus::Completed,
            to: RideStatus::Completed,
        });
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let missing = GatewayError::from(TransitionError::NotFound {
            entity: Entity::Ride,
            id: Uuid::now_v7(),
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let integrity = GatewayError::from(TransitionError::DataIntegrity {
            ride_id,
            reason: "in_progress ride has no started_at".to_owned(),
        });
        assert_eq!(integrity.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_faults_render_generic_body() {
        let response = GatewayError::Store(DbError::Corrupt("bad status".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
