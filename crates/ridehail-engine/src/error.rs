//! Transition error taxonomy.
//!
//! Every failed transition surfaces as one [`TransitionError`]. Callers map
//! outcomes by [`TransitionError::kind`], never by message text.

use ridehail_db::DbError;
use ridehail_types::{RideId, RideStatus};
use uuid::Uuid;

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A ride (absent, or not owned by the caller).
    Ride,
    /// A driver.
    Driver,
    /// A rider account.
    Rider,
    /// A dispatcher account.
    Dispatcher,
}

impl core::fmt::Display for Entity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Ride => "ride",
            Self::Driver => "driver",
            Self::Rider => "rider",
            Self::Dispatcher => "dispatcher",
        })
    }
}

/// Closed discriminant of [`TransitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; the caller's fault.
    Validation,
    /// A referenced entity is absent or not owned by the caller.
    NotFound,
    /// The ride's current status forbids the operation.
    InvalidTransition,
    /// Lost a race against a concurrent transition; retrying the whole
    /// operation may succeed.
    Conflict,
    /// A stored invariant is broken.
    DataIntegrity,
    /// Any other store fault.
    Internal,
}

/// Errors returned by transition operations.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The request payload is malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist or is not visible to the caller.
    #[error("{entity} {id} not found")]
    NotFound {
        /// What was looked up.
        entity: Entity,
        /// The id that was looked up.
        id: Uuid,
    },

    /// The ride is not in the status the operation starts from.
    #[error("ride {ride_id} is {from}, cannot move to {to}")]
    InvalidTransition {
        /// The ride.
        ride_id: RideId,
        /// Status found under the lock.
        from: RideStatus,
        /// Status the operation would have written.
        to: RideStatus,
    },

    /// A concurrent transition won.
    #[error("conflict on ride {ride_id}: {reason}")]
    Conflict {
        /// The ride.
        ride_id: RideId,
        /// What was observed.
        reason: String,
    },

    /// A stored invariant does not hold.
    #[error("data integrity violation on ride {ride_id}: {reason}")]
    DataIntegrity {
        /// The ride.
        ride_id: RideId,
        /// The broken invariant.
        reason: String,
    },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl TransitionError {
    /// The closed discriminant for this error.
    ///
    /// A store conflict that outlived every retry is reported as
    /// [`ErrorKind::Conflict`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::DataIntegrity { .. } | Self::Store(DbError::Corrupt(_)) => {
                ErrorKind::DataIntegrity
            }
            Self::Store(err) if err.is_retryable() => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Whether the transaction failed on a serialization failure or deadlock
    /// and may be re-run from the start.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_retryable())
    }

    pub(crate) fn not_found(entity: Entity, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn conflict(ride_id: RideId, reason: impl Into<String>) -> Self {
        Self::Conflict {
            ride_id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_closed() {
        let ride_id = RideId::new();
        assert_eq!(
            TransitionError::Validation("pickup".to_owned()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            TransitionError::not_found(Entity::Ride, ride_id).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TransitionError::InvalidTransition {
                ride_id,
                from: RideStatus::Completed,
                to: RideStatus::Completed,
            }
            .kind(),
            ErrorKind::InvalidTransition
        );
        assert_eq!(
            TransitionError::conflict(ride_id, "driver is not available").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            TransitionError::Store(DbError::Corrupt("bad status".to_owned())).kind(),
            ErrorKind::DataIntegrity
        );
        assert_eq!(
            TransitionError::Store(DbError::Postgres(sqlx_row_not_found())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn only_store_conflicts_retry() {
        let ride_id = RideId::new();
        assert!(!TransitionError::conflict(ride_id, "lost race").is_retryable());
        assert!(!TransitionError::Store(DbError::Postgres(sqlx_row_not_found())).is_retryable());
    }

    #[test]
    fn messages_name_the_entity() {
        let id = RideId::new();
        let err = TransitionError::not_found(Entity::Driver, id);
        assert_eq!(err.to_string(), format!("driver {id} not found"));
    }

    fn sqlx_row_not_found() -> sqlx::Error {
        sqlx::Error::RowNotFound
    }
}
