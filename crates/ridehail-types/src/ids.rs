//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Riders, drivers, dispatchers, rides and notifications each get their own
//! identifier type so a driver id can never be bound where a ride id is
//! expected. All IDs use UUID v7 (time-ordered) for efficient indexing.
//!
//! `PostgreSQL` generates ids via `DEFAULT gen_random_uuid()` for inserts.
//! The `new()` constructors here exist for tests and seed data.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a ride.
    RideId
}

define_id! {
    /// Unique identifier for a rider (row in the `users` table).
    RiderId
}

define_id! {
    /// Unique identifier for a driver.
    DriverId
}

define_id! {
    /// Unique identifier for a dispatcher.
    DispatcherId
}

define_id! {
    /// Unique identifier for a notification record.
    NotificationId
}
