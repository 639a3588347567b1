//! Ride lifecycle transition engine.
//!
//! The engine is the only writer of ride status. Each operation locks the
//! rows it decides on, checks the [`Transition`] edge, applies a guarded
//! write and commits inside one `SERIALIZABLE` transaction. Conflicts retry
//! under a [`RetryPolicy`]; notifications go out through a [`Notifier`] only
//! after commit.
//!
//! ```text
//! RequestRide                     -> pending
//! AssignDriver   pending          -> assigned     (driver unavailable)
//! StartRide      assigned         -> in_progress
//! EndRide        in_progress      -> completed    (billed, driver available)
//! CancelRide     pending          -> cancelled
//! ```
//!
//! # Modules
//!
//! - [`engine`] -- [`RideEngine`] and the five transition operations
//! - [`machine`] -- The legal edges of the ride lifecycle
//! - [`retry`] -- Bounded exponential backoff for conflicting transactions
//! - [`notify`] -- Notification sink contract, post-commit queue, message texts
//! - [`error`] -- [`TransitionError`] and its closed [`ErrorKind`]

pub mod engine;
pub mod error;
pub mod machine;
pub mod notify;
pub mod retry;

pub use engine::RideEngine;
pub use error::{Entity, ErrorKind, TransitionError};
pub use machine::Transition;
pub use notify::{NotificationQueue, NotificationSink, Notifier};
pub use retry::RetryPolicy;
