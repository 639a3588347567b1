//! Ledger store for the ride lifecycle (`PostgreSQL`).
//!
//! The database is the only holder of authoritative ride state. Transitions
//! coordinate exclusively through row locks and `SERIALIZABLE` isolation;
//! there is no in-process shared ride state.
//!
//! # Architecture
//!
//! ```text
//! Transition engine
//!     |
//!     +-- PostgresPool::begin_serializable --> TransitionStore
//!     |       (FOR UPDATE locks: ride, then driver; guarded writes)
//!     |
//!     +-- after commit --> NotificationStore (own connection)
//!
//! Gateways (reads only)
//!     +-- RideStore, DriverStore, RiderStore, NotificationStore
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Pool configuration, lifecycle, serializable transactions
//! - [`transition_store`] -- Locking reads and guarded writes inside a transition
//! - [`ride_store`] -- Lock-free ride queries, listings, earnings and reports
//! - [`driver_store`] -- Driver queries
//! - [`rider_store`] -- Rider queries
//! - [`notification_store`] -- Notification persistence
//! - [`error`] -- Error type and SQLSTATE conflict classification

pub mod driver_store;
pub mod error;
pub mod notification_store;
pub mod postgres;
pub mod ride_store;
pub mod rider_store;
pub mod transition_store;

// Re-export primary types for convenience.
pub use driver_store::DriverStore;
pub use error::{ConflictClass, DbError};
pub use notification_store::NotificationStore;
pub use postgres::{PgTransaction, PoolStats, PostgresConfig, PostgresPool, finish_transaction};
pub use ride_store::{PageRequest, PerformanceFilter, RideFilter, RideRow, RideStore};
pub use rider_store::RiderStore;
pub use transition_store::{LockedDriver, LockedRide, RiderRef, TransitionStore};
