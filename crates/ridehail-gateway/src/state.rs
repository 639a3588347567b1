//! Shared application state for the role gateways.

use ridehail_db::PostgresPool;
use ridehail_engine::RideEngine;

/// State shared by every handler.
///
/// The engine owns the pool, the fare schedule and the notification
/// queue's sender; read-side handlers borrow the pool through it.
#[derive(Clone)]
pub struct AppState {
    /// The ride transition engine.
    pub engine: RideEngine,
}

impl AppState {
    /// Wrap an engine.
    pub const fn new(engine: RideEngine) -> Self {
        Self { engine }
    }

    /// The database pool behind the engine.
    pub const fn pool(&self) -> &PostgresPool {
        self.engine.pool()
    }
}
