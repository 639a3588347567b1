//! HTTP gateways for riders, drivers and dispatchers.
//!
//! Thin Axum layer over [`ridehail_engine::RideEngine`]. Caller identity
//! arrives in role headers set by an upstream authenticator
//! ([`identity`]); bodies are checked with `validator` ([`payload`]);
//! every failure renders through [`GatewayError`].
//!
//! # Modules
//!
//! - [`error`] -- `GatewayError` and its HTTP mapping
//! - [`handlers`] -- endpoint handlers per role, plus `/health`
//! - [`identity`] -- caller identity extractors
//! - [`payload`] -- request bodies, query strings and their extractors
//! - [`router`] -- route table
//! - [`server`] -- bind and serve with graceful shutdown
//! - [`state`] -- shared handler state

pub mod error;
pub mod handlers;
pub mod identity;
pub mod payload;
pub mod router;
pub mod server;
pub mod state;

pub use error::GatewayError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
