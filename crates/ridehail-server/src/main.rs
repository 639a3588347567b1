//! Ride-hailing lifecycle service binary.
//!
//! Wires the transition engine to `PostgreSQL`, the notification queue
//! and the HTTP gateways, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ridehail-config.yaml` (or `RIDEHAIL_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Connect the `PostgreSQL` pool
//! 4. Apply migrations
//! 5. Start the pool monitor
//! 6. Start the notification queue
//! 7. Build the transition engine
//! 8. Serve the gateways until `Ctrl-C`
//! 9. Drain notifications and close the pool

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use ridehail_db::{NotificationStore, PostgresPool};
use ridehail_engine::{Notifier, RideEngine};
use ridehail_gateway::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::ConfigError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "ridehail-config.yaml";

/// How long shutdown waits for queued notifications to be recorded.
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration. Logging is configured by it, so nothing is
    //    logged before this point.
    let (config, config_source) = load_config().context("loading configuration")?;

    // 2. Initialize structured logging.
    init_tracing(config.logging.json);
    info!("ridehail-server starting");
    info!(
        source = %config_source,
        port = config.server.port,
        max_connections = config.database.max_connections,
        base_fare = %config.fare.base_fare,
        base_hours = config.fare.base_hours,
        additional_hour_rate = %config.fare.additional_hour_rate,
        retry_attempts = config.retry.max_attempts,
        "Configuration loaded"
    );

    // 3. Connect the pool.
    let pool = PostgresPool::connect(&config.database.pool_config())
        .await
        .context("connecting to PostgreSQL")?;

    // 4. Apply migrations.
    if config.database.run_migrations {
        pool.run_migrations()
            .await
            .context("applying migrations")?;
        info!("Migrations applied");
    }

    // 5. Pool monitor.
    let monitor = pool.spawn_monitor(config.database.monitor_interval());

    // 6. Notification queue.
    let (notifier, queue) = Notifier::channel(config.notifications.queue_capacity);
    let notifications = queue.spawn(NotificationStore::new(pool.pool().clone()));
    info!(
        capacity = config.notifications.queue_capacity,
        "Notification queue started"
    );

    // 7. Transition engine.
    let engine = RideEngine::new(pool.clone(), config.fare, config.retry.policy(), notifier);
    let state = Arc::new(AppState::new(engine));

    // 8. Serve until Ctrl-C. The router owns the last engine handle, so the
    //    notification queue closes once the server returns.
    ridehail_gateway::start_server(&config.server.listen(), state, shutdown_signal())
        .await
        .context("running HTTP server")?;

    // 9. Drain and close.
    match tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, notifications).await {
        Ok(Ok(())) => info!("Notification queue drained"),
        Ok(Err(e)) => warn!(error = %e, "Notification queue task failed"),
        Err(_) => warn!("Timed out draining notification queue"),
    }
    monitor.abort();
    pool.close().await;

    info!("ridehail-server shutdown complete");
    Ok(())
}

/// Install the global subscriber. The level comes from `RUST_LOG`,
/// defaulting to `info`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load, override and validate the configuration.
///
/// Returns the config and a description of where it came from.
fn load_config() -> Result<(AppConfig, String), ConfigError> {
    let path = std::env::var_os("RIDEHAIL_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let (mut config, source) = if path.exists() {
        (AppConfig::from_file(&path)?, path.display().to_string())
    } else {
        (AppConfig::default(), String::from("defaults"))
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok((config, source))
}

/// Resolves on the first `Ctrl-C`. Never resolves if the handler cannot
/// be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
