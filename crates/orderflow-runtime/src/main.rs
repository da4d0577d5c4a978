//! # OrderFlow Runtime
//!
//! Wires the services together over one in-process message bus and runs
//! until interrupted.
//!
//! ## Startup sequence
//!
//! 1. Install the tracing subscriber.
//! 2. Load configuration from the environment (the auth secret is required).
//! 3. Build the bus, the deadline cache, and the OTP store.
//! 4. Spawn the expiry watchdog and the lifecycle server.
//! 5. Wait for Ctrl-C.

mod adapters;
mod config;

use crate::adapters::LoggingCodeDelivery;
use crate::config::RuntimeConfig;
use anyhow::{Context, Result};
use of_01_identity::{IdentityExtractor, TokenVerifier};
use of_02_otp::{OtpService, OtpStore, SystemClock};
use of_03_watchdog::{ExpirationSource, ExpiryWatchdog, InMemoryDeadlineCache};
use of_04_lifecycle::{CacheDeadlineStore, LifecycleServer, LifecycleService};
use orderflow_telemetry::{init_telemetry, TelemetryConfig};
use shared_bus::InMemoryMessageBus;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("telemetry setup failed")?;

    let config = RuntimeConfig::from_env()?;
    info!(
        payment_window_secs = config.payment_window.as_secs(),
        rpc_timeout_ms = config.rpc_timeout.as_millis() as u64,
        "Starting OrderFlow"
    );

    let bus = Arc::new(InMemoryMessageBus::new());
    let cache = Arc::new(InMemoryDeadlineCache::new());

    let watchdog = ExpiryWatchdog::new(
        Arc::clone(&cache) as Arc<dyn ExpirationSource>,
        Arc::clone(&bus),
    );
    let watchdog_handle = tokio::spawn(watchdog.run());

    let otp = OtpService::new(
        Arc::new(OtpStore::new(Arc::new(SystemClock))),
        Arc::new(LoggingCodeDelivery),
    );
    let service = Arc::new(LifecycleService::new(
        Arc::clone(&bus),
        Arc::new(CacheDeadlineStore::new(Arc::clone(&cache))),
        otp,
        config.payment_window,
    ));
    let server = LifecycleServer::new(
        service,
        Arc::new(IdentityExtractor::new(TokenVerifier::new(
            config.auth_secret.as_bytes(),
        ))),
        Arc::clone(&bus),
    );
    let server_handle = tokio::spawn(server.run());

    info!("OrderFlow ready");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    watchdog_handle.abort();
    server_handle.abort();
    Ok(())
}
