//! # Signing Coordinator Runtime
//!
//! Starts the coordinator against simulated devices and runs one signing
//! round trip per device kind.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file from argv or `SC_CONFIG`, env overrides)
//! 2. Initialize telemetry
//! 3. Wire the bus, QR signing, Ledger signer and request handler
//! 4. Run the demo round trips
//! 5. Shut down

use anyhow::{Context, Result};
use signing_runtime::{run_demo, CoordinatorConfig, SigningRuntime, SimulatedPeripherals, CONFIG_ENV};
use signing_telemetry::{encode_metrics, init_telemetry};
use std::path::PathBuf;
use tracing::{debug, info, warn};

fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from)
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path();
    let config = CoordinatorConfig::load(path.as_deref()).context("Failed to load configuration")?;
    let _telemetry = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Signing Coordinator Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    match &path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("No configuration file, using defaults"),
    }

    let mut devices = SimulatedPeripherals::new();
    let runtime = SigningRuntime::start(&config, devices.peripherals()?);

    let report = run_demo(&runtime, &devices, &config).await;
    runtime.shutdown().await;

    let report = report?;
    if report.all_completed() {
        info!("All round trips completed");
    } else {
        warn!(?report, "Some round trips were cancelled");
    }

    match encode_metrics() {
        Ok(metrics) => debug!("Metrics:\n{}", metrics),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }
    Ok(())
}
