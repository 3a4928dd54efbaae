//! # Signing Telemetry
//!
//! Structured logging and Prometheus metrics for the signing coordinator.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use signing_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     // Signing sessions now log and count.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SC_SERVICE_NAME` | `signing-coordinator` | Service name in logs |
//! | `SC_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `SC_LOG_FORMAT` | `pretty` | `pretty`, `json` or `off` |

mod config;
mod logging;
pub mod metrics;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::{env_filter, init_logging, LoggingGuard};
pub use metrics::{
    encode_metrics, record_outcome, register_metrics, MetricsHandle, BUS_MESSAGES_EMITTED,
    LEDGER_RECONNECTS, QR_FRAMES_RENDERED, SCANS_REQUESTED, SIGNING_OUTCOMES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and, unless disabled, register metrics.
///
/// Hold the guard for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics {
        Some(register_metrics()?)
    } else {
        None
    };
    let logging = init_logging(config)?;

    Ok(TelemetryGuard { logging, metrics })
}

/// Keeps telemetry active.
pub struct TelemetryGuard {
    logging: LoggingGuard,
    metrics: Option<MetricsHandle>,
}

impl TelemetryGuard {
    /// Log format in use.
    pub fn log_format(&self) -> LogFormat {
        self.logging.format()
    }

    /// True when metrics were registered at startup.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Telemetry shut down");
    }
}

/// Log a signing-session event with the standard session fields.
///
/// ```rust,ignore
/// log_session_event!(info, "ledger", correlation_id, "Transaction signed", signing_index = 2);
/// ```
#[macro_export]
macro_rules! log_session_event {
    ($level:ident, $device:expr, $correlation_id:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            device = $device,
            correlation_id = %$correlation_id,
            $($($field)*,)?
            $msg
        )
    };
}
