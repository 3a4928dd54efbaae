//! Prometheus metrics for the signing coordinator.
//!
//! All metrics follow the naming convention: `sc_<component>_<metric>_<unit>`
//!
//! Metrics are created lazily and counted whether or not they have been
//! registered; [`register_metrics`] only exposes them for scraping.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CORRELATION BUS
    // =========================================================================

    /// Messages emitted on the correlation bus
    pub static ref BUS_MESSAGES_EMITTED: CounterVec = CounterVec::new(
        Opts::new("sc_bus_messages_emitted_total", "Messages emitted on the correlation bus"),
        &["method", "delivered"]  // delivered: yes/no
    ).expect("metric creation failed");

    // =========================================================================
    // SCANNER
    // =========================================================================

    /// Scan requests issued (including decoder-driven re-scans)
    pub static ref SCANS_REQUESTED: Counter = Counter::new(
        "sc_scanner_scans_requested_total",
        "Total scan requests emitted"
    ).expect("metric creation failed");

    // =========================================================================
    // QR CODEC
    // =========================================================================

    /// Frames handed to the presentation surface
    pub static ref QR_FRAMES_RENDERED: CounterVec = CounterVec::new(
        Opts::new("sc_qr_frames_rendered_total", "QR frames rendered"),
        &["scheme"]  // scheme: fixed/fountain
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNING
    // =========================================================================

    /// Signing requests resolved, by device and outcome
    pub static ref SIGNING_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("sc_signing_outcomes_total", "Signing requests resolved"),
        &["device", "outcome"]  // outcome: completed/cancelled/<error kind>
    ).expect("metric creation failed");

    /// Ledger sessions restarted from `connect`
    pub static ref LEDGER_RECONNECTS: Counter = Counter::new(
        "sc_ledger_reconnects_total",
        "Ledger sessions restarted from the connect step"
    ).expect("metric creation failed");
}

/// Proof that the collectors are exposed on [`REGISTRY`].
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Collectors newly registered by this call (0 if already registered).
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register every collector with the global registry.
///
/// Registering twice is not an error: collectors already present are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(BUS_MESSAGES_EMITTED.clone()),
        Box::new(SCANS_REQUESTED.clone()),
        Box::new(QR_FRAMES_RENDERED.clone()),
        Box::new(SIGNING_OUTCOMES.clone()),
        Box::new(LEDGER_RECONNECTS.clone()),
    ];

    let mut registered = 0;
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record how a signing request resolved.
pub fn record_outcome(device: &str, outcome: &str) {
    SIGNING_OUTCOMES.with_label_values(&[device, outcome]).inc();
}
