//! Telemetry configuration: file values first, environment on top.

use serde::Deserialize;
use std::env;

/// How log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored lines.
    #[default]
    Pretty,
    /// One JSON object per line, with file and line.
    Json,
    /// Filter only, nothing written.
    Off,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }
}

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info,sc_04_ledger_transport=debug`
    pub log_level: String,

    /// Output format
    pub log_format: LogFormat,

    /// Register the Prometheus collectors at startup
    pub metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "signing-coordinator".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics: true,
        }
    }
}

impl TelemetryConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of a file-loaded configuration.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `SC_SERVICE_NAME` | `service_name` |
    /// | `SC_LOG_LEVEL`, then `RUST_LOG` | `log_level` |
    /// | `SC_LOG_FORMAT` (`pretty`, `json`, `off`) | `log_format` |
    ///
    /// Unparseable formats are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(name) = lookup("SC_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Some(level) = lookup("SC_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.log_level = level;
        }
        if let Some(format) = lookup("SC_LOG_FORMAT").as_deref().and_then(LogFormat::parse) {
            self.log_format = format;
        }
        self
    }
}
