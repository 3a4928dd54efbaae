//! # Coordinator Configuration
//!
//! One JSON document with a section per subsystem. Every field has a default,
//! so an empty object (or no file at all) is a valid configuration.
//! Telemetry settings can be overridden from the environment.

use sc_01_fountain_qr::CodecConfig;
use sc_04_ledger_transport::LedgerConfig;
use serde::Deserialize;
use signing_telemetry::TelemetryConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SC_CONFIG";

/// Complete coordinator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
    /// QR fragment sizes and frame intervals.
    pub codec: CodecConfig,
    /// Ledger readiness and retry behaviour.
    pub ledger: LedgerConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {section} configuration: {reason}")]
    Invalid { section: &'static str, reason: String },
}

impl CoordinatorConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and validate `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` (or defaults when `None`), then apply environment
    /// overrides to the telemetry section.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.telemetry = config.telemetry.with_env_overrides();
        Ok(config)
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.codec.validate().map_err(|e| ConfigError::Invalid {
            section: "codec",
            reason: e.to_string(),
        })?;
        self.ledger
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                section: "ledger",
                reason,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CoordinatorConfig::from_json("{}").unwrap();
        assert_eq!(config.codec, CodecConfig::default());
        assert_eq!(config.ledger, LedgerConfig::default());
        assert_eq!(config.telemetry.service_name, "signing-coordinator");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config = CoordinatorConfig::from_json(
            r#"{"codec": {"fragment_size": 128}, "ledger": {"retry_wait_ms": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.codec.fragment_size, 128);
        assert_eq!(config.codec.fixed_interval_ms, 100);
        assert_eq!(config.ledger.retry_wait(), None);
    }

    #[test]
    fn test_invalid_codec_rejected() {
        let config = CoordinatorConfig::from_json(r#"{"codec": {"fragment_size": 0}}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { section: "codec", .. })
        ));
    }

    #[test]
    fn test_shipped_config_parses() {
        let json = include_str!("../../config/signing.json");
        let config = CoordinatorConfig::from_json(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.ledger.readiness.max_attempts, 10);
        assert_eq!(config.telemetry.log_format, signing_telemetry::LogFormat::Pretty);
    }

    #[test]
    fn test_missing_file() {
        let err = CoordinatorConfig::from_file(Path::new("/nonexistent/signing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
