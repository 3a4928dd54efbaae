//! Ledger signer configuration.

use crate::domain::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ledger signer settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Backoff for the TON-app readiness poll.
    pub readiness: RetryPolicy,
    /// How long an errored session waits for the user to press "try again".
    /// Zero fails the request as soon as the device drops.
    pub retry_wait_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            readiness: RetryPolicy::default(),
            retry_wait_ms: 120_000,
        }
    }
}

impl LedgerConfig {
    /// Retry window, `None` when retries are disabled.
    pub fn retry_wait(&self) -> Option<Duration> {
        (self.retry_wait_ms > 0).then(|| Duration::from_millis(self.retry_wait_ms))
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), String> {
        self.readiness.validate()
    }
}
