//! # App Readiness Policy
//!
//! After the device link comes up the TON app may still be closed. The
//! signer polls `probe_app` with exponential backoff until the app answers
//! or the attempt budget runs out.
//!
//! ```text
//! attempt:  1     2     3      4      5 ...
//! delay:    250ms 500ms 1000ms 2000ms 2000ms (capped)
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of a readiness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// The TON app answered.
    Ready,
    /// A single probe found the app closed.
    NotReady,
    /// The bounded wait ran out of attempts.
    TimedOut,
}

impl Readiness {
    /// Map one probe result.
    #[must_use]
    pub fn from_probe(app_open: bool) -> Self {
        if app_open {
            Self::Ready
        } else {
            Self::NotReady
        }
    }
}

/// Bounded exponential backoff for the readiness wait.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Probes before giving up. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after the first failed probe.
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Probes to make, at least one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after failed probe number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_backoff_ms.min(self.max_backoff_ms);
        for _ in 1..attempt {
            delay = (delay * 2).min(self.max_backoff_ms);
        }
        Duration::from_millis(delay)
    }

    /// Longest the whole wait can sleep: the sum of every delay between probes.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        (1..self.attempts()).map(|attempt| self.backoff(attempt)).sum()
    }

    /// Check the policy is usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=6).map(|a| policy.backoff(a).as_millis() as u64).collect();
        assert_eq!(delays, vec![250, 500, 1000, 2000, 2000, 2000]);
    }

    #[test]
    fn test_max_wait_is_bounded() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff_ms: 100,
            max_backoff_ms: 300,
        };
        // Three sleeps between four probes: 100 + 200 + 300.
        assert_eq!(policy.max_wait(), Duration::from_millis(600));
    }

    #[test]
    fn test_zero_attempts_still_probes_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.max_wait(), Duration::ZERO);
    }

    #[test]
    fn test_from_probe() {
        assert_eq!(Readiness::from_probe(true), Readiness::Ready);
        assert_eq!(Readiness::from_probe(false), Readiness::NotReady);
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::default().validate().is_ok());
        let bad = RetryPolicy {
            initial_backoff_ms: 5_000,
            ..RetryPolicy::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 3}"#).unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff_ms, 250);
    }
}
