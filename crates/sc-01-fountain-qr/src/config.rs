//! Codec configuration
//!
//! Fragment sizes and frame intervals are tunable; the defaults are values
//! that common phone cameras and the Keystone scanner pick up reliably.

use crate::domain::{CodecError, DEFAULT_MAX_MESSAGE_LEN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// QR codec configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Characters per fixed-interval chunk
    pub fragment_size: usize,
    /// Fixed-interval frame period (ms)
    pub fixed_interval_ms: u64,
    /// Maximum bytes per fountain fragment (before hex encoding)
    pub fountain_fragment_len: usize,
    /// Fountain frame period (ms)
    pub fountain_interval_ms: u64,
    /// Largest message a fountain decoder will reassemble (bytes)
    pub max_message_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            fragment_size: 256,
            fixed_interval_ms: 100,
            fountain_fragment_len: 100,
            fountain_interval_ms: 200,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl CodecConfig {
    /// Reject zero sizes and intervals.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.fragment_size == 0 {
            return Err(CodecError::InvalidFragmentSize(self.fragment_size));
        }
        if self.fountain_fragment_len == 0 {
            return Err(CodecError::InvalidFragmentSize(self.fountain_fragment_len));
        }
        if self.fixed_interval_ms == 0 || self.fountain_interval_ms == 0 {
            return Err(CodecError::Malformed("frame interval must be positive".to_string()));
        }
        if self.max_message_len == 0 {
            return Err(CodecError::Malformed("message length limit must be positive".to_string()));
        }
        Ok(())
    }

    /// Fixed-interval frame period
    pub fn fixed_interval(&self) -> Duration {
        Duration::from_millis(self.fixed_interval_ms)
    }

    /// Fountain frame period
    pub fn fountain_interval(&self) -> Duration {
        Duration::from_millis(self.fountain_interval_ms)
    }
}
