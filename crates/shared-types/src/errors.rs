//! # Error Types
//!
//! The signing error taxonomy shared by every subsystem.
//!
//! User cancellation is deliberately absent: it resolves requests as
//! [`SigningOutcome::Cancelled`](crate::SigningOutcome::Cancelled).
//! An incomplete decode is not an error either; decoders report it as
//! `DecodeStatus::NeedMore`.

use thiserror::Error;

use crate::ipc::ResponseError;

/// Errors that resolve a signing request unsuccessfully.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Device not connected, app not open, camera permission denied.
    ///
    /// Recoverable: the UI offers "try again" and signed progress is kept.
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Scanned data does not match the expected envelope ("wrong code").
    #[error("Protocol mismatch: expected {expected}, found {found}")]
    ProtocolMismatch { expected: String, found: String },

    /// Anything else: vendor SDK failures, malformed bytes.
    #[error("Unexpected signing failure: {0}")]
    Unexpected(String),
}

impl SigningError {
    /// Build a protocol mismatch error.
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Returns true if the UI should offer an inline retry of the current step.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransportUnavailable(_) | Self::ProtocolMismatch { .. }
        )
    }

    /// Stable label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransportUnavailable(_) => "transport_unavailable",
            Self::ProtocolMismatch { .. } => "protocol_mismatch",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

impl From<SigningError> for ResponseError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::TransportUnavailable(reason) => Self::TransportUnavailable { reason },
            SigningError::ProtocolMismatch { expected, found } => {
                Self::ProtocolMismatch { expected, found }
            }
            SigningError::Unexpected(reason) => Self::Failed { reason },
        }
    }
}
