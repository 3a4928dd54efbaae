//! # Codec Errors
//!
//! Error types for QR encoding and decoding.

use shared_types::errors::SigningError;
use thiserror::Error;

/// Errors that can occur while encoding or decoding QR frames.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Payloads must contain at least one byte/character
    #[error("Cannot encode an empty payload")]
    EmptyPayload,

    /// Fragment size (or expected chunk count) must be positive
    #[error("Invalid fragment size: {0}")]
    InvalidFragmentSize(usize),

    /// The scanned value is not the envelope this decoder expects
    #[error("Protocol mismatch: expected {expected}, found {found}")]
    ProtocolMismatch { expected: String, found: String },

    /// A part belongs to a different message than the parts seen so far
    #[error("Inconsistent part: {0}")]
    InconsistentPart(String),

    /// The envelope was recognised but its body could not be decoded
    #[error("Malformed fragment: {0}")]
    Malformed(String),

    /// All fragments were received but the reassembled message is corrupt
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl CodecError {
    /// Returns true if the operator should simply scan another code.
    #[must_use]
    pub fn is_wrong_code(&self) -> bool {
        matches!(self, Self::ProtocolMismatch { .. } | Self::InconsistentPart(_))
    }
}

impl From<CodecError> for SigningError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::ProtocolMismatch { expected, found } => {
                SigningError::ProtocolMismatch { expected, found }
            }
            CodecError::InconsistentPart(reason) => {
                SigningError::mismatch("part of the current message", reason)
            }
            other => SigningError::Unexpected(other.to_string()),
        }
    }
}
