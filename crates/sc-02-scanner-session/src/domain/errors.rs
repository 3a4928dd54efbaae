//! Scanner errors.

use shared_types::errors::SigningError;
use shared_types::ipc::ResponseError;
use thiserror::Error;

/// Errors that end one scan round trip.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// The request was cancelled locally or the operator closed the camera.
    #[error("Scan cancelled")]
    Cancelled,

    /// The camera could not be reached.
    #[error("Scanner unavailable: {0}")]
    Unavailable(String),

    /// The response carried something other than a scanned value.
    #[error("Unexpected scan response: {0}")]
    UnexpectedResponse(String),

    /// The response subscription closed before an answer arrived.
    #[error("Scan subscription closed")]
    Closed,
}

impl ScanError {
    /// Returns true if the request was abandoned rather than failed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<ScanError> for SigningError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Unavailable(reason) => SigningError::TransportUnavailable(reason),
            ScanError::UnexpectedResponse(found) => SigningError::mismatch("scanned", found),
            other => SigningError::Unexpected(other.to_string()),
        }
    }
}

/// Errors reported by a camera / QR reader.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReaderError {
    /// The operator closed the camera view.
    #[error("Reader closed")]
    Closed,

    /// The camera is missing or permission was denied.
    #[error("Reader unavailable: {0}")]
    Unavailable(String),
}

impl From<ReaderError> for ResponseError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::Closed => ResponseError::Cancelled,
            ReaderError::Unavailable(reason) => ResponseError::TransportUnavailable { reason },
        }
    }
}
