//! A single outstanding scan.

use shared_bus::HandlerId;
use shared_types::entities::CorrelationId;
use shared_types::ipc::{ResponseError, ResponsePayload};

use super::errors::ScanError;

/// The one scan a trigger is currently waiting on.
///
/// Created on trigger, destroyed by the first matching response or by cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSession {
    /// Correlation id of the emitted `Scan` request.
    pub scan_id: CorrelationId,
    /// The response handler registered for it.
    pub handler: HandlerId,
}

/// Extract the scanned string from a response.
pub fn scanned_value(params: Result<ResponsePayload, ResponseError>) -> Result<String, ScanError> {
    match params {
        Ok(ResponsePayload::Scanned(value)) => Ok(value),
        Ok(other) => Err(ScanError::UnexpectedResponse(other.kind().to_string())),
        Err(ResponseError::Cancelled) => Err(ScanError::Cancelled),
        Err(ResponseError::TransportUnavailable { reason }) => Err(ScanError::Unavailable(reason)),
        Err(ResponseError::ProtocolMismatch { found, .. }) => Err(ScanError::UnexpectedResponse(found)),
        Err(ResponseError::Failed { reason }) => Err(ScanError::Unavailable(reason)),
    }
}
