//! # Decoder State Machine
//!
//! Common contract of both QR decoders. The receiving side drives more scans
//! while `receive` reports [`DecodeStatus::NeedMore`].

use super::errors::CodecError;

/// Result of feeding one scanned fragment to a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// The payload is fully reassembled; `result()` is available.
    Complete,
    /// More fragments are needed; request another scan.
    NeedMore,
}

/// Accumulates scanned fragments into a payload.
///
/// INVARIANT: `is_complete()` never goes back to false, and `result()` is
/// `Some` exactly when `is_complete()` is true.
pub trait Decoder {
    /// The reassembled payload type.
    type Output;

    /// Feed one scanned fragment.
    ///
    /// Fragments received after completion are ignored.
    fn receive(&mut self, fragment: &str) -> Result<DecodeStatus, CodecError>;

    /// Returns true once the payload is reassembled.
    fn is_complete(&self) -> bool;

    /// The reassembled payload, once complete.
    fn result(&self) -> Option<Self::Output>;

    /// Fraction of the payload recovered so far, in `[0, 1]`.
    fn progress(&self) -> f64;
}
