//! # Transport Errors
//!
//! Errors raised by a hardware transport, carrying the vendor status word
//! where the device answered one.

use shared_types::errors::SigningError;
use thiserror::Error;

/// APDU status words the coordinator reacts to.
pub mod status {
    /// Command completed.
    pub const OK: u16 = 0x9000;
    /// Conditions of use not satisfied: the user rejected on the device.
    pub const USER_REJECTED: u16 = 0x6985;
    /// The TON app's own "user refused" answer.
    pub const TON_USER_REFUSED: u16 = 0x5501;
    /// Device is locked behind its PIN.
    pub const DEVICE_LOCKED: u16 = 0x5515;
    /// CLA not supported: no app (or the wrong app) is open.
    pub const CLA_NOT_SUPPORTED: u16 = 0x6e00;
    /// INS not supported by the open app.
    pub const INS_NOT_SUPPORTED: u16 = 0x6d00;
    /// The app is not open (dashboard).
    pub const APP_NOT_OPEN: u16 = 0x6511;

    /// Returns true if `code` means the user declined on the device.
    #[must_use]
    pub fn is_user_rejection(code: u16) -> bool {
        matches!(code, USER_REJECTED | TON_USER_REFUSED)
    }

    /// Returns true if `code` means the TON app is not in front.
    #[must_use]
    pub fn is_app_not_open(code: u16) -> bool {
        matches!(code, CLA_NOT_SUPPORTED | INS_NOT_SUPPORTED | APP_NOT_OPEN)
    }
}

/// Errors from a hardware transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// USB/BLE link lost or never established.
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    /// The device is locked.
    #[error("Device locked")]
    Locked,

    /// The TON app did not come up within the readiness window.
    #[error("TON app not open")]
    AppNotOpen,

    /// The device answered with a status word other than success.
    #[error("Device returned status {code:#06x}: {message}")]
    Status { code: u16, message: String },

    /// The device answered something that could not be parsed.
    #[error("Invalid device response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Build an error from a status word.
    #[must_use]
    pub fn status(code: u16) -> Self {
        let message = match code {
            status::USER_REJECTED | status::TON_USER_REFUSED => "rejected by user",
            status::DEVICE_LOCKED => "device locked",
            c if status::is_app_not_open(c) => "TON app not open",
            _ => "unexpected status",
        };
        Self::Status {
            code,
            message: message.to_string(),
        }
    }

    /// Returns true if the user declined on the device. Never retried.
    #[must_use]
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Status { code, .. } if status::is_user_rejection(*code))
    }

    /// Returns true if reconnecting may fix the error.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Disconnected(_) | Self::Locked | Self::AppNotOpen => true,
            Self::Status { code, .. } => *code == status::DEVICE_LOCKED || status::is_app_not_open(*code),
            Self::InvalidResponse(_) => false,
        }
    }
}

impl From<TransportError> for SigningError {
    fn from(err: TransportError) -> Self {
        if err.is_connectivity() {
            SigningError::TransportUnavailable(err.to_string())
        } else {
            SigningError::Unexpected(err.to_string())
        }
    }
}
