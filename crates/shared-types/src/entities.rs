//! # Core Domain Entities
//!
//! The small set of values that travel between the wallet layer, the
//! coordination layer and the external signers.
//!
//! ## Clusters
//!
//! - **Correlation**: `CorrelationId`
//! - **Keys & Signatures**: `PublicKey`, `Signature`, `DerivationPath`
//! - **Signing Inputs**: `Transaction`, `TonProofRequest`
//! - **Signing Outputs**: `SignedProof`, `SigningOutcome`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;
use std::str::FromStr;

use crate::errors::SigningError;

// =============================================================================
// CLUSTER A: CORRELATION
// =============================================================================

/// Identifier correlating one request envelope with its single response.
///
/// Distinct among concurrently outstanding requests. Values are derived from
/// wall-clock milliseconds by the bus, but callers must treat them as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub u64);

impl CorrelationId {
    /// Wrap a raw integer id.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CLUSTER B: KEYS & SIGNATURES
// =============================================================================

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Bit marking a hardened BIP-32 path component.
pub const HARDENED_BIT: u32 = 0x8000_0000;

/// A BIP-32 style derivation path, e.g. `m/44'/607'/0'`.
///
/// The coordination layer never derives keys; it only carries the path to
/// the device that does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DerivationPath {
    /// Raw components, hardened ones carrying [`HARDENED_BIT`].
    pub components: Vec<u32>,
}

impl DerivationPath {
    /// Build a path from raw components.
    #[must_use]
    pub fn new(components: Vec<u32>) -> Self {
        Self { components }
    }

    /// The standard TON account path `m/44'/607'/<account>'`.
    #[must_use]
    pub fn ton_account(account: u32) -> Self {
        Self::new(vec![
            44 | HARDENED_BIT,
            607 | HARDENED_BIT,
            account | HARDENED_BIT,
        ])
    }

    /// Number of components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.components.len()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            if component & HARDENED_BIT != 0 {
                write!(f, "/{}'", component & !HARDENED_BIT)?;
            } else {
                write!(f, "/{component}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(SigningError::Unexpected(format!(
                "derivation path must start with 'm': {s}"
            )));
        }

        let mut components = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
                Some(stripped) => (stripped, true),
                None => (part, false),
            };
            let index: u32 = digits.parse().map_err(|_| {
                SigningError::Unexpected(format!("invalid derivation path component '{part}'"))
            })?;
            if index & HARDENED_BIT != 0 {
                return Err(SigningError::Unexpected(format!(
                    "derivation path component out of range: {index}"
                )));
            }
            components.push(if hardened { index | HARDENED_BIT } else { index });
        }

        Ok(Self { components })
    }
}

// =============================================================================
// CLUSTER C: SIGNING INPUTS
// =============================================================================

/// An unsigned transaction as produced by the wallet layer.
///
/// Opaque to the coordinator: the bytes are the serialized message body the
/// external signer must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Serialized unsigned message body.
    pub body: Vec<u8>,
}

impl Transaction {
    /// Wrap serialized transaction bytes.
    #[must_use]
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }
}

/// A TON Connect proof request: the dApp asks the wallet to prove address
/// ownership for `domain` at `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonProofRequest {
    /// Requesting dApp domain.
    pub domain: String,
    /// Unix timestamp (seconds) of the request.
    pub timestamp: u64,
    /// Opaque challenge payload supplied by the dApp.
    pub payload: String,
}

// =============================================================================
// CLUSTER D: SIGNING OUTPUTS
// =============================================================================

/// A signed TON proof.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProof {
    /// Signature over the proof message.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    /// The request this proof answers.
    pub request: TonProofRequest,
}

/// The kind of external signer a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Air-gapped Signer app over fixed-interval QR frames.
    Signer,
    /// Keystone hardware device over fountain-encoded QR frames.
    Keystone,
    /// Ledger hardware device over an APDU transport.
    Ledger,
}

impl DeviceKind {
    /// Stable lowercase label (used for metrics and logs).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Signer => "signer",
            Self::Keystone => "keystone",
            Self::Ledger => "ledger",
        }
    }
}

/// Successful resolution of a signing request.
///
/// Cancellation by the user is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningOutcome<T> {
    /// The external signer produced a result.
    Completed(T),
    /// The user (or the device on their behalf) cancelled.
    Cancelled,
}

impl<T> SigningOutcome<T> {
    /// Returns true if the request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    /// Map the completed value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SigningOutcome<U> {
        match self {
            Self::Completed(value) => SigningOutcome::Completed(f(value)),
            Self::Cancelled => SigningOutcome::Cancelled,
        }
    }
}

/// Result alias for every signing entry point.
pub type SigningResult<T> = Result<SigningOutcome<T>, SigningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ton_account_path_display() {
        let path = DerivationPath::ton_account(0);
        assert_eq!(path.to_string(), "m/44'/607'/0'");
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn test_path_parse() {
        let path: DerivationPath = "m/44'/607'/2'/0".parse().unwrap();
        assert_eq!(
            path.components,
            vec![44 | HARDENED_BIT, 607 | HARDENED_BIT, 2 | HARDENED_BIT, 0]
        );
        assert_eq!(path.to_string(), "m/44'/607'/2'/0");
    }

    #[test]
    fn test_path_parse_rejects_garbage() {
        assert!("44'/607'".parse::<DerivationPath>().is_err());
        assert!("m/abc".parse::<DerivationPath>().is_err());
        assert!("m/4294967295".parse::<DerivationPath>().is_err());
    }

    #[test]
    fn test_outcome_helpers() {
        let done: SigningOutcome<u8> = SigningOutcome::Completed(7);
        assert!(!done.is_cancelled());
        assert_eq!(done.map(|v| v * 2).completed(), Some(14));

        let cancelled: SigningOutcome<u8> = SigningOutcome::Cancelled;
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.completed(), None);
    }

    #[test]
    fn test_correlation_id_display() {
        assert_eq!(CorrelationId::from_raw(1001).to_string(), "1001");
        assert_eq!(CorrelationId(5).as_u64(), 5);
    }
}
