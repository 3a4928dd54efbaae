//! # Bus Message Payloads
//!
//! One payload type per bus method. The message enum itself lives in
//! `shared-bus`; this module only defines what each variant carries.
//!
//! ## Design Rules
//!
//! - Payloads MUST NOT carry the correlation id; the envelope owns it.
//! - A response carries either a [`ResponsePayload`] or a [`ResponseError`].

use crate::entities::*;
use crate::errors::SigningError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use uuid::Uuid;

// =============================================================================
// SIGNER (fixed-interval QR)
// =============================================================================

/// Network the transaction is meant for; the Signer app shows it to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Wire label used inside Signer deep links.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "ton",
            Self::Testnet => "testnet",
        }
    }
}

/// Request to have the air-gapped Signer app sign a transaction.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRequest {
    /// The unsigned transaction.
    pub transaction: Transaction,
    /// Public key of the wallet that must sign.
    #[serde_as(as = "Bytes")]
    pub public_key: PublicKey,
    /// Wallet contract version label (e.g. `v4R2`).
    pub version: String,
    /// Target network.
    pub network: Network,
}

// =============================================================================
// KEYSTONE (fountain QR)
// =============================================================================

/// What the Keystone device is asked to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeystoneDataType {
    /// A transaction body.
    Transaction,
    /// A TON Connect proof message.
    SignProof,
}

/// Request to have a Keystone device sign a transaction or a proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoneRequest {
    /// Request id echoed back by the device in its signature.
    pub request_id: Uuid,
    /// The data to sign.
    pub sign_data: Vec<u8>,
    /// Interpretation of `sign_data`.
    pub data_type: KeystoneDataType,
    /// Key location on the device.
    pub derivation_path: DerivationPath,
    /// Account address shown on the device for confirmation.
    pub address: String,
    /// Requesting application label shown on the device.
    pub origin: String,
}

// =============================================================================
// LEDGER (APDU transport)
// =============================================================================

/// What a Ledger session is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerPayload {
    /// One or more transactions, signed strictly in order.
    Transactions(Vec<Transaction>),
    /// A single TON Connect proof.
    Proof(TonProofRequest),
}

impl LedgerPayload {
    /// Number of device confirmations this payload needs.
    #[must_use]
    pub fn confirmations(&self) -> usize {
        match self {
            Self::Transactions(txs) => txs.len(),
            Self::Proof(_) => 1,
        }
    }
}

/// Request to have a Ledger device sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRequest {
    /// Key location on the device.
    pub path: DerivationPath,
    /// What to sign.
    pub payload: LedgerPayload,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Successful response payloads.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponsePayload {
    /// A raw value read by the camera for a `scan` request.
    Scanned(String),
    /// One signature (Signer, Keystone transaction).
    Signature(#[serde_as(as = "Bytes")] Signature),
    /// Ordered signatures for a multi-transaction Ledger session.
    Signatures(Vec<SignaturePayload>),
    /// A signed TON proof.
    Proof(SignedProof),
}

/// Serializable wrapper so signature lists can use the `Bytes` adapter.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePayload(#[serde_as(as = "Bytes")] pub Signature);

/// Error response payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseError {
    /// The user cancelled on the UI or on the device.
    Cancelled,
    /// Camera or device unavailable.
    TransportUnavailable { reason: String },
    /// The scanned code was of the wrong kind.
    ProtocolMismatch { expected: String, found: String },
    /// Generic failure.
    Failed { reason: String },
}

/// Translate a bus response into the requester-side outcome.
///
/// `extract` picks the expected payload variant; any other variant is a
/// protocol mismatch.
pub fn resolve_response<T>(
    params: Result<ResponsePayload, ResponseError>,
    expected: &str,
    extract: impl FnOnce(ResponsePayload) -> Result<T, ResponsePayload>,
) -> SigningResult<T> {
    match params {
        Ok(payload) => extract(payload)
            .map(SigningOutcome::Completed)
            .map_err(|other| SigningError::mismatch(expected, other.kind())),
        Err(ResponseError::Cancelled) => Ok(SigningOutcome::Cancelled),
        Err(ResponseError::TransportUnavailable { reason }) => {
            Err(SigningError::TransportUnavailable(reason))
        }
        Err(ResponseError::ProtocolMismatch { expected, found }) => {
            Err(SigningError::ProtocolMismatch { expected, found })
        }
        Err(ResponseError::Failed { reason }) => Err(SigningError::Unexpected(reason)),
    }
}

impl ResponsePayload {
    /// Variant label for logs and mismatch errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scanned(_) => "scanned",
            Self::Signature(_) => "signature",
            Self::Signatures(_) => "signatures",
            Self::Proof(_) => "proof",
        }
    }
}

/// Flatten a responder-side [`SigningResult`] into response params.
pub fn into_response<T>(
    result: SigningResult<T>,
    wrap: impl FnOnce(T) -> ResponsePayload,
) -> Result<ResponsePayload, ResponseError> {
    match result {
        Ok(SigningOutcome::Completed(value)) => Ok(wrap(value)),
        Ok(SigningOutcome::Cancelled) => Err(ResponseError::Cancelled),
        Err(err) => Err(err.into()),
    }
}
