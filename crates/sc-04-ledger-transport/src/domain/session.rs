//! # Ledger Signing Session
//!
//! State machine for one Ledger request.
//!
//! ```text
//! [Connect] ──DeviceConnected──→ [OpenTon] ──AppOpened──→ [ConfirmTx]
//!     ↑                                                     │    ↑
//!     │                                        Signed (more)└────┘
//!     │                                                     │
//!     │                                         Signed (last)
//!     │                                                     ↓
//!     └──── Retry / PermissionPageClosed (any state) ── [AllCompleted]
//! ```
//!
//! `is_errored` is orthogonal to the step: a failure marks the current step
//! errored without moving it; a retry clears the flag and restarts from
//! `Connect` while keeping every signature collected so far.

use serde::{Deserialize, Serialize};
use shared_types::ipc::LedgerPayload;
use shared_types::{DerivationPath, Signature, SignedProof, TonProofRequest, Transaction};

/// Connection step of a Ledger session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectStep {
    /// Waiting for the device link.
    #[default]
    Connect,
    /// Waiting for the TON app to be opened.
    OpenTon,
    /// Waiting for the user to confirm on the device.
    ConfirmTx,
    /// Every confirmation collected.
    AllCompleted,
}

impl ConnectStep {
    /// Stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::OpenTon => "open-ton",
            Self::ConfirmTx => "confirm-tx",
            Self::AllCompleted => "all-completed",
        }
    }
}

/// What the device is asked to confirm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerOperation {
    /// Sign each transaction in order.
    Transactions(Vec<Transaction>),
    /// Sign a TON proof.
    Proof(TonProofRequest),
    /// Show the address on the device screen.
    ConfirmAddress,
}

impl From<LedgerPayload> for LedgerOperation {
    fn from(payload: LedgerPayload) -> Self {
        match payload {
            LedgerPayload::Transactions(txs) => Self::Transactions(txs),
            LedgerPayload::Proof(proof) => Self::Proof(proof),
        }
    }
}

impl LedgerOperation {
    /// Number of on-device confirmations.
    #[must_use]
    pub fn confirmations(&self) -> usize {
        match self {
            Self::Transactions(txs) => txs.len(),
            Self::Proof(_) | Self::ConfirmAddress => 1,
        }
    }
}

/// Events driving the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    /// The transport reached the device.
    DeviceConnected,
    /// The readiness poll saw the TON app open.
    AppOpened,
    /// The user confirmed the current item.
    Signed(Signature),
    /// The address was shown and confirmed.
    AddressConfirmed(String),
    /// A step failed with a connectivity error.
    Failed,
    /// The user pressed "try again".
    Retry,
    /// The OS Bluetooth/USB permission page was closed.
    PermissionPageClosed,
}

/// Progress view published to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub step: ConnectStep,
    pub signing_index: usize,
    pub total: usize,
    pub is_errored: bool,
}

/// One Ledger request in flight.
///
/// INVARIANT: `signing_index == signatures.len()`, and it only grows.
#[derive(Clone, Debug)]
pub struct LedgerSigningSession {
    path: DerivationPath,
    operation: LedgerOperation,
    signing_index: usize,
    step: ConnectStep,
    is_errored: bool,
    signatures: Vec<Signature>,
    address: Option<String>,
    reconnects: u32,
}

impl LedgerSigningSession {
    /// Start a session at `Connect`.
    pub fn new(path: DerivationPath, operation: LedgerOperation) -> Self {
        Self {
            path,
            operation,
            signing_index: 0,
            step: ConnectStep::Connect,
            is_errored: false,
            signatures: Vec::new(),
            address: None,
            reconnects: 0,
        }
    }

    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    pub fn operation(&self) -> &LedgerOperation {
        &self.operation
    }

    pub fn step(&self) -> ConnectStep {
        self.step
    }

    pub fn signing_index(&self) -> usize {
        self.signing_index
    }

    pub fn is_errored(&self) -> bool {
        self.is_errored
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Number of times the session was restarted from `Connect`.
    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }

    pub fn is_complete(&self) -> bool {
        self.step == ConnectStep::AllCompleted
    }

    /// The transaction awaiting confirmation, if the operation is a transaction batch.
    pub fn current_transaction(&self) -> Option<&Transaction> {
        match &self.operation {
            LedgerOperation::Transactions(txs) => txs.get(self.signing_index),
            _ => None,
        }
    }

    /// The confirmed address, once shown.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// The signed proof, once complete.
    pub fn signed_proof(&self) -> Option<SignedProof> {
        match (&self.operation, self.signatures.first()) {
            (LedgerOperation::Proof(request), Some(signature)) if self.is_complete() => Some(SignedProof {
                signature: *signature,
                request: request.clone(),
            }),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            step: self.step,
            signing_index: self.signing_index,
            total: self.operation.confirmations(),
            is_errored: self.is_errored,
        }
    }

    /// Apply an event and return the resulting step.
    pub fn process_event(&mut self, event: LedgerEvent) -> ConnectStep {
        let next = self.next_step(&event);

        match event {
            LedgerEvent::Failed => self.is_errored = true,
            LedgerEvent::Retry | LedgerEvent::PermissionPageClosed => {
                self.is_errored = false;
                self.reconnects += 1;
            }
            LedgerEvent::Signed(signature) if self.step == ConnectStep::ConfirmTx => {
                self.signatures.push(signature);
                self.signing_index += 1;
                self.is_errored = false;
            }
            LedgerEvent::AddressConfirmed(address) if self.step == ConnectStep::ConfirmTx => {
                self.address = Some(address);
                self.signing_index += 1;
                self.is_errored = false;
            }
            LedgerEvent::DeviceConnected | LedgerEvent::AppOpened if next != self.step => {
                self.is_errored = false;
            }
            _ => {}
        }

        self.step = next;
        next
    }

    fn next_step(&self, event: &LedgerEvent) -> ConnectStep {
        let total = self.operation.confirmations();
        match (self.step, event) {
            (_, LedgerEvent::Retry | LedgerEvent::PermissionPageClosed) => ConnectStep::Connect,

            (ConnectStep::Connect, LedgerEvent::DeviceConnected) => ConnectStep::OpenTon,
            (ConnectStep::OpenTon, LedgerEvent::AppOpened) => {
                if self.signing_index >= total {
                    ConnectStep::AllCompleted
                } else {
                    ConnectStep::ConfirmTx
                }
            }
            (ConnectStep::ConfirmTx, LedgerEvent::Signed(_) | LedgerEvent::AddressConfirmed(_)) => {
                if self.signing_index + 1 >= total {
                    ConnectStep::AllCompleted
                } else {
                    ConnectStep::ConfirmTx
                }
            }

            (step, _) => step,
        }
    }
}
