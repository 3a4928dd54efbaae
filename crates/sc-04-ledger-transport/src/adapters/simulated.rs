//! # Simulated Ledger
//!
//! In-process stand-in for a Ledger device running the TON app. Every call
//! takes a fixed latency, the app can be made to open only after a number of
//! probes, and failures can be queued per call kind. Each call is logged so
//! tests can check ordering and retries.

use crate::domain::TransportError;
use crate::ports::HardwareTransport;
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use shared_types::{DerivationPath, Signature, TonProofRequest, Transaction};
use std::time::Duration;
use tracing::debug;

/// Transport call kinds, as logged by [`SimulatedLedger`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerCall {
    Connect,
    ProbeApp,
    GetAddress,
    SignTransaction,
    GetAddressProof,
}

struct Failure {
    call: LedgerCall,
    skip: usize,
    error: TransportError,
}

#[derive(Default)]
struct DeviceState {
    connected: bool,
    probes: u32,
    failures: Vec<Failure>,
    calls: Vec<LedgerCall>,
}

/// Scripted Ledger device.
pub struct SimulatedLedger {
    secret: Vec<u8>,
    latency: Duration,
    closed_probes: u32,
    state: Mutex<DeviceState>,
}

impl SimulatedLedger {
    /// Device holding `secret`, TON app already open, 5ms per call.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            latency: Duration::from_millis(5),
            closed_probes: 0,
            state: Mutex::new(DeviceState::default()),
        }
    }

    /// Set the per-call latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Report the TON app closed for the first `probes` probes.
    pub fn open_app_after(mut self, probes: u32) -> Self {
        self.closed_probes = probes;
        self
    }

    /// Fail the next `call` with `error`. Queued failures fire in order.
    pub fn fail_on(&self, call: LedgerCall, error: TransportError) {
        self.fail_after(call, 0, error);
    }

    /// Let `successes` more `call`s through, then fail the next one.
    pub fn fail_after(&self, call: LedgerCall, successes: usize, error: TransportError) {
        self.state.lock().failures.push(Failure {
            call,
            skip: successes,
            error,
        });
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().calls.clone()
    }

    /// Number of calls of one kind.
    pub fn count(&self, call: LedgerCall) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Signature the device produces for `message`.
    pub fn signature_for(&self, message: &[u8]) -> Signature {
        let first = Sha256::new()
            .chain_update(&self.secret)
            .chain_update(message)
            .finalize();
        let second = Sha256::new().chain_update(first).chain_update(message).finalize();

        let mut signature = [0u8; 64];
        signature[..32].copy_from_slice(&first);
        signature[32..].copy_from_slice(&second);
        signature
    }

    /// Address the device reports for `path`.
    pub fn address_for(&self, path: &DerivationPath) -> String {
        let mut hasher = Sha256::new().chain_update(&self.secret);
        for component in &path.components {
            hasher.update(component.to_be_bytes());
        }
        format!("0:{}", hex::encode(hasher.finalize()))
    }

    /// Bytes signed for a proof request.
    pub fn proof_message(path: &DerivationPath, proof: &TonProofRequest) -> Vec<u8> {
        let mut message = b"ton-proof-item-v2/".to_vec();
        for component in &path.components {
            message.extend_from_slice(&component.to_be_bytes());
        }
        message.extend_from_slice(proof.domain.as_bytes());
        message.extend_from_slice(&proof.timestamp.to_le_bytes());
        message.extend_from_slice(proof.payload.as_bytes());
        message
    }

    async fn enter(&self, call: LedgerCall) -> Result<(), TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut state = self.state.lock();
        state.calls.push(call);
        debug!(?call, "Simulated Ledger call");

        if let Some(pos) = state.failures.iter().position(|f| f.call == call) {
            if state.failures[pos].skip > 0 {
                state.failures[pos].skip -= 1;
            } else {
                let failure = state.failures.remove(pos);
                if matches!(failure.error, TransportError::Disconnected(_)) {
                    state.connected = false;
                }
                return Err(failure.error);
            }
        }

        if call != LedgerCall::Connect && !state.connected {
            return Err(TransportError::Disconnected("device not connected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HardwareTransport for SimulatedLedger {
    async fn connect(&self) -> Result<(), TransportError> {
        self.enter(LedgerCall::Connect).await?;
        self.state.lock().connected = true;
        Ok(())
    }

    async fn probe_app(&self) -> Result<bool, TransportError> {
        self.enter(LedgerCall::ProbeApp).await?;
        let mut state = self.state.lock();
        state.probes += 1;
        Ok(state.probes > self.closed_probes)
    }

    async fn get_address(&self, path: &DerivationPath) -> Result<String, TransportError> {
        self.enter(LedgerCall::GetAddress).await?;
        Ok(self.address_for(path))
    }

    async fn sign_transaction(
        &self,
        _path: &DerivationPath,
        transaction: &Transaction,
    ) -> Result<Signature, TransportError> {
        self.enter(LedgerCall::SignTransaction).await?;
        Ok(self.signature_for(&transaction.body))
    }

    async fn get_address_proof(
        &self,
        path: &DerivationPath,
        proof: &TonProofRequest,
    ) -> Result<Signature, TransportError> {
        self.enter(LedgerCall::GetAddressProof).await?;
        Ok(self.signature_for(&Self::proof_message(path, proof)))
    }
}
