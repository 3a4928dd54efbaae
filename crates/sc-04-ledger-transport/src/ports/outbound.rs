//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::TransportError;
use async_trait::async_trait;
use shared_types::{DerivationPath, Signature, TonProofRequest, Transaction};

/// APDU transport to a Ledger device running the TON app.
///
/// Calls are made strictly one at a time; implementations need not queue.
/// Device refusals surface as `TransportError::Status` with the status word.
#[async_trait]
pub trait HardwareTransport: Send + Sync {
    /// Open (or reopen) the USB/BLE link.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Ask whether the TON app is in front. `Ok(false)` while the dashboard
    /// or another app is open.
    async fn probe_app(&self) -> Result<bool, TransportError>;

    /// Show and return the wallet address for `path`.
    async fn get_address(&self, path: &DerivationPath) -> Result<String, TransportError>;

    /// Have the user confirm and sign one transaction.
    async fn sign_transaction(
        &self,
        path: &DerivationPath,
        transaction: &Transaction,
    ) -> Result<Signature, TransportError>;

    /// Have the user confirm and sign a TON proof.
    async fn get_address_proof(
        &self,
        path: &DerivationPath,
        proof: &TonProofRequest,
    ) -> Result<Signature, TransportError>;
}
