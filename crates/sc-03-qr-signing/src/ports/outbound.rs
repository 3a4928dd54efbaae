//! Driven Ports (SPI - Outbound Dependencies)

use async_trait::async_trait;
use shared_types::{
    DerivationPath, SessionContext, Signature, SignedProof, SigningResult, TonProofRequest,
    Transaction,
};

/// A hardware signer reached over a device transport.
///
/// Implemented by the runtime on top of the Ledger state machine.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Sign every transaction, strictly one after another.
    async fn sign_transactions(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        transactions: &[Transaction],
    ) -> SigningResult<Vec<Signature>>;

    /// Sign a TON proof for `path`.
    async fn sign_proof(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        proof: &TonProofRequest,
    ) -> SigningResult<SignedProof>;
}
