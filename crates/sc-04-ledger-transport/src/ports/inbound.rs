//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::{
    DerivationPath, SessionContext, Signature, SignedProof, SigningResult, TonProofRequest,
    Transaction,
};

/// Signing on a Ledger device.
///
/// Each call resolves exactly once. A refusal on the device resolves as
/// `SigningOutcome::Cancelled`.
#[async_trait]
pub trait LedgerSigningApi: Send + Sync {
    /// Sign every transaction in order; transaction N+1 is never sent before N
    /// is signed.
    async fn sign_transactions(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        transactions: &[Transaction],
    ) -> SigningResult<Vec<Signature>>;

    /// Sign a TON proof.
    async fn sign_proof(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        proof: &TonProofRequest,
    ) -> SigningResult<SignedProof>;

    /// Display the address for `path` on the device and return it.
    async fn confirm_address(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
    ) -> SigningResult<String>;
}
