//! Ledger backend adapter.
//!
//! The request handler only knows [`LedgerBackend`]; this adapter routes it
//! to the Ledger state machine.

use async_trait::async_trait;
use sc_03_qr_signing::LedgerBackend;
use sc_04_ledger_transport::{LedgerSigner, LedgerSigningApi};
use shared_types::{
    DerivationPath, SessionContext, Signature, SignedProof, SigningResult, TonProofRequest,
    Transaction,
};
use std::sync::Arc;

/// [`LedgerBackend`] backed by a [`LedgerSigner`].
#[derive(Clone)]
pub struct LedgerBackendAdapter {
    signer: Arc<LedgerSigner>,
}

impl LedgerBackendAdapter {
    pub fn new(signer: Arc<LedgerSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl LedgerBackend for LedgerBackendAdapter {
    async fn sign_transactions(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        transactions: &[Transaction],
    ) -> SigningResult<Vec<Signature>> {
        self.signer.sign_transactions(ctx, path, transactions).await
    }

    async fn sign_proof(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        proof: &TonProofRequest,
    ) -> SigningResult<SignedProof> {
        self.signer.sign_proof(ctx, path, proof).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_04_ledger_transport::{LedgerCall, LedgerConfig, SimulatedLedger, TransportError};
    use shared_types::{CorrelationId, SigningOutcome};

    #[tokio::test(start_paused = true)]
    async fn test_routes_to_ledger_signer() {
        let device = Arc::new(SimulatedLedger::new(b"adapter".to_vec()));
        let adapter = LedgerBackendAdapter::new(Arc::new(LedgerSigner::new(
            device.clone(),
            LedgerConfig::default(),
        )));

        let txs = vec![Transaction::new(b"a".to_vec()), Transaction::new(b"b".to_vec())];
        let outcome = adapter
            .sign_transactions(
                &SessionContext::new(CorrelationId(1)),
                &DerivationPath::ton_account(0),
                &txs,
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SigningOutcome::Completed(vec![device.signature_for(b"a"), device.signature_for(b"b")])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_cancellation() {
        let device = Arc::new(SimulatedLedger::new(b"adapter".to_vec()));
        device.fail_on(LedgerCall::GetAddressProof, TransportError::status(0x6985));
        let adapter = LedgerBackendAdapter::new(Arc::new(LedgerSigner::new(
            device,
            LedgerConfig::default(),
        )));

        let proof = TonProofRequest {
            domain: "dapp.example".into(),
            timestamp: 5,
            payload: "x".into(),
        };
        let outcome = adapter
            .sign_proof(
                &SessionContext::new(CorrelationId(2)),
                &DerivationPath::ton_account(0),
                &proof,
            )
            .await
            .unwrap();
        assert!(outcome.is_cancelled());
    }
}
