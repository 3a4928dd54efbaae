//! Requesting side of the signing gateway.

use shared_bus::{BusMessage, CorrelationBus, EventFilter};
use shared_types::entities::CorrelationId;
use shared_types::ipc::{
    resolve_response, KeystoneRequest, LedgerPayload, LedgerRequest, ResponseError,
    ResponsePayload, SignerRequest,
};
use shared_types::{
    CancelToken, DerivationPath, Signature, SignedProof, SigningError, SigningOutcome,
    SigningResult, TonProofRequest, Transaction,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Asks whoever handles signing requests on the bus to sign.
///
/// Cancellation is local: the request's subscription is dropped and the
/// caller resolves with `Cancelled`; nothing is sent on the bus.
#[derive(Clone)]
pub struct RemoteSigner {
    bus: Arc<CorrelationBus>,
}

impl RemoteSigner {
    /// Gateway emitting on `bus`.
    pub fn new(bus: Arc<CorrelationBus>) -> Self {
        Self { bus }
    }

    /// Sign a transaction with the air-gapped Signer app.
    pub async fn sign_with_signer(
        &self,
        cancel: &CancelToken,
        params: SignerRequest,
    ) -> SigningResult<Signature> {
        let response = self
            .round_trip(cancel, |id| BusMessage::Signer { id, params })
            .await?;
        resolve(response, "signature", |payload| match payload {
            ResponsePayload::Signature(signature) => Ok(signature),
            other => Err(other),
        })
    }

    /// Sign with a Keystone device (transaction or proof, per `data_type`).
    pub async fn sign_with_keystone(
        &self,
        cancel: &CancelToken,
        params: KeystoneRequest,
    ) -> SigningResult<Signature> {
        let response = self
            .round_trip(cancel, |id| BusMessage::Keystone { id, params })
            .await?;
        resolve(response, "signature", |payload| match payload {
            ResponsePayload::Signature(signature) => Ok(signature),
            other => Err(other),
        })
    }

    /// Sign transactions with a Ledger device, in order.
    pub async fn sign_with_ledger(
        &self,
        cancel: &CancelToken,
        path: DerivationPath,
        transactions: Vec<Transaction>,
    ) -> SigningResult<Vec<Signature>> {
        let params = LedgerRequest {
            path,
            payload: LedgerPayload::Transactions(transactions),
        };
        let response = self
            .round_trip(cancel, |id| BusMessage::Ledger { id, params })
            .await?;
        resolve(response, "signatures", |payload| match payload {
            ResponsePayload::Signatures(signatures) => {
                Ok(signatures.into_iter().map(|s| s.0).collect())
            }
            other => Err(other),
        })
    }

    /// Sign a TON proof with a Ledger device.
    pub async fn sign_proof_with_ledger(
        &self,
        cancel: &CancelToken,
        path: DerivationPath,
        proof: TonProofRequest,
    ) -> SigningResult<SignedProof> {
        let params = LedgerRequest {
            path,
            payload: LedgerPayload::Proof(proof),
        };
        let response = self
            .round_trip(cancel, |id| BusMessage::Ledger { id, params })
            .await?;
        resolve(response, "proof", |payload| match payload {
            ResponsePayload::Proof(proof) => Ok(proof),
            other => Err(other),
        })
    }

    /// Emit one request and wait for its response.
    ///
    /// `None` means the request was cancelled locally.
    async fn round_trip(
        &self,
        cancel: &CancelToken,
        build: impl FnOnce(CorrelationId) -> BusMessage,
    ) -> Result<Option<Result<ResponsePayload, ResponseError>>, SigningError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let id = self.bus.next_correlation_id();
        let message = build(id);
        let method = message.method();
        let mut responses = self.bus.subscribe(EventFilter::response_to(id));

        if self.bus.emit(message) == 0 {
            return Err(SigningError::TransportUnavailable(format!(
                "no handler for {} requests",
                method.as_str()
            )));
        }
        info!(correlation_id = %id, method = method.as_str(), "Signing request sent");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(correlation_id = %id, "Signing request abandoned");
                Ok(None)
            }
            message = responses.recv() => match message {
                Some(BusMessage::Response { params, .. }) => Ok(Some(params)),
                Some(other) => Err(SigningError::mismatch("response", other.method().as_str())),
                None => Err(SigningError::Unexpected("response subscription closed".to_string())),
            },
        }
    }
}

fn resolve<T>(
    response: Option<Result<ResponsePayload, ResponseError>>,
    expected: &str,
    extract: impl FnOnce(ResponsePayload) -> Result<T, ResponsePayload>,
) -> SigningResult<T> {
    match response {
        Some(params) => resolve_response(params, expected, extract),
        None => Ok(SigningOutcome::Cancelled),
    }
}
