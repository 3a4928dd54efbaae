//! # Signing Request Handler
//!
//! UI-side counterpart of [`RemoteSigner`](super::RemoteSigner). Listens for
//! `Signer`, `Keystone` and `Ledger` requests, runs them one at a time, and
//! emits exactly one `Response` per request: a signature, a proof, a
//! cancellation, or an error.

use crate::ports::{LedgerBackend, QrSigningApi};
use parking_lot::Mutex;
use shared_bus::{BusMessage, CorrelationBus, EventFilter, Method};
use shared_types::ipc::{into_response, LedgerPayload, ResponseError, ResponsePayload, SignaturePayload};
use shared_types::{CancelToken, SessionContext};
use signing_telemetry::log_session_event;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Serves signing requests from the bus.
pub struct SigningRequestHandler {
    bus: Arc<CorrelationBus>,
    qr: Arc<dyn QrSigningApi>,
    ledger: Option<Arc<dyn LedgerBackend>>,
}

impl SigningRequestHandler {
    /// Handler for QR requests. Ledger requests fail until a backend is attached.
    pub fn new(bus: Arc<CorrelationBus>, qr: Arc<dyn QrSigningApi>) -> Self {
        Self {
            bus,
            qr,
            ledger: None,
        }
    }

    /// Attach the hardware signer used for Ledger requests.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerBackend>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Start serving. Requests are subscribed to before this returns.
    pub fn start(self) -> SigningHandlerHandle {
        let stop = CancelToken::new();
        let current: Arc<Mutex<Option<CancelToken>>> = Arc::new(Mutex::new(None));
        let mut requests = self.bus.subscribe(EventFilter::methods(vec![
            Method::Signer,
            Method::Keystone,
            Method::Ledger,
        ]));

        let task_stop = stop.clone();
        let task_current = Arc::clone(&current);
        let task = tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    biased;
                    _ = task_stop.cancelled() => break,
                    message = requests.recv() => message,
                };
                let Some(message) = message else { break };

                let id = message.id();
                let cancel = CancelToken::new();
                *task_current.lock() = Some(cancel.clone());
                let ctx = SessionContext::with_cancel(id, cancel.clone());

                let work = self.process(&ctx, message);
                tokio::pin!(work);
                let params = tokio::select! {
                    params = &mut work => params,
                    _ = task_stop.cancelled() => {
                        cancel.cancel();
                        work.await
                    }
                };

                task_current.lock().take();
                self.bus.emit(BusMessage::response(id, params));
            }
            debug!("Signing request handler stopped");
        });

        SigningHandlerHandle {
            stop,
            current,
            task: Some(task),
        }
    }

    async fn process(
        &self,
        ctx: &SessionContext,
        message: BusMessage,
    ) -> Result<ResponsePayload, ResponseError> {
        match message {
            BusMessage::Signer { params, .. } => {
                log_session_event!(info, "signer", ctx.correlation_id(), "Signer request received");
                into_response(
                    self.qr.sign_with_signer(ctx, &params).await,
                    ResponsePayload::Signature,
                )
            }
            BusMessage::Keystone { params, .. } => {
                log_session_event!(info, "keystone", ctx.correlation_id(), "Keystone request received");
                into_response(
                    self.qr.sign_with_keystone(ctx, &params).await,
                    ResponsePayload::Signature,
                )
            }
            BusMessage::Ledger { params, .. } => {
                log_session_event!(
                    info,
                    "ledger",
                    ctx.correlation_id(),
                    "Ledger request received",
                    confirmations = params.payload.confirmations()
                );
                let Some(ledger) = &self.ledger else {
                    warn!(correlation_id = %ctx.correlation_id(), "No Ledger backend attached");
                    return Err(ResponseError::TransportUnavailable {
                        reason: "no Ledger transport".to_string(),
                    });
                };
                match &params.payload {
                    LedgerPayload::Transactions(transactions) => into_response(
                        ledger.sign_transactions(ctx, &params.path, transactions).await,
                        |signatures| {
                            ResponsePayload::Signatures(
                                signatures.into_iter().map(SignaturePayload).collect(),
                            )
                        },
                    ),
                    LedgerPayload::Proof(proof) => into_response(
                        ledger.sign_proof(ctx, &params.path, proof).await,
                        ResponsePayload::Proof,
                    ),
                }
            }
            other => Err(ResponseError::Failed {
                reason: format!("not a signing request: {}", other.method().as_str()),
            }),
        }
    }
}

/// Running request handler. Dropping the handle stops it.
pub struct SigningHandlerHandle {
    stop: CancelToken,
    current: Arc<Mutex<Option<CancelToken>>>,
    task: Option<JoinHandle<()>>,
}

impl SigningHandlerHandle {
    /// Cancel the request in progress (the operator closed the modal).
    ///
    /// Returns false if no request was running.
    pub fn cancel_current(&self) -> bool {
        match self.current.lock().as_ref() {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Returns true while a request is being served.
    pub fn is_busy(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Stop serving. A request in progress resolves as cancelled first.
    pub async fn shutdown(mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Signing request handler task failed");
            }
        }
    }
}

impl Drop for SigningHandlerHandle {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RemoteSigner;
    use async_trait::async_trait;
    use shared_types::ipc::{KeystoneRequest, Network, SignerRequest};
    use shared_types::{
        DerivationPath, Signature, SignedProof, SigningError, SigningOutcome, SigningResult,
        TonProofRequest, Transaction,
    };
    use std::time::Duration;

    /// Signs instantly, or waits for cancellation when `block` is set.
    struct StubQr {
        block: bool,
    }

    #[async_trait]
    impl QrSigningApi for StubQr {
        async fn sign_with_signer(
            &self,
            ctx: &SessionContext,
            _request: &SignerRequest,
        ) -> SigningResult<Signature> {
            if self.block {
                ctx.cancelled().await;
                return Ok(SigningOutcome::Cancelled);
            }
            Ok(SigningOutcome::Completed([7; 64]))
        }

        async fn sign_with_keystone(
            &self,
            _ctx: &SessionContext,
            _request: &KeystoneRequest,
        ) -> SigningResult<Signature> {
            Err(SigningError::mismatch("ton-signature", "bytes"))
        }
    }

    struct StubLedger;

    #[async_trait]
    impl LedgerBackend for StubLedger {
        async fn sign_transactions(
            &self,
            _ctx: &SessionContext,
            _path: &DerivationPath,
            transactions: &[Transaction],
        ) -> SigningResult<Vec<Signature>> {
            Ok(SigningOutcome::Completed(
                transactions.iter().map(|tx| [tx.body[0]; 64]).collect(),
            ))
        }

        async fn sign_proof(
            &self,
            _ctx: &SessionContext,
            _path: &DerivationPath,
            proof: &TonProofRequest,
        ) -> SigningResult<SignedProof> {
            Ok(SigningOutcome::Completed(SignedProof {
                signature: [3; 64],
                request: proof.clone(),
            }))
        }
    }

    fn signer_request() -> SignerRequest {
        SignerRequest {
            transaction: Transaction::new(vec![1]),
            public_key: [0; 32],
            version: "v2".into(),
            network: Network::Mainnet,
        }
    }

    fn keystone_request() -> KeystoneRequest {
        KeystoneRequest {
            request_id: uuid::Uuid::new_v4(),
            sign_data: vec![1, 2],
            data_type: shared_types::ipc::KeystoneDataType::Transaction,
            derivation_path: DerivationPath::ton_account(0),
            address: "addr".into(),
            origin: "test".into(),
        }
    }

    #[tokio::test]
    async fn test_each_request_gets_one_response() {
        let bus = Arc::new(CorrelationBus::new());
        let handler = SigningRequestHandler::new(bus.clone(), Arc::new(StubQr { block: false }))
            .with_ledger(Arc::new(StubLedger))
            .start();

        let responses = Arc::new(Mutex::new(Vec::new()));
        let sink = responses.clone();
        bus.on(Method::Response, move |m| sink.lock().push(m.id()));

        let remote = RemoteSigner::new(bus.clone());
        let cancel = CancelToken::new();

        let signature = remote.sign_with_signer(&cancel, signer_request()).await;
        assert_eq!(signature, Ok(SigningOutcome::Completed([7; 64])));

        let keystone = remote.sign_with_keystone(&cancel, keystone_request()).await;
        assert_eq!(keystone, Err(SigningError::mismatch("ton-signature", "bytes")));

        let ledger = remote
            .sign_with_ledger(
                &cancel,
                DerivationPath::ton_account(0),
                vec![Transaction::new(vec![4]), Transaction::new(vec![5])],
            )
            .await;
        assert_eq!(ledger, Ok(SigningOutcome::Completed(vec![[4; 64], [5; 64]])));

        let proof = TonProofRequest {
            domain: "example.org".into(),
            timestamp: 1,
            payload: "nonce".into(),
        };
        let signed = remote
            .sign_proof_with_ledger(&cancel, DerivationPath::ton_account(0), proof.clone())
            .await
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(signed.request, proof);

        let ids = responses.lock().clone();
        assert_eq!(ids.len(), 4);
        let mut unique = ids.clone();
        unique.dedup();
        assert_eq!(unique.len(), 4);

        handler.shutdown().await;
        assert_eq!(bus.subscriber_count(Method::Signer), 0);
    }

    #[tokio::test]
    async fn test_ledger_without_backend() {
        let bus = Arc::new(CorrelationBus::new());
        let _handler = SigningRequestHandler::new(bus.clone(), Arc::new(StubQr { block: false })).start();

        let result = RemoteSigner::new(bus)
            .sign_with_ledger(&CancelToken::new(), DerivationPath::ton_account(0), vec![])
            .await;
        assert_eq!(
            result,
            Err(SigningError::TransportUnavailable("no Ledger transport".into()))
        );
    }

    #[tokio::test]
    async fn test_cancel_current_emits_cancelled_response() {
        let bus = Arc::new(CorrelationBus::new());
        let handler = SigningRequestHandler::new(bus.clone(), Arc::new(StubQr { block: true })).start();

        let remote = RemoteSigner::new(bus.clone());
        let request = tokio::spawn(async move {
            remote.sign_with_signer(&CancelToken::new(), signer_request()).await
        });

        while !handler.is_busy() {
            tokio::task::yield_now().await;
        }
        assert!(handler.cancel_current());

        let result = tokio::time::timeout(Duration::from_secs(1), request)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Ok(SigningOutcome::Cancelled));
        assert!(!handler.is_busy());
        assert!(!handler.cancel_current());
    }
}
