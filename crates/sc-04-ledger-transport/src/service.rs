//! # Ledger Signer
//!
//! Drives a [`LedgerSigningSession`] against a [`HardwareTransport`].
//!
//! ```text
//! Connect ──connect()──→ OpenTon ──probe_app() with backoff──→ ConfirmTx
//!                                                                │
//!        sign_transaction() / get_address_proof() / get_address()│ × N
//!                                                                ↓
//!                                                          AllCompleted
//! ```
//!
//! ## Failure handling
//!
//! - Status `0x6985` (or the TON app's refusal word): the request resolves as
//!   `Cancelled`. Never retried.
//! - Connectivity errors and readiness timeouts: the session is marked
//!   errored and waits (bounded) for [`LedgerSigner::retry`] or
//!   [`LedgerSigner::on_permission_page_closed`], then restarts from
//!   `Connect` keeping the signatures collected so far.
//! - Anything else fails the request.
//!
//! Every snapshot is published on a `watch` channel for the step indicator.

use crate::config::LedgerConfig;
use crate::domain::{
    ConnectStep, LedgerEvent, LedgerOperation, LedgerSigningSession, Readiness, SessionSnapshot,
    TransportError,
};
use crate::ports::{HardwareTransport, LedgerSigningApi};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    DerivationPath, DeviceKind, SessionContext, Signature, SignedProof, SigningError,
    SigningOutcome, SigningResult, TonProofRequest, Transaction,
};
use signing_telemetry::{log_session_event, record_outcome, LEDGER_RECONNECTS};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::futures::Notified;
use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

const DEVICE: &str = DeviceKind::Ledger.as_str();

/// Why a step did not complete.
enum StepError {
    Cancelled,
    Transport(TransportError),
}

impl From<TransportError> for StepError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// How an errored session's wait ended.
enum Restart {
    Requested(LedgerEvent),
    Cancelled,
    Expired,
}

/// Ledger signing over a hardware transport.
pub struct LedgerSigner {
    transport: Arc<dyn HardwareTransport>,
    config: LedgerConfig,
    progress: watch::Sender<SessionSnapshot>,
    restart: Notify,
    restart_reason: Mutex<Option<LedgerEvent>>,
    exclusive: tokio::sync::Mutex<()>,
}

impl LedgerSigner {
    /// Create a signer over `transport`.
    pub fn new(transport: Arc<dyn HardwareTransport>, config: LedgerConfig) -> Self {
        let (progress, _) = watch::channel(SessionSnapshot::default());
        Self {
            transport,
            config,
            progress,
            restart: Notify::new(),
            restart_reason: Mutex::new(None),
            exclusive: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Observe session progress.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.progress.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.progress.borrow()
    }

    /// The user pressed "try again" on an errored session.
    pub fn retry(&self) {
        self.request_restart(LedgerEvent::Retry);
    }

    /// The OS Bluetooth/USB permission page was dismissed.
    pub fn on_permission_page_closed(&self) {
        self.request_restart(LedgerEvent::PermissionPageClosed);
    }

    fn request_restart(&self, event: LedgerEvent) {
        debug!(?event, "Ledger restart requested");
        *self.restart_reason.lock() = Some(event);
        self.restart.notify_waiters();
    }

    fn publish(&self, session: &LedgerSigningSession) {
        self.progress.send_replace(session.snapshot());
    }

    /// Run `operation` to completion, cancellation, or failure.
    async fn run(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        operation: LedgerOperation,
    ) -> SigningResult<LedgerSigningSession> {
        let _exclusive = self.exclusive.lock().await;
        let mut session = LedgerSigningSession::new(path.clone(), operation);

        log_session_event!(
            info,
            DEVICE,
            ctx.correlation_id(),
            "Ledger session started",
            confirmations = session.operation().confirmations()
        );

        let result = self.drive(ctx, &mut session).await;

        let label = match &result {
            Ok(()) => {
                log_session_event!(info, DEVICE, ctx.correlation_id(), "Ledger session completed", reconnects = session.reconnects());
                "completed"
            }
            Err(None) => {
                log_session_event!(info, DEVICE, ctx.correlation_id(), "Ledger session cancelled", signing_index = session.signing_index());
                "cancelled"
            }
            Err(Some(e)) => {
                log_session_event!(warn, DEVICE, ctx.correlation_id(), "Ledger session failed", error = %e, step = session.step().as_str());
                e.kind()
            }
        };
        record_outcome(DEVICE, label);

        match result {
            Ok(()) => Ok(SigningOutcome::Completed(session)),
            Err(None) => Ok(SigningOutcome::Cancelled),
            Err(Some(e)) => Err(e),
        }
    }

    /// `Err(None)` is a cancellation.
    async fn drive(
        &self,
        ctx: &SessionContext,
        session: &mut LedgerSigningSession,
    ) -> Result<(), Option<SigningError>> {
        self.publish(session);

        loop {
            match self.advance(ctx, session).await {
                Ok(ConnectStep::AllCompleted) => {
                    self.publish(session);
                    return Ok(());
                }
                Ok(_) => self.publish(session),
                Err(StepError::Cancelled) => return Err(None),
                Err(StepError::Transport(e)) if e.is_user_rejection() => {
                    log_session_event!(info, DEVICE, ctx.correlation_id(), "Rejected on device", signing_index = session.signing_index());
                    return Err(None);
                }
                Err(StepError::Transport(e)) if e.is_connectivity() => {
                    log_session_event!(
                        warn,
                        DEVICE,
                        ctx.correlation_id(),
                        "Ledger unavailable",
                        error = %e,
                        step = session.step().as_str(),
                        signing_index = session.signing_index()
                    );
                    session.process_event(LedgerEvent::Failed);

                    // Arm the wakeup before the UI can see the errored state.
                    self.restart_reason.lock().take();
                    let notified = self.restart.notified();
                    tokio::pin!(notified);
                    notified.as_mut().enable();
                    self.publish(session);

                    match self.wait_for_restart(ctx, notified).await {
                        Restart::Requested(event) => {
                            LEDGER_RECONNECTS.inc();
                            session.process_event(event);
                            self.publish(session);
                        }
                        Restart::Cancelled => return Err(None),
                        Restart::Expired => return Err(Some(e.into())),
                    }
                }
                Err(StepError::Transport(e)) => return Err(Some(e.into())),
            }
        }
    }

    async fn wait_for_restart(
        &self,
        ctx: &SessionContext,
        notified: Pin<&mut Notified<'_>>,
    ) -> Restart {
        let Some(limit) = self.config.retry_wait() else {
            return Restart::Expired;
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Restart::Cancelled,
            _ = notified => {
                let event = self.restart_reason.lock().take().unwrap_or(LedgerEvent::Retry);
                Restart::Requested(event)
            }
            _ = tokio::time::sleep(limit) => Restart::Expired,
        }
    }

    /// Perform the transport work for the current step and apply its event.
    async fn advance(
        &self,
        ctx: &SessionContext,
        session: &mut LedgerSigningSession,
    ) -> Result<ConnectStep, StepError> {
        let event = match session.step() {
            ConnectStep::Connect => {
                self.call(ctx, self.transport.connect()).await?;
                LedgerEvent::DeviceConnected
            }
            ConnectStep::OpenTon => match self.wait_for_app(ctx).await? {
                Readiness::Ready => LedgerEvent::AppOpened,
                Readiness::NotReady | Readiness::TimedOut => {
                    return Err(TransportError::AppNotOpen.into())
                }
            },
            ConnectStep::ConfirmTx => {
                debug!(
                    correlation_id = %ctx.correlation_id(),
                    signing_index = session.signing_index(),
                    "Awaiting confirmation on device"
                );
                let path = session.path();
                match session.operation() {
                    LedgerOperation::Transactions(txs) => {
                        let Some(tx) = txs.get(session.signing_index()) else {
                            return Ok(ConnectStep::AllCompleted);
                        };
                        let signature = self
                            .call(ctx, self.transport.sign_transaction(path, tx))
                            .await?;
                        LedgerEvent::Signed(signature)
                    }
                    LedgerOperation::Proof(proof) => {
                        let signature = self
                            .call(ctx, self.transport.get_address_proof(path, proof))
                            .await?;
                        LedgerEvent::Signed(signature)
                    }
                    LedgerOperation::ConfirmAddress => {
                        let address = self.call(ctx, self.transport.get_address(path)).await?;
                        LedgerEvent::AddressConfirmed(address)
                    }
                }
            }
            ConnectStep::AllCompleted => return Ok(ConnectStep::AllCompleted),
        };

        Ok(session.process_event(event))
    }

    /// Poll `probe_app` with backoff until the TON app answers.
    async fn wait_for_app(&self, ctx: &SessionContext) -> Result<Readiness, StepError> {
        let policy = &self.config.readiness;
        let attempts = policy.attempts();

        for attempt in 1..=attempts {
            let open = self.call(ctx, self.transport.probe_app()).await?;
            if Readiness::from_probe(open) == Readiness::Ready {
                return Ok(Readiness::Ready);
            }
            if attempt < attempts {
                let delay = policy.backoff(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "TON app not open yet");
                self.call(ctx, async {
                    tokio::time::sleep(delay).await;
                    Ok(())
                })
                .await?;
            }
        }

        warn!(attempts, "TON app did not open in time");
        Ok(Readiness::TimedOut)
    }

    async fn call<T>(
        &self,
        ctx: &SessionContext,
        request: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, StepError> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(StepError::Cancelled),
            result = request => result.map_err(StepError::from),
        }
    }
}

#[async_trait]
impl LedgerSigningApi for LedgerSigner {
    async fn sign_transactions(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        transactions: &[Transaction],
    ) -> SigningResult<Vec<Signature>> {
        let outcome = self
            .run(ctx, path, LedgerOperation::Transactions(transactions.to_vec()))
            .await?;
        Ok(outcome.map(|session| session.signatures().to_vec()))
    }

    async fn sign_proof(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
        proof: &TonProofRequest,
    ) -> SigningResult<SignedProof> {
        match self.run(ctx, path, LedgerOperation::Proof(proof.clone())).await? {
            SigningOutcome::Completed(session) => session
                .signed_proof()
                .map(SigningOutcome::Completed)
                .ok_or_else(|| SigningError::Unexpected("proof session ended without a signature".to_string())),
            SigningOutcome::Cancelled => Ok(SigningOutcome::Cancelled),
        }
    }

    async fn confirm_address(
        &self,
        ctx: &SessionContext,
        path: &DerivationPath,
    ) -> SigningResult<String> {
        match self.run(ctx, path, LedgerOperation::ConfirmAddress).await? {
            SigningOutcome::Completed(session) => session
                .address()
                .map(|address| SigningOutcome::Completed(address.to_string()))
                .ok_or_else(|| SigningError::Unexpected("address session ended without an address".to_string())),
            SigningOutcome::Cancelled => Ok(SigningOutcome::Cancelled),
        }
    }
}
