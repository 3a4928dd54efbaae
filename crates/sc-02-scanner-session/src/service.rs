//! # Scanner Session Manager
//!
//! Turns "scan this QR" into one bus round trip:
//!
//! ```text
//! trigger() ──→ on(Response) ──→ emit(Scan{id}) ──→ camera
//!                    ↑                                 │
//!                    └──── Response{id, params} ───────┘
//! ```
//!
//! A trigger owns at most one outstanding scan. Re-triggering replaces it, so
//! a late answer to the old id is ignored.

use crate::domain::{scanned_value, ScanError, ScanSession};
use parking_lot::Mutex;
use shared_bus::{BusMessage, CorrelationBus, EventFilter, Method};
use shared_types::entities::CorrelationId;
use shared_types::ipc::{ResponseError, ResponsePayload};
use shared_types::SessionContext;
use signing_telemetry::SCANS_REQUESTED;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Callback invoked with the response to a triggered scan.
pub type ScanCallback = Arc<dyn Fn(Result<ResponsePayload, ResponseError>) + Send + Sync>;

/// Issues scan requests over the correlation bus.
#[derive(Clone)]
pub struct ScannerSessionManager {
    bus: Arc<CorrelationBus>,
}

impl ScannerSessionManager {
    /// Manager issuing requests on `bus`.
    pub fn new(bus: Arc<CorrelationBus>) -> Self {
        Self { bus }
    }

    /// The bus requests are issued on.
    pub fn bus(&self) -> &Arc<CorrelationBus> {
        &self.bus
    }

    /// Prepare a scan whose response is delivered to `on_result`.
    ///
    /// Nothing is emitted until [`ScanTrigger::trigger`] is called.
    pub fn request_scan<F>(&self, on_result: F) -> ScanTrigger
    where
        F: Fn(Result<ResponsePayload, ResponseError>) + Send + Sync + 'static,
    {
        ScanTrigger {
            bus: Arc::clone(&self.bus),
            on_result: Arc::new(on_result),
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Scan once under `ctx.correlation_id()` and wait for the value.
    ///
    /// Resolves with `ScanError::Cancelled` as soon as the context is
    /// cancelled; the response subscription is removed either way.
    pub async fn scan(&self, ctx: &SessionContext) -> Result<String, ScanError> {
        if ctx.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let id = ctx.correlation_id();
        let mut responses = self.bus.subscribe(EventFilter::response_to(id));

        SCANS_REQUESTED.inc();
        self.bus.emit(BusMessage::Scan { id });
        debug!(correlation_id = %id, "Scan requested");

        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!(correlation_id = %id, "Scan cancelled");
                Err(ScanError::Cancelled)
            }
            message = responses.recv() => match message {
                Some(BusMessage::Response { params, .. }) => scanned_value(params),
                Some(other) => Err(ScanError::UnexpectedResponse(other.method().as_str().to_string())),
                None => Err(ScanError::Closed),
            },
        }
    }

    /// Scan once under a fresh id that shares `ctx`'s cancel signal.
    pub async fn scan_next(&self, ctx: &SessionContext) -> Result<String, ScanError> {
        let step = ctx.next_step(self.bus.next_correlation_id());
        self.scan(&step).await
    }
}

/// Handle for a callback-style scan.
///
/// Dropping the trigger cancels any outstanding scan.
pub struct ScanTrigger {
    bus: Arc<CorrelationBus>,
    on_result: ScanCallback,
    session: Arc<Mutex<Option<ScanSession>>>,
}

impl ScanTrigger {
    /// Emit a new scan request under a fresh correlation id.
    pub fn trigger(&self) -> CorrelationId {
        let id = self.bus.next_correlation_id();
        self.trigger_as(id);
        id
    }

    /// Emit a new scan request under `id`, replacing the outstanding one.
    pub fn trigger_as(&self, id: CorrelationId) {
        self.cancel();

        let weak_bus: Weak<CorrelationBus> = Arc::downgrade(&self.bus);
        let session = Arc::clone(&self.session);
        let on_result = Arc::clone(&self.on_result);

        let handler = self.bus.on(Method::Response, move |message| {
            let BusMessage::Response { id: response_id, params } = message else {
                return;
            };

            let finished = {
                let mut current = session.lock();
                if current.as_ref().is_some_and(|active| active.scan_id == *response_id) {
                    current.take()
                } else {
                    None
                }
            };

            if let Some(active) = finished {
                if let Some(bus) = weak_bus.upgrade() {
                    bus.off(Method::Response, active.handler);
                }
                on_result(params.clone());
            }
        });

        *self.session.lock() = Some(ScanSession {
            scan_id: id,
            handler,
        });

        SCANS_REQUESTED.inc();
        self.bus.emit(BusMessage::Scan { id });
        info!(correlation_id = %id, "Scan triggered");
    }

    /// Correlation id of the outstanding scan, if any.
    pub fn pending(&self) -> Option<CorrelationId> {
        self.session.lock().map(|s| s.scan_id)
    }

    /// Drop the outstanding scan. Nothing is sent on the bus.
    pub fn cancel(&self) {
        let previous = self.session.lock().take();
        if let Some(active) = previous {
            self.bus.off(Method::Response, active.handler);
            debug!(correlation_id = %active.scan_id, "Scan abandoned");
        }
    }
}

impl Drop for ScanTrigger {
    fn drop(&mut self) {
        self.cancel();
    }
}
