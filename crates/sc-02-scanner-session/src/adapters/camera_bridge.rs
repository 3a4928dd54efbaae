//! # Camera Bridge
//!
//! Answers `Scan` requests from a [`QrReader`]: every request gets exactly one
//! `Response` addressed to its id. The camera performs one read at a time;
//! requests that arrive during a read are answered with that read's result.

use crate::ports::QrReader;
use shared_bus::{BusMessage, CorrelationBus, EventFilter, Method};
use shared_types::ipc::{ResponseError, ResponsePayload};
use shared_types::CancelToken;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Connects a camera to the correlation bus.
pub struct CameraBridge {
    bus: Arc<CorrelationBus>,
    reader: Arc<dyn QrReader>,
}

impl CameraBridge {
    /// Bridge `reader` onto `bus`.
    pub fn new(bus: Arc<CorrelationBus>, reader: Arc<dyn QrReader>) -> Self {
        Self { bus, reader }
    }

    /// Start serving scan requests.
    ///
    /// The subscription is registered before this returns, so a scan emitted
    /// right after `start` is never missed.
    pub fn start(self) -> CameraBridgeHandle {
        let stop = CancelToken::new();
        let task_stop = stop.clone();
        let mut requests = self.bus.subscribe(EventFilter::methods(vec![Method::Scan]));

        let task = tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    biased;
                    _ = task_stop.cancelled() => break,
                    message = requests.recv() => message,
                };
                let Some(BusMessage::Scan { id }) = message else {
                    break;
                };

                let params: Result<ResponsePayload, ResponseError> = tokio::select! {
                    biased;
                    _ = task_stop.cancelled() => Err(ResponseError::Cancelled),
                    read = self.reader.read() => read
                        .map(ResponsePayload::Scanned)
                        .map_err(ResponseError::from),
                };

                if let Err(error) = &params {
                    warn!(correlation_id = %id, ?error, "Camera read failed");
                } else {
                    debug!(correlation_id = %id, "Camera read a QR value");
                }

                // Requests queued while the camera was busy share this read.
                // The one being served may belong to a session that has
                // already been cancelled.
                let mut waiting = vec![id];
                while let Ok(Some(BusMessage::Scan { id })) = requests.try_recv() {
                    waiting.push(id);
                }
                if waiting.len() > 1 {
                    debug!(requests = waiting.len(), "Answering queued scan requests");
                }
                for id in waiting {
                    self.bus.emit(BusMessage::response(id, params.clone()));
                }
            }
            debug!("Camera bridge stopped");
        });

        CameraBridgeHandle {
            stop,
            task: Some(task),
        }
    }
}

/// Running camera bridge. Dropping the handle stops it.
pub struct CameraBridgeHandle {
    stop: CancelToken,
    task: Option<JoinHandle<()>>,
}

impl CameraBridgeHandle {
    /// Stop serving and wait for the bridge task to exit.
    pub async fn shutdown(mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Camera bridge task failed");
            }
        }
    }
}

impl Drop for CameraBridgeHandle {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
