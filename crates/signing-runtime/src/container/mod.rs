//! # Signing Runtime Container
//!
//! Builds every service around one shared [`CorrelationBus`] and starts the
//! bus-facing tasks.
//!
//! ```text
//!  RemoteSigner ──Signer/Keystone/Ledger──→ SigningRequestHandler
//!                                              │            │
//!                                   QrSigningService   LedgerBackendAdapter
//!                                     │        │              │
//!                         QrAnimator ─┘        └─ Scan ──→ CameraBridge
//!                              │                               │
//!                     PresentationSurface                  QrReader
//! ```

pub mod config;

pub use config::{ConfigError, CoordinatorConfig, CONFIG_ENV};

use crate::adapters::{LedgerBackendAdapter, LoggingSurface};
use sc_01_fountain_qr::{PresentationSurface, QrAnimator};
use sc_02_scanner_session::{CameraBridge, CameraBridgeHandle, QrReader, ScannerSessionManager};
use sc_03_qr_signing::{QrSigningService, RemoteSigner, SigningHandlerHandle, SigningRequestHandler};
use sc_04_ledger_transport::{HardwareTransport, LedgerSigner};
use shared_bus::CorrelationBus;
use std::sync::Arc;
use tracing::info;

/// External devices the runtime talks to.
pub struct Peripherals {
    /// Screen showing QR frames.
    pub surface: Arc<dyn PresentationSurface>,
    /// Camera reading QR codes.
    pub camera: Arc<dyn QrReader>,
    /// USB/BLE link to a Ledger.
    pub ledger: Arc<dyn HardwareTransport>,
}

/// Running signing coordinator.
pub struct SigningRuntime {
    bus: Arc<CorrelationBus>,
    qr: Arc<QrSigningService>,
    ledger: Arc<LedgerSigner>,
    camera: Option<CameraBridgeHandle>,
    handler: Option<SigningHandlerHandle>,
}

impl SigningRuntime {
    /// Wire the services and start serving requests.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &CoordinatorConfig, peripherals: Peripherals) -> Self {
        let bus = Arc::new(CorrelationBus::new());

        let surface: Arc<dyn PresentationSurface> =
            Arc::new(LoggingSurface::new(peripherals.surface));
        let qr = Arc::new(QrSigningService::new(
            ScannerSessionManager::new(Arc::clone(&bus)),
            QrAnimator::new(surface),
            config.codec.clone(),
        ));
        let ledger = Arc::new(LedgerSigner::new(peripherals.ledger, config.ledger.clone()));

        let camera = CameraBridge::new(Arc::clone(&bus), peripherals.camera).start();
        let handler = SigningRequestHandler::new(Arc::clone(&bus), qr.clone())
            .with_ledger(Arc::new(LedgerBackendAdapter::new(Arc::clone(&ledger))))
            .start();

        info!(
            fragment_size = config.codec.fragment_size,
            fountain_fragment_len = config.codec.fountain_fragment_len,
            readiness_attempts = config.ledger.readiness.max_attempts,
            "Signing runtime started"
        );

        Self {
            bus,
            qr,
            ledger,
            camera: Some(camera),
            handler: Some(handler),
        }
    }

    /// The shared bus.
    pub fn bus(&self) -> Arc<CorrelationBus> {
        Arc::clone(&self.bus)
    }

    /// Wallet-side gateway emitting signing requests on the bus.
    pub fn remote(&self) -> RemoteSigner {
        RemoteSigner::new(Arc::clone(&self.bus))
    }

    /// QR signing service, for direct (non-bus) use.
    pub fn qr(&self) -> Arc<QrSigningService> {
        Arc::clone(&self.qr)
    }

    /// Ledger signer: progress, retry and permission-page hooks.
    pub fn ledger(&self) -> Arc<LedgerSigner> {
        Arc::clone(&self.ledger)
    }

    /// Cancel the request being served (the operator closed the modal).
    pub fn cancel_current(&self) -> bool {
        self.handler
            .as_ref()
            .is_some_and(SigningHandlerHandle::cancel_current)
    }

    /// Stop the request handler, then the camera bridge.
    pub async fn shutdown(mut self) {
        info!("Shutting down signing runtime");
        if let Some(handler) = self.handler.take() {
            handler.shutdown().await;
        }
        if let Some(camera) = self.camera.take() {
            camera.shutdown().await;
        }
        info!("Signing runtime stopped");
    }
}
