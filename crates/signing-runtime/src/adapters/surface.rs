//! Logging presentation surface.

use sc_01_fountain_qr::{PresentationSurface, SigningNotice};
use std::sync::Arc;
use tracing::{info, trace, warn};

/// Forwards to an inner surface and logs every notice.
pub struct LoggingSurface {
    inner: Arc<dyn PresentationSurface>,
}

impl LoggingSurface {
    pub fn new(inner: Arc<dyn PresentationSurface>) -> Self {
        Self { inner }
    }
}

impl PresentationSurface for LoggingSurface {
    fn render_qr(&self, value: &str) {
        trace!(len = value.len(), "Rendering QR frame");
        self.inner.render_qr(value);
    }

    fn notify(&self, notice: SigningNotice) {
        match &notice {
            SigningNotice::WrongCode { reason } => warn!(%reason, "Wrong QR code scanned"),
            SigningNotice::ScanProgress { fraction } => {
                info!(progress = format!("{:.0}%", fraction * 100.0), "Scanning response")
            }
            SigningNotice::Completed => info!("Signature received"),
            SigningNotice::Cancelled => info!("Signing cancelled"),
        }
        self.inner.notify(notice);
    }
}
