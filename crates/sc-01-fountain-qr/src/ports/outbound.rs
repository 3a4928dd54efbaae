//! Driven Ports (SPI - Outbound Dependencies)

/// Notices shown next to the QR code while a signing request is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum SigningNotice {
    /// The operator scanned a code that does not belong to this request.
    WrongCode {
        /// Human-readable description of what was expected.
        reason: String,
    },
    /// A multi-part response is being collected.
    ScanProgress {
        /// Fraction recovered so far, in `[0, 1]`.
        fraction: f64,
    },
    /// The signature was received; the QR can be dismissed.
    Completed,
    /// The request was abandoned.
    Cancelled,
}

/// The screen that shows QR frames to an external signer.
///
/// Implementations must be cheap: `render_qr` is called on every frame tick.
pub trait PresentationSurface: Send + Sync {
    /// Replace the displayed QR value.
    fn render_qr(&self, value: &str);

    /// Show a notice to the operator. Ignored by default.
    fn notify(&self, _notice: SigningNotice) {}
}
