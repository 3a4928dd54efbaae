//! # Frame Sources
//!
//! An encoder exposes its output as an unbounded sequence of frame values.

/// Which encoding produced a frame (metrics label).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrScheme {
    /// Fixed-size chunks cycled in order.
    Fixed,
    /// Self-describing fountain parts.
    Fountain,
}

impl QrScheme {
    /// Stable label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Fountain => "fountain",
        }
    }
}

/// An infinite, restartable producer of QR frame values.
pub trait FrameSource: Send {
    /// The next frame to display.
    fn next_frame(&mut self) -> String;

    /// True when the payload fits in a single frame that never rotates.
    fn is_static(&self) -> bool;

    /// Restart the sequence from its first frame.
    fn reset(&mut self);

    /// Encoding scheme of the frames.
    fn scheme(&self) -> QrScheme;
}
