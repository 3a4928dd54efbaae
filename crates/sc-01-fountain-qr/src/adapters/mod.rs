//! Adapters for the QR codec ports.

pub mod recording;

pub use recording::RecordingSurface;
