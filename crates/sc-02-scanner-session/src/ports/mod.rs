//! Ports for the scanner session manager.

pub mod outbound;

pub use outbound::QrReader;
