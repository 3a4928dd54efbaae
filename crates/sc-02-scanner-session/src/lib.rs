//! # Scanner Session Manager
//!
//! One logical "scan this QR" request at a time, expressed as a round trip on
//! the correlation bus.
//!
//! ## Two Forms
//!
//! - **Callback**: [`ScannerSessionManager::request_scan`] returns a
//!   [`ScanTrigger`]; each `trigger()` replaces the outstanding scan.
//! - **Async**: [`ScannerSessionManager::scan`] awaits one round trip under a
//!   [`SessionContext`](shared_types::SessionContext), racing its cancel signal.
//!
//! The camera side is served by [`CameraBridge`], which answers each `Scan`
//! request from a [`QrReader`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{CameraBridge, CameraBridgeHandle, ChannelReader, QrFeed, ScriptedReader};
pub use domain::{ReaderError, ScanError, ScanSession};
pub use ports::QrReader;
pub use service::{ScanCallback, ScanTrigger, ScannerSessionManager};
