//! # Ledger Transport
//!
//! Signing on a Ledger hardware wallet over a USB/BLE APDU transport.
//!
//! ## Session
//!
//! ```text
//! Connect → OpenTon → ConfirmTx (× N) → AllCompleted
//!    ↑_________ retry / permission page closed _________|
//! ```
//!
//! - Exchanges are strictly sequential: transaction N+1 is never sent before
//!   N is signed.
//! - A refusal on the device (`0x6985`, or the TON app's `0x5501`) resolves
//!   the request as `Cancelled` and is never retried.
//! - Connectivity failures mark the session errored; a retry restarts from
//!   `Connect` and keeps the signatures collected so far.
//! - Waiting for the TON app to open is a bounded exponential backoff.
//!
//! [`LedgerSigner`] publishes a [`SessionSnapshot`] after every transition.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{LedgerCall, SimulatedLedger};
pub use config::LedgerConfig;
pub use domain::{
    status, ConnectStep, LedgerEvent, LedgerOperation, LedgerSigningSession, Readiness,
    RetryPolicy, SessionSnapshot, TransportError,
};
pub use ports::{HardwareTransport, LedgerSigningApi};
pub use service::LedgerSigner;
