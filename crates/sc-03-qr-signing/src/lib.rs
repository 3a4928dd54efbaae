//! # QR Signing Protocols
//!
//! Signing with external devices that only talk through QR codes.
//!
//! | Device | Request | Response |
//! |--------|---------|----------|
//! | Signer app | `tonsign://` deep link, fixed-interval frames | one QR, hex signature |
//! | Keystone | `UR:TON-SIGN-REQUEST` fountain frames | `UR:TON-SIGNATURE` fountain frames |
//!
//! [`QrSigningService`] runs either protocol against a presentation surface
//! and the scanner. The [`gateway`] module exposes signing as bus requests:
//! [`RemoteSigner`] on the wallet side, [`SigningRequestHandler`] on the UI
//! side.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod gateway;
pub mod ports;
pub mod service;

pub use adapters::{simulated_signature, SimulatedKeystone, SimulatedSigner};
pub use domain::{KeystoneSignature, KEYSTONE_REQUEST_TYPE, KEYSTONE_SIGNATURE_TYPE, SIGNER_SCHEME};
pub use gateway::{RemoteSigner, SigningHandlerHandle, SigningRequestHandler};
pub use ports::{LedgerBackend, QrSigningApi};
pub use service::QrSigningService;
