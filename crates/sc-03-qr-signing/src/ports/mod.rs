//! Ports for QR-based signing.
//!
//! - `inbound`: what the request handler (or a wallet screen) calls
//! - `outbound`: the hardware signer the request handler delegates Ledger
//!   requests to

pub mod inbound;
pub mod outbound;

pub use inbound::QrSigningApi;
pub use outbound::LedgerBackend;
