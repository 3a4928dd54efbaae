//! Ports for the Ledger signer.
//!
//! - `inbound`: what the request handler (or a wallet screen) calls
//! - `outbound`: the USB/BLE transport to the device

pub mod inbound;
pub mod outbound;

pub use inbound::LedgerSigningApi;
pub use outbound::HardwareTransport;
