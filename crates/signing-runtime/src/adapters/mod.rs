//! Adapters connecting subsystems.
//!
//! - `ledger`: exposes the Ledger signer as the request handler's backend
//! - `surface`: presentation surface decorator that logs operator notices

pub mod ledger;
pub mod surface;

pub use ledger::LedgerBackendAdapter;
pub use surface::LoggingSurface;
