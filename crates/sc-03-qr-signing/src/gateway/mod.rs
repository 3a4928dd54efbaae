//! Bus gateway for signing requests.
//!
//! ```text
//! wallet ──RemoteSigner──→ emit(Signer|Keystone|Ledger{id}) ──→ SigningRequestHandler
//!    ↑                                                              │
//!    └──────────────── Response{id, signature | error} ←────────────┘
//! ```

pub mod handler;
pub mod remote;

pub use handler::{SigningHandlerHandle, SigningRequestHandler};
pub use remote::RemoteSigner;
