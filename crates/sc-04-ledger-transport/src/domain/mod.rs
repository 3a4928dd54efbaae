//! Domain layer for the Ledger signing state machine.

pub mod errors;
pub mod readiness;
pub mod session;

pub use errors::{status, TransportError};
pub use readiness::{Readiness, RetryPolicy};
pub use session::{ConnectStep, LedgerEvent, LedgerOperation, LedgerSigningSession, SessionSnapshot};
