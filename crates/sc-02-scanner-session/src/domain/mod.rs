//! Domain types for scanner sessions.

pub mod errors;
pub mod session;

pub use errors::{ReaderError, ScanError};
pub use session::{scanned_value, ScanSession};
