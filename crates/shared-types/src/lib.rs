//! # Shared Types Crate
//!
//! Identifiers, request/response payloads, the per-request
//! [`SessionContext`] and the signing error taxonomy shared by every crate in
//! the signing coordinator.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Closed payloads**: Each bus method carries exactly one payload type
//!   from [`ipc`]; no loosely-typed `params`.
//! - **Exactly-once resolution**: Every request resolves to one
//!   [`SigningOutcome`] or one [`SigningError`], never both and never twice.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use envelope::{CancelToken, SessionContext};
pub use errors::*;
pub use ipc::*;
