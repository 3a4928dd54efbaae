//! # Shared Bus - Correlation Bus for Signing Requests
//!
//! Routes request envelopes (`scan`, `signer`, `keystone`, `ledger`) to the
//! components that fulfil them, and `response` envelopes back to whoever is
//! waiting on the matching correlation id.
//!
//! ## Request / Response Flow
//!
//! ```text
//! ┌──────────────┐   emit(Scan{id})    ┌──────────────┐
//! │  Requester   │ ──────┐             │ Camera / UI  │
//! │ (filters id) │       │             │              │
//! └──────────────┘       ▼             └──────────────┘
//!        ↑         ┌──────────────┐          │
//!        │         │ Correlation  │ ←────────┘
//!        └──────── │     Bus      │  emit(Response{id, params})
//!    on(Response)  └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - **Injected, not global:** every component receives an `Arc<CorrelationBus>`.
//! - **At-most-once:** no persistence, no replay.
//! - **Caller filters:** the bus delivers to every subscriber of a method;
//!   requesters MUST filter responses by their correlation id.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod correlation;
pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use correlation::CorrelationIdGenerator;
pub use events::{BusMessage, EventFilter, Method};
pub use publisher::{CorrelationBus, EventPublisher, Handler, HandlerId};
pub use subscriber::{EventStream, Subscription, SubscriptionError};
