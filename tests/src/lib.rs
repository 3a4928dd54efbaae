//! # Signing Coordinator Test Suite
//!
//! Cross-crate tests that need more than one subsystem wired together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # shared wiring and request builders
//!     ├── codec_scenarios.rs   # frames through the animator and back
//!     ├── scan_sessions.rs     # correlation isolation, cancellation
//!     ├── ledger_flows.rs      # Ledger state machine over the bus
//!     └── gateway_flows.rs     # wallet → bus → device → wallet
//!
//! tests/benches/
//! └── codec_benchmarks.rs      # fixed-interval and fountain codecs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sc-tests
//! cargo test -p sc-tests integration::gateway_flows::
//! cargo bench -p sc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
