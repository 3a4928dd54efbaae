//! Simulated external signers.

pub mod simulated;

pub use simulated::{simulated_signature, SimulatedKeystone, SimulatedSigner};
