//! # Signing Runtime Library
//!
//! Wiring for the signing coordinator, exposed for the binary and for tests.
//!
//! - `container/` - configuration and service wiring
//! - `adapters/` - port implementations connecting subsystems
//! - `demo` - simulated round trips for every device kind

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod container;
pub mod demo;

pub use container::{ConfigError, CoordinatorConfig, Peripherals, SigningRuntime, CONFIG_ENV};
pub use demo::{run_demo, DemoReport, SimulatedPeripherals};
