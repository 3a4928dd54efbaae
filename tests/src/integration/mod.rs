//! Integration flows across the signing coordinator crates.

pub mod fixtures;

#[cfg(test)]
mod codec_scenarios;
#[cfg(test)]
mod gateway_flows;
#[cfg(test)]
mod ledger_flows;
#[cfg(test)]
mod scan_sessions;
