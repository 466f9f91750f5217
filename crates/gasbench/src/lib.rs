//! Gas benchmarking harness for on-chain verifiable randomness protocols.
//!
//! Drives many repetitions of each protocol's transaction sequence against deployed contracts,
//! extracts the gas of every step from events or receipts, and aggregates per-operation totals,
//! averages and raw series.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod client;
pub mod contracts;
pub mod protocols;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod gas;
pub use gas::*;

mod metrics;
pub use metrics::*;

mod report;
pub use report::*;

mod runner;
pub use runner::*;

mod synth;
pub use synth::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
