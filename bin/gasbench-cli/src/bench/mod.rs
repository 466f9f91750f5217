//! Benchmark command.
//!
//! Loads the address book, connects to the node and drives the selected protocols, then prints
//! the aggregated report.

mod cmd;

pub use cmd::*;
