//! Test utilities for the gas benchmark harness.

mod mock_chain;

pub use mock_chain::*;
