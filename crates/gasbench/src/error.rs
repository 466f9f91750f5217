//! Error taxonomy of the benchmark harness.
//!
//! Only [`SynthesisError`] and [`ConfigError`] are fatal; they surface as [`BenchError`]. Every
//! per-call failure is a [`StepError`] and stays confined to its own iteration and operation.

use alloy_primitives::{Address, TxHash, U256};
use alloy_transport::TransportError;

/// Invalid size or shape requested from the input synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// Random byte strings must be at least one byte long.
    #[error("invalid random value length: {0} bytes")]
    InvalidLength(usize),
}

/// Missing or malformed configuration, detected before any transaction is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The address book has no entry for a protocol under test.
    #[error("no deployed address configured for `{0}`")]
    MissingAddress(&'static str),

    /// The RPC endpoint is not a valid URL.
    #[error("invalid RPC URL {0}")]
    InvalidRpcUrl(String),

    /// The address book could not be read.
    #[error("failed to read address book: {0}")]
    Read(#[from] std::io::Error),

    /// The address book is not a valid JSON object of addresses.
    #[error("invalid address book: {0}")]
    Parse(#[from] serde_json::Error),

    /// The node exposes fewer accounts than the selected benchmarks need.
    #[error("{needed} accounts required, node exposes {available}")]
    NotEnoughAccounts {
        /// Accounts required by the selected protocols.
        needed: usize,
        /// Accounts returned by the node.
        available: usize,
    },
}

/// The network or contract rejected a call or failed to confirm it.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// JSON-RPC transport failure.
    #[error("RPC transport error: {0}")]
    Transport(#[from] TransportError),

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} to {to} reverted")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: TxHash,
        /// Contract that reverted.
        to: Address,
    },

    /// A read-only call reverted.
    #[error("call to {0} reverted")]
    CallReverted(Address),

    /// No receipt appeared before the configured deadline.
    #[error("no receipt for {0} before timeout")]
    ReceiptTimeout(TxHash),

    /// Return data did not match the expected ABI layout.
    #[error("failed to decode return data: {0}")]
    Decode(#[from] alloy_sol_types::Error),
}

/// An otherwise successful outcome lacks the expected event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// No log on the outcome decodes as the named event.
    #[error("event `{0}` not found on outcome")]
    MissingEvent(&'static str),

    /// The event's gas figure does not fit in 64 bits.
    #[error("event `{0}` reports gas {1} beyond the u64 range")]
    GasOutOfRange(&'static str, U256),
}

/// Failure of a single protocol step. Recovered locally by the driver.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The submission or read-only call failed.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// The gas figure or a forwarded value could not be extracted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// An earlier step of the same iteration failed, so this one has no input.
    #[error("skipped: `{0}` did not complete")]
    Skipped(&'static str),

    /// The operation has no series to record into.
    #[error("operation `{0}` is not registered")]
    Unregistered(&'static str),
}

/// Fatal error that aborts the whole benchmark.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// Input synthesis failed.
    #[error("input synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The node's accounts could not be listed.
    #[error("failed to list accounts: {0}")]
    Accounts(#[source] SubmissionError),
}

/// Result type for fatal benchmark operations.
pub type Result<T, E = BenchError> = std::result::Result<T, E>;
