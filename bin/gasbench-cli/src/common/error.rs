use gasbench::{BenchError, ConfigError, SynthesisError};

/// Error types for the gasbench commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Fatal benchmark error
    #[error("{0}")]
    Bench(#[from] BenchError),

    /// Invalid configuration (address book, RPC endpoint)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid input synthesis request
    #[error("Input synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to set up logging
    #[error("Failed to create log file: {0}")]
    LogFile(#[from] std::io::Error),
}

/// Result type for the gasbench commands
pub type Result<T> = std::result::Result<T, CliError>;
