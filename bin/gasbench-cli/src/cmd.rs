use clap::Parser;

/// Main command enumeration for the gasbench CLI tool
#[derive(Parser, Debug)]
#[command(name = "gasbench", infer_subcommands = true, version)]
pub enum MainCmd {
    /// Benchmark protocol flows against deployed contracts
    Bench(crate::bench::Cmd),
    /// Print freshly synthesized call arguments as JSON
    Inputs(crate::inputs::Cmd),
}

/// Error types for the main command system
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command error
    #[error("{0}")]
    Cli(#[from] crate::common::CliError),
}

impl MainCmd {
    /// Execute the main command
    pub async fn run(&self) -> Result<(), Error> {
        match self {
            Self::Bench(cmd) => cmd.run().await?,
            Self::Inputs(cmd) => cmd.run()?,
        }
        Ok(())
    }
}
