use std::{path::PathBuf, time::Duration};

use clap::Parser;
use gasbench::{
    client::{ReceiptPolling, RpcClient},
    protocols::Protocol,
    AddressBook, GasSource, RunConfig, Runner, DEFAULT_RUNS,
};
use tracing::info;

use crate::common::{print_report, LogArgs, ReportFormat, Result};

/// Where gas figures are read from, overriding each protocol's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GasSourceArg {
    /// The `gas` field of the operation's event
    Event,
    /// The transaction receipt's `gasUsed`
    Receipt,
}

impl From<GasSourceArg> for GasSource {
    fn from(arg: GasSourceArg) -> Self {
        match arg {
            GasSourceArg::Event => Self::Event,
            GasSourceArg::Receipt => Self::Receipt,
        }
    }
}

/// Benchmark protocol flows against deployed contracts
#[derive(Parser, Debug)]
pub struct Cmd {
    /// RPC URL of a node that signs for its own accounts
    #[arg(long = "rpc", env = "GASBENCH_RPC", default_value = "http://localhost:8545")]
    pub rpc: String,

    /// JSON file mapping protocol keys to deployed contract addresses
    #[arg(long = "addresses", env = "GASBENCH_ADDRESSES", value_name = "FILE")]
    pub addresses: PathBuf,

    /// Repetitions per protocol
    #[arg(long = "runs", short = 'n', default_value_t = DEFAULT_RUNS)]
    pub runs: usize,

    /// Protocol to benchmark; repeat to select several. Defaults to all protocols.
    #[arg(long = "protocol", short = 'p', value_name = "PROTOCOL")]
    pub protocols: Vec<Protocol>,

    /// Benchmark the selected protocols concurrently on disjoint accounts
    #[arg(long = "concurrent")]
    pub concurrent: bool,

    /// Seed for reproducible input synthesis
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Force one gas source for every protocol
    #[arg(long = "gas-source", value_enum)]
    pub gas_source: Option<GasSourceArg>,

    /// Report output format
    #[arg(long = "format", value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Delay between receipt polls, in milliseconds
    #[arg(long = "rpc.poll-interval-ms", default_value_t = 250)]
    pub poll_interval_ms: u64,

    /// Give up waiting for a receipt after this many seconds
    #[arg(long = "rpc.receipt-timeout-secs", default_value_t = 120)]
    pub receipt_timeout_secs: u64,

    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,
}

impl Cmd {
    /// Execute the benchmark command
    pub async fn run(&self) -> Result<()> {
        self.log_args.init()?;

        let addresses = AddressBook::load(&self.addresses)?;
        let client = RpcClient::connect_http(&self.rpc, self.polling())?;
        let config = self.run_config();
        info!(
            rpc = %self.rpc,
            runs = config.runs,
            concurrent = config.concurrent,
            "Starting benchmark"
        );

        let report = Runner::new(&client, &addresses, config).run().await?;
        print_report(&report, self.format)
    }

    /// Receipt polling configured on the command line.
    pub const fn polling(&self) -> ReceiptPolling {
        ReceiptPolling {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.receipt_timeout_secs),
        }
    }

    /// Run configuration selected on the command line.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            runs: self.runs,
            protocols: self.protocols.clone(),
            concurrent: self.concurrent,
            seed: self.seed,
            gas_source: self.gas_source.map(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cmd {
        Cmd::try_parse_from(std::iter::once("bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_select_every_protocol() {
        let cmd = parse(&["--addresses", "addresses.json"]);
        let config = cmd.run_config();

        assert_eq!(cmd.rpc, "http://localhost:8545");
        assert_eq!(config.runs, 10);
        assert_eq!(config.selected(), Protocol::ALL.to_vec());
        assert_eq!(config.gas_source, None);
        assert_eq!(cmd.format, ReportFormat::Text);
        assert_eq!(cmd.polling(), ReceiptPolling::default());
    }

    #[test]
    fn protocols_accept_both_spellings() {
        let cmd = parse(&[
            "--addresses",
            "addresses.json",
            "-p",
            "crypto_operations",
            "--protocol",
            "dvrf",
            "--protocol",
            "storage-operations",
            "--gas-source",
            "receipt",
            "--concurrent",
            "--seed",
            "42",
            "-n",
            "3",
        ]);
        let config = cmd.run_config();

        assert_eq!(
            config.protocols,
            vec![Protocol::CryptoOperations, Protocol::Dvrf, Protocol::StorageOperations]
        );
        assert_eq!(config.gas_source, Some(GasSource::Receipt));
        assert!(config.concurrent);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.runs, 3);
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        assert!(Cmd::try_parse_from(["bench", "--addresses", "a.json", "-p", "bls"]).is_err());
    }
}
