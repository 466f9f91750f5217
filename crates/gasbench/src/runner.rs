//! Run orchestration.
//!
//! The [`Runner`] resolves every address up front, hands out accounts, and drives each selected
//! protocol for the configured number of runs. Protocols run one after another by default, or
//! interleaved on the current task with [`RunConfig::concurrent`]. Every protocol owns its own
//! [`Aggregator`], so concurrent protocols never write to the same series.

use std::time::Instant;

use alloy_primitives::Address;
use futures::future::join_all;
use tracing::info;

use crate::{
    client::{BenchContract, ChainClient},
    config::AddressBook,
    error::{BenchError, ConfigError, Result},
    gas::GasSource,
    metrics::Aggregator,
    protocols::{
        drive_sequential, CryptoOpsDriver, DriverContext, DvrfDriver, FlexiRandDriver,
        InstaRandDriver, Protocol, StorageOpsDriver, VrfDriver,
    },
    report::{ProtocolReport, Report},
    synth::InputFactory,
};

/// Default repetition count per protocol.
pub const DEFAULT_RUNS: usize = 10;

/// What to benchmark and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Repetitions per protocol.
    pub runs: usize,
    /// Protocols to benchmark, in order. Empty selects every protocol.
    pub protocols: Vec<Protocol>,
    /// Run the selected protocols concurrently on disjoint accounts.
    pub concurrent: bool,
    /// Seed of the input synthesizer; random when `None`.
    pub seed: Option<u64>,
    /// Forces one gas source for every protocol.
    pub gas_source: Option<GasSource>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            protocols: Vec::new(),
            concurrent: false,
            seed: None,
            gas_source: None,
        }
    }
}

impl RunConfig {
    /// Selected protocols with duplicates removed, or every protocol when none is selected.
    pub fn selected(&self) -> Vec<Protocol> {
        if self.protocols.is_empty() {
            return Protocol::ALL.to_vec();
        }
        let mut selected = Vec::with_capacity(self.protocols.len());
        for &protocol in &self.protocols {
            if !selected.contains(&protocol) {
                selected.push(protocol);
            }
        }
        selected
    }

    /// Gas source used for `protocol`.
    pub fn gas_source_for(&self, protocol: Protocol) -> GasSource {
        self.gas_source.unwrap_or(protocol.default_gas_source())
    }

    /// Accounts needed to run `protocols` under this configuration.
    pub fn accounts_needed(&self, protocols: &[Protocol]) -> usize {
        let per_protocol = protocols.iter().map(|p| p.accounts_needed());
        if self.concurrent {
            per_protocol.sum()
        } else {
            per_protocol.max().unwrap_or(0)
        }
    }
}

/// Everything one protocol benchmark needs, fixed before any transaction is sent.
#[derive(Debug)]
struct BenchUnit {
    protocol: Protocol,
    address: Address,
    accounts: Vec<Address>,
    inputs: InputFactory,
    gas_source: GasSource,
}

/// Drives the selected protocols against a chain.
#[derive(Debug)]
pub struct Runner<'a, C> {
    client: &'a C,
    addresses: &'a AddressBook,
    config: RunConfig,
}

impl<'a, C: ChainClient> Runner<'a, C> {
    /// Creates a runner.
    pub const fn new(client: &'a C, addresses: &'a AddressBook, config: RunConfig) -> Self {
        Self { client, addresses, config }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every selected protocol to completion and returns the aggregated report.
    ///
    /// Only configuration and account discovery errors abort the run; per-step failures show
    /// up as shorter series in the report.
    pub async fn run(&self) -> Result<Report> {
        let units = self.plan().await?;
        let runs = self.config.runs;

        let protocols = if self.config.concurrent {
            join_all(units.into_iter().map(|unit| self.run_protocol(unit))).await
        } else {
            let mut reports = Vec::with_capacity(units.len());
            for unit in units {
                reports.push(self.run_protocol(unit).await);
            }
            reports
        };

        Ok(Report { runs, protocols })
    }

    /// Resolves addresses, allocates accounts and forks one input factory per protocol.
    async fn plan(&self) -> Result<Vec<BenchUnit>> {
        let protocols = self.config.selected();
        let addresses = protocols
            .iter()
            .map(|&protocol| self.addresses.address(protocol))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let accounts = self.client.accounts().await.map_err(BenchError::Accounts)?;
        let needed = self.config.accounts_needed(&protocols);
        if accounts.len() < needed {
            return Err(ConfigError::NotEnoughAccounts { needed, available: accounts.len() }.into());
        }

        let mut root = self.config.seed.map_or_else(InputFactory::new, InputFactory::seeded);
        let mut next_account = 0;
        let units = protocols
            .into_iter()
            .zip(addresses)
            .map(|(protocol, address)| {
                let count = protocol.accounts_needed();
                let start = if self.config.concurrent { next_account } else { 0 };
                next_account += count;
                BenchUnit {
                    protocol,
                    address,
                    accounts: accounts[start..start + count].to_vec(),
                    inputs: root.fork(),
                    gas_source: self.config.gas_source_for(protocol),
                }
            })
            .collect();
        Ok(units)
    }

    async fn run_protocol(&self, unit: BenchUnit) -> ProtocolReport {
        let BenchUnit { protocol, address, accounts, inputs, gas_source } = unit;
        info!(
            target: "gasbench::runner",
            %protocol,
            %address,
            %gas_source,
            runs = self.config.runs,
            "Benchmarking"
        );
        let started = Instant::now();

        let mut metrics = Aggregator::new(self.config.runs, protocol.operations());
        let contract = BenchContract::new(self.client, address);
        let account = accounts[0];
        let cx = DriverContext::new(contract, account, inputs, gas_source);
        match protocol {
            Protocol::Vrf => drive_sequential(&mut VrfDriver::new(cx), &mut metrics).await,
            Protocol::Dvrf => drive_sequential(&mut DvrfDriver::new(cx), &mut metrics).await,
            Protocol::InstaRand => {
                drive_sequential(&mut InstaRandDriver::new(cx), &mut metrics).await
            }
            Protocol::FlexiRand => {
                drive_sequential(&mut FlexiRandDriver::new(cx), &mut metrics).await
            }
            Protocol::StorageOperations => {
                drive_sequential(&mut StorageOpsDriver::new(cx), &mut metrics).await
            }
            Protocol::CryptoOperations => {
                CryptoOpsDriver::new(contract, accounts, cx.inputs, gas_source)
                    .run(&mut metrics)
                    .await
            }
        }

        let report = ProtocolReport::new(protocol, gas_source, &metrics);
        let samples: usize = report.operations.iter().map(|s| s.samples).sum();
        info!(
            target: "gasbench::runner",
            %protocol,
            samples,
            elapsed = ?started.elapsed(),
            "Finished"
        );
        report
    }
}
