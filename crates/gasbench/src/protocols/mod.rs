//! Protocol drivers.
//!
//! Each driver encodes one protocol's call sequence and the values that flow from one step into
//! the next. Steps return `Result`s; a failed step is logged under its own label and only the
//! steps that need its output are skipped for that iteration.

use core::str::FromStr;

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use tracing::{debug, warn};

use crate::{
    client::{BenchContract, ChainClient},
    contracts::MeteredEvent,
    error::StepError,
    gas::{self, GasSource, Metered},
    metrics::{Aggregator, BenchmarkSeries},
    synth::InputFactory,
};

mod crypto_ops;
mod dvrf;
mod flexirand;
mod instarand;
mod storage_ops;
mod vrf;

pub use crypto_ops::*;
pub use dvrf::*;
pub use flexirand::*;
pub use instarand::*;
pub use storage_ops::*;
pub use vrf::*;

/// A benchmarked protocol.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Single-party DDH VRF.
    #[display("vrf")]
    Vrf,
    /// Distributed VRF.
    #[display("dvrf")]
    Dvrf,
    /// Two-phase instant VRF.
    #[display("instarand")]
    InstaRand,
    /// Blinded randomness protocol.
    #[display("flexirand")]
    FlexiRand,
    /// Primitive cryptographic operations.
    #[display("crypto-operations")]
    CryptoOperations,
    /// Storage primitives.
    #[display("storage-operations")]
    StorageOperations,
}

impl Protocol {
    /// Every protocol, in default benchmark order.
    pub const ALL: [Self; 6] = [
        Self::Vrf,
        Self::Dvrf,
        Self::InstaRand,
        Self::FlexiRand,
        Self::CryptoOperations,
        Self::StorageOperations,
    ];

    /// Key of the deployed address in the address book.
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Vrf => "vrf",
            Self::Dvrf => "dvrf",
            Self::InstaRand => "instarand",
            Self::FlexiRand => "flexirand",
            Self::CryptoOperations => "crypto_operations",
            Self::StorageOperations => "storage_operations",
        }
    }

    /// Reported operations, in report order.
    pub const fn operations(self) -> &'static [&'static str] {
        match self {
            Self::Vrf => VRF_OPERATIONS,
            Self::Dvrf => DVRF_OPERATIONS,
            Self::InstaRand => INSTARAND_OPERATIONS,
            Self::FlexiRand => FLEXIRAND_OPERATIONS,
            Self::CryptoOperations => CRYPTO_OPERATIONS,
            Self::StorageOperations => STORAGE_OPERATIONS,
        }
    }

    /// Distinct accounts the protocol submits from.
    pub const fn accounts_needed(self) -> usize {
        match self {
            Self::CryptoOperations => CryptoOperation::ALL.len(),
            _ => 1,
        }
    }

    /// Where gas is read from unless overridden.
    ///
    /// Protocol flows report whole-transaction gas; primitive and storage operations report the
    /// inner segment metered by the contract.
    pub const fn default_gas_source(self) -> GasSource {
        match self {
            Self::CryptoOperations | Self::StorageOperations => GasSource::Event,
            _ => GasSource::Receipt,
        }
    }
}

/// A protocol name that matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol `{0}`")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.to_string() == s || p.config_key() == s)
            .ok_or_else(|| UnknownProtocol(s.to_string()))
    }
}

/// Everything a driver needs to submit its steps.
#[derive(Debug)]
pub struct DriverContext<'a, C> {
    /// The protocol's deployed contract.
    pub contract: BenchContract<'a, C>,
    /// Account every step is submitted from.
    pub account: Address,
    /// Input source for this driver.
    pub inputs: InputFactory,
    /// Where gas is read from.
    pub gas_source: GasSource,
}

impl<'a, C: ChainClient> DriverContext<'a, C> {
    /// Creates a context.
    pub const fn new(
        contract: BenchContract<'a, C>,
        account: Address,
        inputs: InputFactory,
        gas_source: GasSource,
    ) -> Self {
        Self { contract, account, inputs, gas_source }
    }

    /// Submits `call` and records its gas under `operation` in `metrics`.
    ///
    /// An operation `metrics` does not know is rejected before anything is sent.
    pub async fn measure<E, T>(
        &self,
        run: usize,
        call: &T,
        metrics: &mut Aggregator,
        operation: &'static str,
    ) -> Result<Metered<E>, StepError>
    where
        E: MeteredEvent,
        T: SolCall,
    {
        let series = metrics.series_mut(operation).ok_or(StepError::Unregistered(operation))?;
        self.measure_into(run, call, series).await
    }

    /// Submits `call`, extracts its gas via `E` and appends it to `series` for `run`.
    pub async fn measure_into<E, T>(
        &self,
        run: usize,
        call: &T,
        series: &mut BenchmarkSeries,
    ) -> Result<Metered<E>, StepError>
    where
        E: MeteredEvent,
        T: SolCall,
    {
        let outcome = self.contract.submit(self.account, call).await?;
        let metered = gas::extract::<E>(&outcome, self.contract.address(), self.gas_source)?;
        let gas = metered.gas();
        series.record(run, gas);
        debug!(
            target: "gasbench::driver",
            operation = series.operation(),
            run,
            gas,
            tx_hash = %outcome.tx_hash,
            "Sample recorded"
        );
        Ok(metered)
    }

    /// Submits a one-off unmeasured setup call. Failure is logged, not propagated.
    pub async fn setup<T: SolCall>(&self, label: &'static str, call: &T) {
        match self.contract.submit(self.account, call).await {
            Ok(outcome) => {
                debug!(target: "gasbench::driver", label, tx_hash = %outcome.tx_hash, "Setup done")
            }
            Err(err) => warn!(target: "gasbench::driver", label, %err, "Setup failed"),
        }
    }
}

/// A protocol flow repeated once per run.
#[allow(async_fn_in_trait)]
pub trait ProtocolDriver {
    /// The driven protocol.
    const PROTOCOL: Protocol;

    /// One-off setup before the first iteration.
    async fn prepare(&mut self) {}

    /// Executes one full flow, recording every completed step into `metrics`.
    async fn run_iteration(&mut self, run: usize, metrics: &mut Aggregator);
}

/// Prepares `driver` and runs it `metrics.runs()` times, strictly one iteration after another.
pub async fn drive_sequential<D: ProtocolDriver>(driver: &mut D, metrics: &mut Aggregator) {
    driver.prepare().await;
    for run in 0..metrics.runs() {
        driver.run_iteration(run, metrics).await;
    }
}

/// Logs a failed step under its own label and discards the error.
pub(crate) fn observe<T>(
    protocol: Protocol,
    step: &'static str,
    run: usize,
    result: Result<T, StepError>,
) -> Option<T> {
    result
        .inspect_err(|err| {
            warn!(target: "gasbench::driver", %protocol, step, run, %err, "Step failed")
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{contracts::IVrf, test_utils::MockChain};
    use alloy_primitives::B256;

    #[test]
    fn protocol_parses_display_and_config_names() {
        for protocol in Protocol::ALL {
            assert_eq!(protocol.to_string().parse::<Protocol>(), Ok(protocol));
            assert_eq!(protocol.config_key().parse::<Protocol>(), Ok(protocol));
        }
        assert_eq!(
            "bls".parse::<Protocol>(),
            Err(UnknownProtocol("bls".to_string()))
        );
    }

    #[test]
    fn operation_tables_are_complete() {
        assert_eq!(Protocol::Vrf.operations(), &["request", "fulfill"]);
        assert_eq!(Protocol::InstaRand.operations(), &["key_reg", "pre_ver", "instant_ver"]);
        assert_eq!(Protocol::FlexiRand.operations().len(), 4);
        assert_eq!(Protocol::CryptoOperations.operations().len(), 6);
        assert_eq!(Protocol::StorageOperations.operations().len(), 5);
        assert_eq!(Protocol::CryptoOperations.accounts_needed(), 6);
    }

    #[tokio::test]
    async fn unregistered_operation_is_rejected_before_sending() {
        let chain = MockChain::new(1);
        let vrf = chain.deploy(Protocol::Vrf);
        let account = chain.accounts().await.unwrap()[0];
        let cx = DriverContext::new(
            BenchContract::new(&chain, vrf),
            account,
            InputFactory::seeded(1),
            GasSource::Event,
        );
        let mut metrics = Aggregator::new(1, &["request"]);
        let call = IVrf::reqCall { x: B256::ZERO };

        let rejected = cx.measure::<IVrf::ReqGen, _>(0, &call, &mut metrics, "verify").await;
        assert!(matches!(rejected, Err(StepError::Unregistered("verify"))));
        assert!(chain.journal().is_empty());

        let measured = cx.measure::<IVrf::ReqGen, _>(0, &call, &mut metrics, "request").await;
        assert_eq!(measured.unwrap().gas(), 48_000);
        assert_eq!(metrics.series("request").unwrap().values(), vec![48_000]);
    }
}
