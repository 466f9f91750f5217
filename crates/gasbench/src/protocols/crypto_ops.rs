//! Primitive cryptographic operations.
//!
//! The six operations share no on-chain state, so each runs its own loop from its own account
//! and the loops are interleaved. Within a loop, runs are strictly sequential.

use alloy_primitives::Address;
use futures::future::join_all;
use tracing::debug;

use super::{observe, DriverContext, Protocol};
use crate::{
    client::{BenchContract, ChainClient},
    contracts::ICryptoOperations,
    error::StepError,
    gas::GasSource,
    metrics::{Aggregator, BenchmarkSeries},
    synth::InputFactory,
};

type Measured = ICryptoOperations::GasMeasuredOperations;

pub(crate) const CRYPTO_OPERATIONS: &[&str] = &[
    CryptoOperation::Secp256k1HashToCurve.name(),
    CryptoOperation::DdhVrfVerification.name(),
    CryptoOperation::Bn254HashToCurve.name(),
    CryptoOperation::GlowVrfVerification.name(),
    CryptoOperation::VerifyPairingSignature.name(),
    CryptoOperation::BlsSigVerification.name(),
];

/// A metered primitive of the crypto operations contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CryptoOperation {
    /// Hash to a secp256k1 point.
    Secp256k1HashToCurve,
    /// DDH VRF proof verification.
    DdhVrfVerification,
    /// Hash to a BN254 G1 point.
    Bn254HashToCurve,
    /// BLS (GLOW) VRF verification over a string input.
    GlowVrfVerification,
    /// Bare pairing check of a BLS signature.
    VerifyPairingSignature,
    /// BLS signature verification over a string input.
    BlsSigVerification,
}

impl CryptoOperation {
    /// Every operation, in report order.
    pub const ALL: [Self; 6] = [
        Self::Secp256k1HashToCurve,
        Self::DdhVrfVerification,
        Self::Bn254HashToCurve,
        Self::GlowVrfVerification,
        Self::VerifyPairingSignature,
        Self::BlsSigVerification,
    ];

    /// Reported operation name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Secp256k1HashToCurve => "hash_to_secp256k1",
            Self::DdhVrfVerification => "ddh_vrf_verification",
            Self::Bn254HashToCurve => "hash_to_bn254_g1",
            Self::GlowVrfVerification => "glow_vrf_verification",
            Self::VerifyPairingSignature => "verify_pairing_signature",
            Self::BlsSigVerification => "bls_sig_ver_str",
        }
    }
}

/// Benchmarks every [`CryptoOperation`] concurrently, one account per operation.
#[derive(Debug)]
pub struct CryptoOpsDriver<'a, C> {
    contract: BenchContract<'a, C>,
    accounts: Vec<Address>,
    inputs: InputFactory,
    gas_source: GasSource,
}

impl<'a, C: ChainClient> CryptoOpsDriver<'a, C> {
    /// Creates a driver. `accounts` must hold one account per operation.
    pub fn new(
        contract: BenchContract<'a, C>,
        accounts: Vec<Address>,
        inputs: InputFactory,
        gas_source: GasSource,
    ) -> Self {
        debug_assert!(accounts.len() >= CryptoOperation::ALL.len());
        Self { contract, accounts, inputs, gas_source }
    }

    /// Runs every operation `metrics.runs()` times.
    pub async fn run(&mut self, metrics: &mut Aggregator) {
        let runs = metrics.runs();
        let units = CryptoOperation::ALL
            .into_iter()
            .zip(&self.accounts)
            .zip(metrics.all_series_mut())
            .map(|((operation, &account), series)| {
                let cx =
                    DriverContext::new(self.contract, account, self.inputs.fork(), self.gas_source);
                bench_operation(cx, operation, runs, series)
            })
            .collect::<Vec<_>>();
        join_all(units).await;
    }
}

async fn bench_operation<C: ChainClient>(
    mut cx: DriverContext<'_, C>,
    operation: CryptoOperation,
    runs: usize,
    series: &mut BenchmarkSeries,
) {
    debug_assert_eq!(series.operation(), operation.name());
    debug!(
        target: "gasbench::driver",
        operation = operation.name(),
        account = %cx.account,
        "Starting"
    );
    for run in 0..runs {
        let measured = measure_once(&mut cx, operation, run, series).await;
        observe(Protocol::CryptoOperations, operation.name(), run, measured);
    }
}

async fn measure_once<C: ChainClient>(
    cx: &mut DriverContext<'_, C>,
    operation: CryptoOperation,
    run: usize,
    series: &mut BenchmarkSeries,
) -> Result<(), StepError> {
    match operation {
        CryptoOperation::Secp256k1HashToCurve => {
            let call = ICryptoOperations::bench_secp256k1_hash_to_curveCall {
                pk: cx.inputs.random_field_tuple(),
                y: cx.inputs.random_word(),
            };
            cx.measure_into::<Measured, _>(run, &call, series).await?;
        }
        CryptoOperation::DdhVrfVerification => {
            let inp = cx.inputs.random_b256();
            let pk = cx.inputs.random_field_tuple();
            let gamma = cx.inputs.random_field_tuple();
            let pi = cx.inputs.fixed_gamma_ddh_proof(gamma);
            let y = cx.contract.read(&ICryptoOperations::_hash_gamma_to_yCall { gamma }).await?.y;
            let call = ICryptoOperations::bench_ddh_vrf_verCall { inp, y, pk, pi };
            cx.measure_into::<Measured, _>(run, &call, series).await?;
        }
        CryptoOperation::Bn254HashToCurve => {
            let call = ICryptoOperations::bench_bn254_hash_to_curveCall {
                domain: cx.inputs.random_b256(),
                msg: cx.inputs.random_b256(),
            };
            cx.measure_into::<Measured, _>(run, &call, series).await?;
        }
        CryptoOperation::GlowVrfVerification => {
            let sig = cx.inputs.random_field_tuple();
            let y = cx
                .contract
                .read(&ICryptoOperations::_hash_gamma_to_yCall { gamma: sig })
                .await?
                .y;
            let call = ICryptoOperations::bench_bls_vrf_ver_strCall {
                y,
                domain: cx.inputs.random_b256(),
                inp: cx.inputs.random_b256(),
                pk: cx.inputs.random_field_tuple(),
                sig,
            };
            cx.measure_into::<Measured, _>(run, &call, series).await?;
        }
        CryptoOperation::VerifyPairingSignature => {
            let call = ICryptoOperations::bench_bls_verify_pairingCall {
                inp: cx.inputs.random_field_tuple(),
                pk: cx.inputs.random_field_tuple(),
                sig: cx.inputs.random_field_tuple(),
            };
            cx.measure_into::<Measured, _>(run, &call, series).await?;
        }
        CryptoOperation::BlsSigVerification => {
            let call = ICryptoOperations::bench_bls_sig_ver_strCall {
                domain: cx.inputs.random_b256(),
                inp: cx.inputs.random_b256(),
                pk: cx.inputs.random_field_tuple(),
                sig: cx.inputs.random_field_tuple(),
            };
            cx.measure_into::<Measured, _>(run, &call, series).await?;
        }
    }
    Ok(())
}
