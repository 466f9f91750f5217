//! Storage primitives keyed by a contract-assigned nonce.
//!
//! The nonce from `bench_increment_nonce` addresses every later write of the same iteration.
//! The commitment is deleted before it is overwritten so the overwrite is measured against an
//! empty slot.

use alloy_primitives::U256;

use super::{observe, DriverContext, Protocol, ProtocolDriver};
use crate::{
    client::ChainClient, contracts::IStorageOperations, error::StepError, metrics::Aggregator,
};

type Measured = IStorageOperations::GasMeasuredOperations;

const INCREMENT_NONCE: &str = "increment_nonce";
const STORE_HASH: &str = "store_hash";
const HASH_AND_STORE: &str = "hash_inp_and_store";
const DELETE_COMMITMENT: &str = "delete_data_from_mapping";
const STORE_ECP: &str = "store_bn254_g1_element_in_mapping";

pub(crate) const STORAGE_OPERATIONS: &[&str] =
    &[INCREMENT_NONCE, STORE_HASH, HASH_AND_STORE, DELETE_COMMITMENT, STORE_ECP];

/// Drives the storage primitive sequence once per run.
#[derive(Debug)]
pub struct StorageOpsDriver<'a, C> {
    cx: DriverContext<'a, C>,
}

impl<'a, C: ChainClient> StorageOpsDriver<'a, C> {
    /// Creates a driver.
    pub const fn new(cx: DriverContext<'a, C>) -> Self {
        Self { cx }
    }

    /// Bumps the contract nonce and returns its new value.
    pub async fn increment_nonce(
        &mut self,
        run: usize,
        metrics: &mut Aggregator,
    ) -> Result<U256, StepError> {
        let call = IStorageOperations::bench_increment_nonceCall {};
        let metered = self.cx.measure::<Measured, _>(run, &call, metrics, INCREMENT_NONCE).await?;
        Ok(metered.key())
    }

    /// Stores a random hash under `nonce`.
    pub async fn store_hash(
        &mut self,
        run: usize,
        nonce: U256,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let hash = self.cx.inputs.random_b256();
        let call = IStorageOperations::bench_store_hashCall { nonce, hash };
        self.cx.measure::<Measured, _>(run, &call, metrics, STORE_HASH).await?;
        Ok(())
    }

    /// Deletes the commitment stored under `nonce`.
    pub async fn delete_commitment(
        &mut self,
        run: usize,
        nonce: U256,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let call = IStorageOperations::bench_delete_commitmentCall { nonce };
        self.cx.measure::<Measured, _>(run, &call, metrics, DELETE_COMMITMENT).await?;
        Ok(())
    }

    /// Hashes a random input on-chain and stores the digest under `nonce`.
    pub async fn hash_and_store(
        &mut self,
        run: usize,
        nonce: U256,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let inp = self.cx.inputs.random_b256();
        let call = IStorageOperations::bench_hash_and_storeCall { nonce, inp };
        self.cx.measure::<Measured, _>(run, &call, metrics, HASH_AND_STORE).await?;
        Ok(())
    }

    /// Stores a random curve point under `nonce`.
    pub async fn store_ecp(
        &mut self,
        run: usize,
        nonce: U256,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let ecp = self.cx.inputs.random_field_tuple();
        let call = IStorageOperations::bench_store_ecpCall { nonce, ecp };
        self.cx.measure::<Measured, _>(run, &call, metrics, STORE_ECP).await?;
        Ok(())
    }
}

impl<C: ChainClient> ProtocolDriver for StorageOpsDriver<'_, C> {
    const PROTOCOL: Protocol = Protocol::StorageOperations;

    async fn run_iteration(&mut self, run: usize, metrics: &mut Aggregator) {
        let incremented = self.increment_nonce(run, metrics).await;
        let Some(nonce) = observe(Self::PROTOCOL, INCREMENT_NONCE, run, incremented) else {
            for step in [STORE_HASH, DELETE_COMMITMENT, HASH_AND_STORE, STORE_ECP] {
                observe::<()>(Self::PROTOCOL, step, run, Err(StepError::Skipped(INCREMENT_NONCE)));
            }
            return;
        };

        let stored = self.store_hash(run, nonce, metrics).await;
        observe(Self::PROTOCOL, STORE_HASH, run, stored);

        let deleted = self.delete_commitment(run, nonce, metrics).await;
        observe(Self::PROTOCOL, DELETE_COMMITMENT, run, deleted);

        let rehashed = self.hash_and_store(run, nonce, metrics).await;
        observe(Self::PROTOCOL, HASH_AND_STORE, run, rehashed);

        let point = self.store_ecp(run, nonce, metrics).await;
        observe(Self::PROTOCOL, STORE_ECP, run, point);
    }
}
