//! The seam between the harness and the chain.
//!
//! Drivers only ever see [`ChainClient`]. The JSON-RPC implementation is [`RpcClient`]; tests
//! plug in the in-memory chain from `test_utils`.

use alloy_primitives::{Address, Bytes, Log, TxHash};
use alloy_sol_types::SolCall;
use tracing::trace;

use crate::error::SubmissionError;

mod rpc;
pub use rpc::*;

/// What a confirmed, successful transaction left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Total gas consumed by the transaction, as reported on the receipt.
    pub gas_used: u64,
    /// Logs emitted by the transaction, in order.
    pub logs: Vec<Log>,
}

/// Suspending access to a chain that executes benchmark transactions.
///
/// Every method is a suspension point. Implementations surface timeouts and reverts as
/// [`SubmissionError`] so callers can treat them like any other per-step failure.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Accounts the node signs for.
    async fn accounts(&self) -> Result<Vec<Address>, SubmissionError>;

    /// Submits a transaction from `from` to `to` and waits for its receipt. A reverted
    /// transaction is an error.
    async fn send(&self, from: Address, to: Address, input: Bytes)
        -> Result<TxOutcome, SubmissionError>;

    /// Executes a read-only call against the latest state.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, SubmissionError>;
}

/// A deployed contract bound to a client, speaking typed [`SolCall`]s.
#[derive(Debug)]
pub struct BenchContract<'a, C> {
    client: &'a C,
    address: Address,
}

impl<C> Clone for BenchContract<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for BenchContract<'_, C> {}

impl<'a, C: ChainClient> BenchContract<'a, C> {
    /// Binds `address` to `client`.
    pub const fn new(client: &'a C, address: Address) -> Self {
        Self { client, address }
    }

    /// The contract address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Submits `call` from `from`.
    pub async fn submit<T: SolCall>(
        &self,
        from: Address,
        call: &T,
    ) -> Result<TxOutcome, SubmissionError> {
        trace!(target: "gasbench::client", function = T::SIGNATURE, %from, "Submitting");
        self.client.send(from, self.address, call.abi_encode().into()).await
    }

    /// Executes `call` read-only and decodes its return values.
    pub async fn read<T: SolCall>(&self, call: &T) -> Result<T::Return, SubmissionError> {
        trace!(target: "gasbench::client", function = T::SIGNATURE, "Reading");
        let data = self.client.call(self.address, call.abi_encode().into()).await?;
        Ok(T::abi_decode_returns(&data, true)?)
    }
}
