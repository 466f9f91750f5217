//! JSON-RPC backed [`ChainClient`].

use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{TransactionReceipt, TransactionRequest};
use tracing::debug;

use super::{ChainClient, TxOutcome};
use crate::error::{ConfigError, SubmissionError};

/// How receipts are awaited after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolling {
    /// Delay between `eth_getTransactionReceipt` polls.
    pub interval: Duration,
    /// Give up on a transaction after this long.
    pub timeout: Duration,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self { interval: Duration::from_millis(250), timeout: Duration::from_secs(120) }
    }
}

/// Submits transactions through a node that signs for its own accounts (`eth_sendTransaction`).
#[derive(Debug, Clone)]
pub struct RpcClient {
    provider: DynProvider,
    polling: ReceiptPolling,
}

impl RpcClient {
    /// Wraps an existing provider.
    pub const fn new(provider: DynProvider, polling: ReceiptPolling) -> Self {
        Self { provider, polling }
    }

    /// Connects to an HTTP endpoint. Nonce, gas and fee filling is left to the node.
    pub fn connect_http(rpc: &str, polling: ReceiptPolling) -> Result<Self, ConfigError> {
        let url = rpc
            .parse()
            .map_err(|e| ConfigError::InvalidRpcUrl(format!("'{rpc}': {e}")))?;
        let provider = ProviderBuilder::new().disable_recommended_fillers().on_http(url);
        Ok(Self::new(DynProvider::new(provider), polling))
    }

    async fn poll_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, SubmissionError> {
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.polling.interval).await;
        }
    }
}

impl ChainClient for RpcClient {
    async fn accounts(&self) -> Result<Vec<Address>, SubmissionError> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn send(
        &self,
        from: Address,
        to: Address,
        input: Bytes,
    ) -> Result<TxOutcome, SubmissionError> {
        let tx = TransactionRequest::default().from(from).to(to).input(input.into());
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(target: "gasbench::rpc", %tx_hash, "Transaction submitted");

        let receipt = tokio::time::timeout(self.polling.timeout, self.poll_receipt(tx_hash))
            .await
            .map_err(|_| SubmissionError::ReceiptTimeout(tx_hash))??;
        outcome_from_receipt(&receipt, to)
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, SubmissionError> {
        let tx = TransactionRequest::default().to(to).input(input.into());
        Ok(self.provider.call(tx).await?)
    }
}

/// Converts a mined receipt into a [`TxOutcome`], rejecting reverted transactions.
pub fn outcome_from_receipt(
    receipt: &TransactionReceipt,
    to: Address,
) -> Result<TxOutcome, SubmissionError> {
    if !receipt.status() {
        return Err(SubmissionError::Reverted { tx_hash: receipt.transaction_hash, to });
    }
    Ok(TxOutcome {
        tx_hash: receipt.transaction_hash,
        gas_used: receipt.gas_used,
        logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
    })
}
