//! Transaction and call submission from the deployer account.

use std::future::Future;
use std::time::Duration;

use alloy_core::primitives::{Address, Bytes};
use anyhow::Result;

use crate::rpc::{RpcClient, TransactionReceipt, TransactionRequest};

/// Default time allowed for a transaction to be mined.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Sends transactions and read-only calls on behalf of a single account.
pub trait ContractCaller {
    /// The account every transaction is sent from.
    fn sender(&self) -> Address;

    /// Send a transaction and wait for its receipt. `to == None` creates a contract.
    ///
    /// A reverted transaction is an error.
    fn send(
        &self,
        to: Option<Address>,
        data: Bytes,
    ) -> impl Future<Output = Result<TransactionReceipt>> + Send;

    /// Execute a read-only call and return the raw return data.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes>> + Send;
}

impl<C: ContractCaller + Sync> ContractCaller for &C {
    fn sender(&self) -> Address {
        (**self).sender()
    }

    fn send(
        &self,
        to: Option<Address>,
        data: Bytes,
    ) -> impl Future<Output = Result<TransactionReceipt>> + Send {
        (**self).send(to, data)
    }

    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes>> + Send {
        (**self).call(to, data)
    }
}

/// [`ContractCaller`] backed by a node-managed account.
#[derive(Debug, Clone)]
pub struct RpcCaller {
    rpc: RpcClient,
    from: Address,
    receipt_timeout: Duration,
}

impl RpcCaller {
    pub fn new(rpc: RpcClient, from: Address) -> Self {
        Self {
            rpc,
            from,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }
}

impl ContractCaller for RpcCaller {
    fn sender(&self) -> Address {
        self.from
    }

    async fn send(&self, to: Option<Address>, data: Bytes) -> Result<TransactionReceipt> {
        let tx = TransactionRequest {
            from: self.from,
            to,
            data,
            value: None,
        };
        let hash = self.rpc.send_transaction(&tx).await?;
        tracing::debug!(tx_hash = %hash, to = ?to, "Transaction sent");

        self.rpc.wait_for_receipt(hash, self.receipt_timeout).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.rpc.eth_call(to, &data).await
    }
}
