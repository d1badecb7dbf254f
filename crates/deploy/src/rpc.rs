//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes, U64, U256};
use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between polling attempts when waiting for a receipt.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Transaction submitted through `eth_sendTransaction`.
///
/// Signing is left to the node: `from` must be an account the node manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

/// A log entry attached to a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The subset of `eth_getTransactionReceipt` the deploy scripts rely on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub block_number: Option<U64>,
    pub gas_used: U256,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    /// Whether the transaction executed without reverting.
    ///
    /// Pre-Byzantium receipts carry no status and are treated as successful.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status == U64::from(1))
    }
}

/// JSON-RPC client bound to a single node endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub fn new(url: Url) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: create_client()?,
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Make a JSON-RPC call and deserialize the result.
    ///
    /// # Arguments
    /// * `method` - The RPC method name
    /// * `params` - The method parameters
    ///
    /// # Returns
    /// The deserialized result, or an error if the request failed or returned an error response.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, anyhow::Error> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        let result: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        if let Some(error) = result.get("error") {
            anyhow::bail!(
                "RPC error: {}",
                error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown")
            );
        }

        let result_value = result
            .get("result")
            .context("No result in response")?
            .clone();

        serde_json::from_value(result_value)
            .with_context(|| format!("Failed to deserialize {} result", method))
    }

    pub async fn chain_id(&self) -> Result<u64, anyhow::Error> {
        let id: U64 = self.call("eth_chainId", vec![]).await?;
        Ok(id.to::<u64>())
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, anyhow::Error> {
        self.call("eth_accounts", vec![]).await
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, anyhow::Error> {
        self.call("eth_sendTransaction", vec![serde_json::to_value(tx)?])
            .await
            .context("Failed to send transaction")
    }

    /// Execute a read-only call against the latest block.
    pub async fn eth_call(&self, to: Address, data: &Bytes) -> Result<Bytes, anyhow::Error> {
        self.call(
            "eth_call",
            vec![
                serde_json::json!({ "to": to, "data": data }),
                serde_json::json!("latest"),
            ],
        )
        .await
    }

    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, anyhow::Error> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(hash)])
            .await
    }

    /// Wait for a transaction to be mined and fail if it reverted.
    pub async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
    ) -> Result<TransactionReceipt, anyhow::Error> {
        let receipt = wait_until("transaction receipt", timeout, || async move {
            self.transaction_receipt(hash)
                .await?
                .with_context(|| format!("Transaction {} not yet mined", hash))
        })
        .await?;

        if !receipt.succeeded() {
            anyhow::bail!("Transaction {} reverted", hash);
        }

        tracing::debug!(
            tx_hash = %hash,
            gas_used = %receipt.gas_used,
            "Transaction mined"
        );

        Ok(receipt)
    }
}

/// Wait for a condition by repeatedly calling a check function.
///
/// # Arguments
/// * `name` - Name of the awaited condition (for error messages)
/// * `timeout` - Maximum time to wait
/// * `check_fn` - Function that returns Ok(value) once the condition holds
///
/// # Returns
/// The value produced by the first successful check, or the last check error wrapped in a
/// timeout error.
pub async fn wait_until<T, F, Fut>(
    name: &str,
    timeout: Duration,
    check_fn: F,
) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();

    loop {
        match check_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if start.elapsed() >= timeout => {
                // Keep the last failure as the cause of the timeout.
                return Err(e.context(format!("Timeout waiting for {}", name)));
            }
            Err(e) => {
                tracing::trace!(error = %e, condition = %name, "Check failed, retrying...");
            }
        }

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_deserialization() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "status": "0x1",
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "blockNumber": "0x3",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "topics": [
                    "0x2222222222222222222222222222222222222222222222222222222222222222"
                ],
                "data": "0x"
            }]
        }))
        .unwrap();

        assert!(receipt.succeeded());
        assert_eq!(receipt.gas_used, U256::from(21_000));
        assert_eq!(receipt.block_number, Some(U64::from(3)));
        assert_eq!(receipt.logs.len(), 1);
        assert!(receipt.contract_address.is_some());
    }

    #[test]
    fn test_reverted_receipt() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "status": "0x0",
            "gasUsed": "0x0"
        }))
        .unwrap();

        assert!(!receipt.succeeded());
        assert!(receipt.contract_address.is_none());
        assert!(receipt.logs.is_empty());
    }

    #[test]
    fn test_transaction_request_skips_empty_fields() {
        let tx = TransactionRequest {
            from: Address::ZERO,
            to: None,
            data: Bytes::from_static(&[0x60, 0x80]),
            value: None,
        };
        let json = serde_json::to_value(&tx).unwrap();

        assert!(json.get("to").is_none());
        assert!(json.get("value").is_none());
        assert_eq!(json["data"], "0x6080");
    }

    #[tokio::test]
    async fn test_wait_until_returns_first_success() {
        let value = wait_until("immediate", Duration::from_secs(1), || async {
            Ok::<_, anyhow::Error>(7u8)
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_wait_until_timeout_keeps_last_error() {
        let err = wait_until("transaction receipt", Duration::ZERO, || async {
            Err::<(), _>(anyhow::anyhow!("header not found"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Timeout waiting for transaction receipt");
        assert_eq!(err.root_cause().to_string(), "header not found");
    }
}
