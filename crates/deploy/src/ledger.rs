//! On-chain calls of the randomness consumer, the coordinator mock and the LINK token.

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use alloy_core::sol_types::{SolCall, sol};
use anyhow::{Context, Result};

use crate::caller::ContractCaller;
use crate::fulfillment::RequestId;
use crate::rpc::TransactionReceipt;

sol! {
    #![sol(alloy_sol_types = alloy_core::sol_types)]

    interface IRandomNumberConsumer {
        function getRandomNumber() external returns (bytes32 requestId);
        function randomResult(bytes32 requestId) external view returns (uint256);
        function setRandomnessRequesterApproval(address requester, bool approvalStatus) external;
    }

    interface IVRFCoordinatorMock {
        function callBackWithRandomness(bytes32 requestId, uint256 randomness, address consumerContract) external;
    }

    interface ILinkToken {
        function transfer(address to, uint256 value) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Position of the request event in the `getRandomNumber` receipt.
///
/// The LINK `transferAndCall` emits two transfer logs before it.
pub const DEFAULT_REQUEST_EVENT_INDEX: usize = 2;

/// Read/write surface of a randomness requester.
pub trait RandomnessLedger {
    /// The contract holding the randomness results.
    fn requester(&self) -> Address;

    /// Submit a randomness request and return the id emitted for it.
    fn submit_randomness_request(&self) -> impl Future<Output = Result<RequestId>> + Send;

    /// Read the value currently stored for `id`.
    fn read_result(&self, id: RequestId) -> impl Future<Output = Result<U256>> + Send;

    /// Grant or revoke `requester` the right to request randomness. Returns the transaction hash.
    fn authorize_requester(
        &self,
        requester: Address,
        approved: bool,
    ) -> impl Future<Output = Result<B256>> + Send;

    /// Answer a request directly. Only available where a coordinator mock is deployed.
    fn trigger_fulfillment(
        &self,
        id: RequestId,
        payload: U256,
        requester: Address,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// [`RandomnessLedger`] talking to a deployed `RandomNumberConsumer`.
#[derive(Debug, Clone)]
pub struct ConsumerLedger<C> {
    caller: C,
    consumer: Address,
    coordinator_mock: Option<Address>,
    request_event_index: usize,
}

impl<C: ContractCaller> ConsumerLedger<C> {
    pub fn new(caller: C, consumer: Address) -> Self {
        Self {
            caller,
            consumer,
            coordinator_mock: None,
            request_event_index: DEFAULT_REQUEST_EVENT_INDEX,
        }
    }

    /// Enable [`RandomnessLedger::trigger_fulfillment`] through the given coordinator mock.
    pub fn with_coordinator_mock(mut self, coordinator: Address) -> Self {
        self.coordinator_mock = Some(coordinator);
        self
    }

    pub fn with_request_event_index(mut self, index: usize) -> Self {
        self.request_event_index = index;
        self
    }
}

/// Extract the request id from topic 1 of the log at `index`.
pub fn request_id_from_receipt(receipt: &TransactionReceipt, index: usize) -> Result<RequestId> {
    let log = receipt.logs.get(index).with_context(|| {
        format!(
            "Randomness request receipt has {} logs, expected an event at index {}",
            receipt.logs.len(),
            index
        )
    })?;
    let topic = log
        .topics
        .get(1)
        .context("Randomness request event carries no request id topic")?;

    Ok(RequestId::new(*topic)?)
}

impl<C: ContractCaller + Sync> RandomnessLedger for ConsumerLedger<C> {
    fn requester(&self) -> Address {
        self.consumer
    }

    async fn submit_randomness_request(&self) -> Result<RequestId> {
        let data = IRandomNumberConsumer::getRandomNumberCall {}.abi_encode();
        let receipt = self
            .caller
            .send(Some(self.consumer), Bytes::from(data))
            .await
            .context("getRandomNumber failed")?;

        let id = request_id_from_receipt(&receipt, self.request_event_index)?;
        tracing::info!(
            request_id = %id,
            tx_hash = %receipt.transaction_hash,
            "Randomness requested"
        );
        Ok(id)
    }

    async fn read_result(&self, id: RequestId) -> Result<U256> {
        let data = IRandomNumberConsumer::randomResultCall {
            requestId: id.as_b256(),
        }
        .abi_encode();
        let output = self.caller.call(self.consumer, Bytes::from(data)).await?;

        let decoded = IRandomNumberConsumer::randomResultCall::abi_decode_returns(&output, true)
            .context("Failed to decode randomResult output")?;
        Ok(decoded._0)
    }

    async fn authorize_requester(&self, requester: Address, approved: bool) -> Result<B256> {
        let data = IRandomNumberConsumer::setRandomnessRequesterApprovalCall {
            requester,
            approvalStatus: approved,
        }
        .abi_encode();
        let receipt = self
            .caller
            .send(Some(self.consumer), Bytes::from(data))
            .await
            .with_context(|| format!("Failed to set requester approval for {}", requester))?;

        tracing::info!(
            requester = %requester,
            approved,
            tx_hash = %receipt.transaction_hash,
            "Randomness requester approval updated"
        );
        Ok(receipt.transaction_hash)
    }

    async fn trigger_fulfillment(
        &self,
        id: RequestId,
        payload: U256,
        requester: Address,
    ) -> Result<()> {
        let coordinator = self
            .coordinator_mock
            .context("No coordinator mock configured: fulfillment can only be triggered locally")?;

        let data = IVRFCoordinatorMock::callBackWithRandomnessCall {
            requestId: id.as_b256(),
            randomness: payload,
            consumerContract: requester,
        }
        .abi_encode();
        self.caller
            .send(Some(coordinator), Bytes::from(data))
            .await
            .context("callBackWithRandomness failed")?;

        Ok(())
    }
}

/// The LINK token used to pay for randomness requests.
#[derive(Debug, Clone)]
pub struct LinkToken<C> {
    caller: C,
    address: Address,
}

impl<C: ContractCaller> LinkToken<C> {
    pub fn new(caller: C, address: Address) -> Self {
        Self { caller, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<TransactionReceipt> {
        let data = ILinkToken::transferCall { to, value: amount }.abi_encode();
        self.caller
            .send(Some(self.address), Bytes::from(data))
            .await
            .with_context(|| format!("LINK transfer to {} failed", to))
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        let data = ILinkToken::balanceOfCall { owner }.abi_encode();
        let output = self.caller.call(self.address, Bytes::from(data)).await?;

        let decoded = ILinkToken::balanceOfCall::abi_decode_returns(&output, true)
            .context("Failed to decode balanceOf output")?;
        Ok(decoded._0)
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::U64;

    use super::*;
    use crate::rpc::Log;

    fn receipt_with_logs(logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: B256::repeat_byte(0xee),
            status: Some(U64::from(1)),
            contract_address: None,
            block_number: None,
            gas_used: U256::ZERO,
            logs,
        }
    }

    fn log(topics: Vec<B256>) -> Log {
        Log {
            address: Address::repeat_byte(0x01),
            topics,
            data: Bytes::new(),
        }
    }

    #[test]
    fn test_request_id_from_third_log() {
        let receipt = receipt_with_logs(vec![
            log(vec![B256::repeat_byte(0x10)]),
            log(vec![B256::repeat_byte(0x11)]),
            log(vec![B256::repeat_byte(0x12), B256::repeat_byte(0x42)]),
        ]);

        let id = request_id_from_receipt(&receipt, DEFAULT_REQUEST_EVENT_INDEX).unwrap();
        assert_eq!(id.as_b256(), B256::repeat_byte(0x42));
    }

    #[test]
    fn test_request_id_missing_log() {
        let receipt = receipt_with_logs(vec![log(vec![B256::repeat_byte(0x10)])]);

        let err = request_id_from_receipt(&receipt, DEFAULT_REQUEST_EVENT_INDEX).unwrap_err();
        assert!(err.to_string().contains("has 1 logs"));
    }

    #[test]
    fn test_request_id_missing_topic() {
        let receipt = receipt_with_logs(vec![log(vec![B256::repeat_byte(0x10)])]);

        assert!(request_id_from_receipt(&receipt, 0).is_err());
    }

    #[test]
    fn test_call_encodings() {
        let read = IRandomNumberConsumer::randomResultCall {
            requestId: B256::repeat_byte(0x42),
        }
        .abi_encode();
        assert_eq!(read.len(), 4 + 32);
        assert_eq!(&read[4..], B256::repeat_byte(0x42).as_slice());

        let callback = IVRFCoordinatorMock::callBackWithRandomnessCall {
            requestId: B256::repeat_byte(0x42),
            randomness: U256::from(20),
            consumerContract: Address::repeat_byte(0xaa),
        }
        .abi_encode();
        assert_eq!(callback.len(), 4 + 3 * 32);
    }
}
