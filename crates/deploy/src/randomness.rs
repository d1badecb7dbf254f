//! Request a random number and derive a reveal offset from it.

use alloy_core::primitives::U256;
use anyhow::{Result, ensure};

use crate::fulfillment::{FulfillmentWatcher, RandomnessRequest, RequestId, Sleeper};
use crate::ledger::RandomnessLedger;

/// Collection size used to illustrate the offset derivation.
pub const EXAMPLE_SUPPLY: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomnessOutcome {
    pub request: RandomnessRequest,
    pub value: U256,
    /// `value % supply`.
    pub offset: U256,
}

/// `value mod supply`.
pub fn random_offset(value: U256, supply: u64) -> Result<U256> {
    ensure!(supply > 0, "Supply must be greater than zero");
    Ok(value % U256::from(supply))
}

/// Submit a request, wait for its fulfillment and derive the offset for `supply` tokens.
pub async fn request_random_number<L, S>(
    ledger: &L,
    watcher: &FulfillmentWatcher<'_, L, S>,
    supply: u64,
) -> Result<RandomnessOutcome>
where
    L: RandomnessLedger + Sync,
    S: Sleeper,
{
    ensure!(supply > 0, "Supply must be greater than zero");

    let id = ledger.submit_randomness_request().await?;
    let starting_value = ledger.read_result(id).await?;
    tracing::info!(request_id = %id, "VRF Starting Value: {}", starting_value);

    let request = RandomnessRequest {
        id,
        requester: ledger.requester(),
        starting_value,
    };
    let value = watcher.await_fulfillment(&request).await?;
    tracing::info!(request_id = %id, "VRF Result: {}", value);

    let offset = random_offset(value, supply)?;
    tracing::info!(supply, "Random offset: {}", offset);

    Ok(RandomnessOutcome {
        request,
        value,
        offset,
    })
}

/// Current value of the result slot of `id`.
pub async fn read_random_number<L>(ledger: &L, id: RequestId) -> Result<U256>
where
    L: RandomnessLedger + Sync,
{
    let value = ledger.read_result(id).await?;
    tracing::info!(request_id = %id, requester = %ledger.requester(), "Random number: {}", value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use alloy_core::primitives::{Address, B256};

    use super::*;
    use crate::fulfillment::{ChainEnvironment, SIMULATED_RANDOMNESS};

    /// Ledger whose result slot is set by the mock trigger.
    #[derive(Default)]
    struct MockCoordinatorLedger {
        slot: Mutex<U256>,
        triggers: Mutex<u32>,
    }

    impl RandomnessLedger for MockCoordinatorLedger {
        fn requester(&self) -> Address {
            Address::repeat_byte(0xaa)
        }

        async fn submit_randomness_request(&self) -> Result<RequestId> {
            Ok(RequestId::new(B256::repeat_byte(0x42))?)
        }

        async fn read_result(&self, _id: RequestId) -> Result<U256> {
            Ok(*self.slot.lock().unwrap())
        }

        async fn authorize_requester(&self, _requester: Address, _approved: bool) -> Result<B256> {
            Ok(B256::ZERO)
        }

        async fn trigger_fulfillment(
            &self,
            _id: RequestId,
            payload: U256,
            _requester: Address,
        ) -> Result<()> {
            *self.triggers.lock().unwrap() += 1;
            *self.slot.lock().unwrap() = payload;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            self.sleeps.lock().unwrap().push(duration);
            std::future::ready(())
        }
    }

    #[test]
    fn test_offset_of_simulated_randomness() {
        assert_eq!(
            random_offset(SIMULATED_RANDOMNESS, EXAMPLE_SUPPLY).unwrap(),
            U256::from(3620)
        );
        assert_eq!(random_offset(U256::from(7), 8).unwrap(), U256::from(7));
        assert!(random_offset(U256::from(7), 0).is_err());
    }

    #[tokio::test]
    async fn test_local_request_resolves_on_first_poll() {
        let ledger = MockCoordinatorLedger::default();
        let sleeper = RecordingSleeper::default();
        let watcher = FulfillmentWatcher::new(
            &ledger,
            &sleeper,
            ChainEnvironment::Simulated {
                payload: SIMULATED_RANDOMNESS,
            },
        );

        let outcome = request_random_number(&ledger, &watcher, EXAMPLE_SUPPLY)
            .await
            .unwrap();

        assert_eq!(outcome.request.starting_value, U256::ZERO);
        assert_eq!(outcome.value, SIMULATED_RANDOMNESS);
        assert_eq!(outcome.offset, U256::from(3620));
        assert_eq!(*ledger.triggers.lock().unwrap(), 1);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());

        let id = outcome.request.id;
        assert_eq!(
            read_random_number(&ledger, id).await.unwrap(),
            SIMULATED_RANDOMNESS
        );
    }

    #[tokio::test]
    async fn test_zero_supply_sends_nothing() {
        let ledger = MockCoordinatorLedger::default();
        let watcher = FulfillmentWatcher::new(
            &ledger,
            RecordingSleeper::default(),
            ChainEnvironment::Live,
        );

        assert!(request_random_number(&ledger, &watcher, 0).await.is_err());
        assert_eq!(*ledger.triggers.lock().unwrap(), 0);
    }
}
