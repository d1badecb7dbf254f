//! Confirmation protocol for asynchronous randomness fulfillment.
//!
//! A randomness request is answered by the oracle in a later transaction. The watcher
//! polls the requester's result slot until it moves away from the value observed right
//! after the request was submitted.
//!
//! ```text
//!  Pending{0} --read == start--> Pending{1} --read == start--> ... --read != start--> Fulfilled
//! ```
//!
//! On a live network every attempt waits [`PollPolicy::interval`] before reading. On the
//! local development chain the watcher answers the request itself through the coordinator
//! mock and reads immediately.

use std::future::Future;
use std::time::Duration;

use alloy_core::primitives::{B256, U256, uint};

use crate::error::FulfillmentError;
use crate::ledger::RandomnessLedger;

/// Wait between two reads of the result slot on live networks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Randomness injected by the coordinator mock on the local chain.
pub const SIMULATED_RANDOMNESS: U256 = uint!(
    20273464752896995353136718257338856642066504105906912382411228684473618923620_U256
);

/// Async sleep, injectable so tests can run without real delays.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

impl<S: Sleeper + Sync> Sleeper for &S {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        (**self).sleep(duration)
    }
}

/// How the fulfillment arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnvironment {
    /// Local chain: the watcher triggers the coordinator mock with `payload`.
    Simulated { payload: U256 },
    /// Real oracle: the watcher only waits and reads.
    Live,
}

/// Retry policy of the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before each read on live networks.
    pub interval: Duration,
    /// Maximum number of reads. `None` polls until the value changes.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Correlation token of a randomness request. Never all zeroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(B256);

impl RequestId {
    pub fn new(id: B256) -> Result<Self, FulfillmentError> {
        if id.is_zero() {
            return Err(FulfillmentError::EmptyRequestId);
        }
        Ok(Self(id))
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A submitted request together with the sentinel read right after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub id: RequestId,
    /// The contract that requested randomness and stores the result.
    pub requester: alloy_core::primitives::Address,
    /// The result slot's value at request time.
    pub starting_value: U256,
}

/// Observed state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentState {
    Pending { attempts: u32 },
    Fulfilled(U256),
}

impl FulfillmentState {
    /// Transition after the `attempts`-th read returned `observed`.
    ///
    /// A value equal to `starting` is indistinguishable from "not yet fulfilled".
    pub fn observe(attempts: u32, starting: U256, observed: U256) -> Self {
        if observed == starting {
            Self::Pending { attempts }
        } else {
            Self::Fulfilled(observed)
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }
}

/// Polls a [`RandomnessLedger`] until a request is fulfilled.
pub struct FulfillmentWatcher<'a, L, S> {
    ledger: &'a L,
    sleeper: S,
    policy: PollPolicy,
    environment: ChainEnvironment,
}

impl<'a, L, S> FulfillmentWatcher<'a, L, S>
where
    L: RandomnessLedger + Sync,
    S: Sleeper,
{
    pub fn new(ledger: &'a L, sleeper: S, environment: ChainEnvironment) -> Self {
        Self {
            ledger,
            sleeper,
            policy: PollPolicy::default(),
            environment,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Wait until the stored result differs from `request.starting_value` and return it.
    ///
    /// Without a `max_attempts` bound this only returns once the value changes, so an
    /// oracle that never answers (or answers with the starting value) keeps it polling.
    pub async fn await_fulfillment(
        &self,
        request: &RandomnessRequest,
    ) -> Result<U256, FulfillmentError> {
        let mut attempts = 0u32;

        loop {
            match self.environment {
                ChainEnvironment::Simulated { payload } => {
                    tracing::debug!(request_id = %request.id, "Triggering mock fulfillment");
                    self.ledger
                        .trigger_fulfillment(request.id, payload, request.requester)
                        .await?;
                }
                ChainEnvironment::Live => self.sleeper.sleep(self.policy.interval).await,
            }

            let observed = self.ledger.read_result(request.id).await?;
            attempts = attempts.saturating_add(1);

            match FulfillmentState::observe(attempts, request.starting_value, observed) {
                FulfillmentState::Fulfilled(value) => {
                    tracing::info!(
                        request_id = %request.id,
                        attempts,
                        "Randomness fulfilled"
                    );
                    return Ok(value);
                }
                FulfillmentState::Pending { attempts } => {
                    if self.policy.exhausted(attempts) {
                        tracing::warn!(
                            request_id = %request.id,
                            attempts,
                            stored = %observed,
                            "Giving up on randomness fulfillment"
                        );
                        return Err(FulfillmentError::AttemptsExhausted {
                            attempts,
                            last_value: observed,
                        });
                    }

                    tracing::info!(
                        request_id = %request.id,
                        attempts,
                        "Fulfillment incomplete: waiting another {}s for randomness fulfillment",
                        self.policy.interval.as_secs()
                    );
                }
            }
        }
    }
}
