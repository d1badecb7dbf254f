//! Explicit chain context passed into every operation.

use alloy_core::primitives::Address;

use crate::fulfillment::{ChainEnvironment, SIMULATED_RANDOMNESS};
use crate::network::{self, NetworkParams};

/// Everything an operation needs to know about the chain it runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContext {
    /// The chain ID reported by the node.
    pub chain_id: u64,
    /// Parameters resolved for that chain.
    pub network: NetworkParams,
    /// The named deployer account sending every transaction.
    pub deployer: Address,
}

impl ChainContext {
    pub fn new(network: NetworkParams, deployer: Address) -> Self {
        Self {
            chain_id: network.chain_id,
            network,
            deployer,
        }
    }

    pub fn network_name(&self) -> &str {
        &self.network.name
    }

    pub fn is_local(&self) -> bool {
        self.chain_id == network::LOCAL_CHAIN_ID
    }

    pub fn is_development(&self) -> bool {
        network::is_development_chain(self.chain_id)
    }

    pub fn is_mainnet(&self) -> bool {
        self.chain_id == network::MAINNET_CHAIN_ID
    }

    pub fn verification_enabled(&self) -> bool {
        network::verification_enabled(self.chain_id)
    }

    /// Local chains fulfill through the coordinator mock, everything else waits for the oracle.
    pub fn environment(&self) -> ChainEnvironment {
        if self.is_local() {
            ChainEnvironment::Simulated {
                payload: SIMULATED_RANDOMNESS,
            }
        } else {
            ChainEnvironment::Live
        }
    }
}
