//! Per-chain parameters for the VRF coordinator, LINK token and block explorer.

use std::collections::BTreeMap;

use alloy_core::primitives::{Address, B256, U256, address, b256};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Chain id of the local Hardhat-compatible development node.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Chains on which contracts are mocks deployed by the scripts themselves.
pub const DEVELOPMENT_CHAIN_IDS: [u64; 1] = [LOCAL_CHAIN_ID];

/// Chains whose explorers receive verification requests: mainnet, rinkeby, goerli and kovan.
pub const VERIFICATION_CHAIN_IDS: [u64; 4] = [1, 4, 5, 42];

/// Chain id of Ethereum mainnet.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// 0.1 LINK.
const FEE_0_1_LINK: u128 = 100_000_000_000_000_000;
/// 1 LINK.
const ONE_LINK: u128 = 1_000_000_000_000_000_000;

pub fn is_development_chain(chain_id: u64) -> bool {
    DEVELOPMENT_CHAIN_IDS.contains(&chain_id)
}

pub fn verification_enabled(chain_id: u64) -> bool {
    VERIFICATION_CHAIN_IDS.contains(&chain_id)
}

/// Parameters of a single network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// The chain ID.
    pub chain_id: u64,
    /// Human-readable network name, also used for the deployments directory.
    pub name: String,
    /// LINK token address. Absent on development chains, where a mock is deployed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_token: Option<Address>,
    /// VRF coordinator address. Absent on development chains, where a mock is deployed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf_coordinator: Option<Address>,
    /// Key hash identifying the VRF proving key.
    pub key_hash: B256,
    /// Fee paid per randomness request, in LINK wei.
    pub fee: U256,
    /// Default amount of LINK (wei) sent by `fund-link`.
    pub fund_amount: U256,
    /// Etherscan-compatible API endpoint, when the network has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_api_url: Option<Url>,
}

impl NetworkParams {
    pub fn link_token(&self) -> Result<Address, ConfigError> {
        self.link_token.ok_or_else(|| self.missing("link_token"))
    }

    pub fn vrf_coordinator(&self) -> Result<Address, ConfigError> {
        self.vrf_coordinator
            .ok_or_else(|| self.missing("vrf_coordinator"))
    }

    pub fn explorer_api_url(&self) -> Result<&Url, ConfigError> {
        self.explorer_api_url
            .as_ref()
            .ok_or_else(|| self.missing("explorer_api_url"))
    }

    fn missing(&self, field: &'static str) -> ConfigError {
        ConfigError::MissingNetworkField {
            network: self.name.clone(),
            chain_id: self.chain_id,
            field,
        }
    }
}

/// Known networks, keyed by chain id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    networks: BTreeMap<u64, NetworkParams>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkRegistry {
    /// Networks known without any settings.
    ///
    /// Goerli carries no coordinator: it must be supplied through the settings file.
    pub fn builtin() -> Self {
        let local_key_hash =
            b256!("0x6c3699283bda56ad74f6b855546325b68d482e983852a7a82979cc4807b641f4");

        let networks = [
            NetworkParams {
                chain_id: LOCAL_CHAIN_ID,
                name: "localhost".to_string(),
                link_token: None,
                vrf_coordinator: None,
                key_hash: local_key_hash,
                fee: U256::from(FEE_0_1_LINK),
                fund_amount: U256::from(ONE_LINK),
                explorer_api_url: None,
            },
            NetworkParams {
                chain_id: 42,
                name: "kovan".to_string(),
                link_token: Some(address!("0xa36085f69e2889c224210f603d836748e7dc0088")),
                vrf_coordinator: Some(address!("0xdd3782915140c8f3b190b5d67eac6dc5760c46e9")),
                key_hash: local_key_hash,
                fee: U256::from(FEE_0_1_LINK),
                fund_amount: U256::from(ONE_LINK),
                explorer_api_url: Url::parse("https://api-kovan.etherscan.io/api").ok(),
            },
            NetworkParams {
                chain_id: 4,
                name: "rinkeby".to_string(),
                link_token: Some(address!("0x01be23585060835e02b77ef475b0cc51aa1e0709")),
                vrf_coordinator: Some(address!("0xb3dccb4cf7a26f6cf6b120cf5a73875b7bbc655b")),
                key_hash: b256!(
                    "0x2ed0feb3e7fd2022120aa84fab1945545a9f2ffc9076fd6156fa96eaff4c1311"
                ),
                fee: U256::from(FEE_0_1_LINK),
                fund_amount: U256::from(ONE_LINK),
                explorer_api_url: Url::parse("https://api-rinkeby.etherscan.io/api").ok(),
            },
            NetworkParams {
                chain_id: 5,
                name: "goerli".to_string(),
                link_token: Some(address!("0x326c977e6efc84e512bb9c30f76e30c160ed06fb")),
                vrf_coordinator: None,
                key_hash: local_key_hash,
                fee: U256::from(FEE_0_1_LINK),
                fund_amount: U256::from(ONE_LINK),
                explorer_api_url: Url::parse("https://api-goerli.etherscan.io/api").ok(),
            },
            NetworkParams {
                chain_id: MAINNET_CHAIN_ID,
                name: "mainnet".to_string(),
                link_token: Some(address!("0x514910771af9ca656af840dff83e8264ecf986ca")),
                vrf_coordinator: Some(address!("0xf0d54349addcf704f77ae15b96510dea15cb7952")),
                key_hash: b256!(
                    "0xaa77729d3466ca35ae8d28b3bbac7cc36a5031efdc430821c02bc31a238af445"
                ),
                fee: U256::from(2 * ONE_LINK),
                fund_amount: U256::from(ONE_LINK),
                explorer_api_url: Url::parse("https://api.etherscan.io/api").ok(),
            },
        ];

        Self {
            networks: networks
                .into_iter()
                .map(|params| (params.chain_id, params))
                .collect(),
        }
    }

    /// Add networks or replace built-in entries sharing the same chain id.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = NetworkParams>) -> Self {
        for params in overrides {
            tracing::debug!(chain_id = params.chain_id, name = %params.name, "Network override");
            self.networks.insert(params.chain_id, params);
        }
        self
    }

    pub fn get(&self, chain_id: u64) -> Result<&NetworkParams, ConfigError> {
        self.networks
            .get(&chain_id)
            .ok_or(ConfigError::UnknownChain(chain_id))
    }

    pub fn by_name(&self, name: &str) -> Option<&NetworkParams> {
        self.networks.values().find(|params| params.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkParams> {
        self.networks.values()
    }
}
