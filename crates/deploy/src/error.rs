//! Error categories callers need to tell apart.
//!
//! Everything else travels as [`anyhow::Error`] with context attached.

use alloy_core::primitives::U256;

/// Configuration problems detected before any transaction is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No network configuration for chain id {0}")]
    UnknownChain(u64),

    #[error("Network {network} (chain id {chain_id}) has no `{field}` configured")]
    MissingNetworkField {
        network: String,
        chain_id: u64,
        field: &'static str,
    },

    #[error("No deployment of {contract} recorded for network {network}")]
    MissingDeployment { contract: String, network: String },

    #[error("Please set your token deployment arguments")]
    MissingSaleSettings,

    #[error("Please set your token deployment arguments: `nft.{field}` is missing")]
    IncompleteSaleSettings { field: &'static str },
}

/// Failures of the randomness confirmation protocol.
#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error("Randomness request id is empty")]
    EmptyRequestId,

    /// The stored value never moved away from the starting value.
    ///
    /// Either the oracle has not answered yet, or it answered with a value equal to the
    /// starting value, which this protocol cannot tell apart from "not yet fulfilled".
    #[error(
        "Randomness still unfulfilled after {attempts} attempts (stored value {last_value}); \
         the oracle may not have responded or may have returned the starting value"
    )]
    AttemptsExhausted { attempts: u32, last_value: U256 },

    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}
