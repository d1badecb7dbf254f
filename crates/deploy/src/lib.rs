//! revealkit-deploy - Deployment and randomness tooling for Chainlink VRF backed NFT drops.
//!
//! This crate deploys the VRF consumer and the NFT collections relying on it, and runs the
//! confirmation protocol that waits for a randomness request to be fulfilled on chain.

pub mod artifacts;
pub mod caller;
pub mod context;
pub mod deployer;
pub mod error;
pub mod fulfillment;
pub mod funding;
pub mod instructions;
pub mod ledger;
pub mod network;
pub mod randomness;
pub mod rpc;
pub mod sale;
pub mod scripts;
pub mod store;
pub mod verify;

pub use artifacts::{Artifact, ArtifactStore};
pub use caller::{ContractCaller, RpcCaller};
pub use context::ChainContext;
pub use deployer::{ContractDeployer, DeployOptions, Deployment, RpcDeployer};
pub use error::{ConfigError, FulfillmentError};
pub use fulfillment::{
    ChainEnvironment, FulfillmentState, FulfillmentWatcher, PollPolicy, RandomnessRequest,
    RequestId, SIMULATED_RANDOMNESS, Sleeper, TokioSleeper,
};
pub use funding::{FundingResult, fund_link};
pub use ledger::{ConsumerLedger, LinkToken, RandomnessLedger};
pub use network::{NetworkParams, NetworkRegistry};
pub use randomness::{EXAMPLE_SUPPLY, RandomnessOutcome, random_offset, request_random_number};
pub use rpc::RpcClient;
pub use sale::{NftSaleConfig, NftSaleSettings};
pub use scripts::{DeployScript, ScriptEnv, ScriptOptions, ScriptTag, run_scripts};
pub use store::{DeploymentRecord, DeploymentStore};
pub use verify::{EtherscanVerifier, ExplorerVerifier, VerificationOutcome};
