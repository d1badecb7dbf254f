use std::path::PathBuf;

use alloy_core::primitives::{Address, B256, U256};
use clap::{Parser, Subcommand};
use revealkit_deploy::ScriptTag;
use tracing::level_filters::LevelFilter;
use url::Url;

/// The default settings file, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "revealkit.toml";

/// The network used when none is given.
const DEFAULT_NETWORK: &str = "localhost";

#[derive(Parser)]
#[command(name = "revealkit")]
#[command(
    author,
    version,
    about = "Deploy Chainlink VRF backed NFT drops and request their randomness"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, global = true, env = "REVEALKIT_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The network name, used to pick the RPC endpoint and the deployments directory.
    ///
    /// The parameters of the network are resolved from the chain id the node reports.
    #[arg(short, long, global = true, env = "REVEALKIT_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// The URL of the JSON-RPC endpoint.
    ///
    /// If not provided, the endpoint configured for the network in the settings file is used.
    #[arg(long, alias = "rpc", global = true, env = "REVEALKIT_RPC_URL")]
    pub rpc_url: Option<Url>,

    /// Path to the settings file.
    #[arg(long, alias = "conf", global = true, env = "REVEALKIT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a settings file with the default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    #[command(flatten)]
    Chain(ChainCommand),
}

/// Commands that talk to a node.
#[derive(Debug, Subcommand)]
pub enum ChainCommand {
    /// Run the deploy scripts.
    Deploy {
        /// Only run the scripts carrying one of these tags (comma separated).
        ///
        /// Available tags: all, mocks, reservation-variant, offset-variant, vrf.
        #[arg(long, value_delimiter = ',', env = "REVEALKIT_TAGS")]
        tags: Vec<ScriptTag>,

        /// Also run experimental scripts (clonable NFT).
        #[arg(long, env = "REVEALKIT_EXPERIMENTAL")]
        experimental: bool,

        /// Redeploy all contracts.
        /// If not provided, contracts already deployed with the same bytecode and arguments are reused.
        #[arg(long, env = "REVEALKIT_REDEPLOY", default_value_t = false)]
        redeploy: bool,
    },

    /// Fund a contract with LINK.
    FundLink {
        /// The contract to fund.
        #[arg(long)]
        contract: Address,

        /// Amount of LINK in wei. Defaults to the network's funding amount.
        #[arg(long)]
        amount: Option<U256>,

        /// The LINK token address. Defaults to the network's token or the local mock.
        #[arg(long)]
        link_address: Option<Address>,
    },

    /// Request a random number from a consumer and wait for its fulfillment.
    RequestRandomNumber {
        /// The RandomNumberConsumer contract.
        #[arg(long)]
        contract: Address,

        /// Token supply used to derive the random offset.
        #[arg(long, default_value_t = revealkit_deploy::EXAMPLE_SUPPLY)]
        supply: u64,

        /// Give up after this many reads of the result.
        ///
        /// If not provided, polling continues until the value changes.
        #[arg(long, env = "REVEALKIT_MAX_ATTEMPTS")]
        max_attempts: Option<u32>,

        /// Seconds to wait before each read on live networks.
        #[arg(long, env = "REVEALKIT_POLL_INTERVAL")]
        poll_interval: Option<u64>,
    },

    /// Read the random number stored for a request.
    ReadRandomNumber {
        /// The RandomNumberConsumer contract.
        #[arg(long)]
        contract: Address,

        /// The request id emitted when the randomness was requested.
        #[arg(long)]
        request_id: B256,
    },

    /// List the contracts deployed on the network.
    Deployments,
}
