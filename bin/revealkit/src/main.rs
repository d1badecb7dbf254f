//! revealkit is a CLI tool to deploy Chainlink VRF backed NFT drops and request their randomness.

mod cli;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{ChainCommand, Cli, Command};
use revealkit_deploy::fulfillment::RequestId;
use revealkit_deploy::randomness::read_random_number;
use revealkit_deploy::scripts::mocks::VRF_COORDINATOR_MOCK;
use revealkit_deploy::{
    ArtifactStore, ChainContext, ConsumerLedger, ContractCaller, ContractDeployer,
    DeploymentStore, EtherscanVerifier, FulfillmentWatcher, NetworkRegistry, RpcCaller,
    RpcClient, RpcDeployer, ScriptEnv, ScriptOptions, TokioSleeper, fund_link,
    request_random_number, run_scripts,
};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let command = match cli.command {
        Command::Init { force } => return Settings::write_default(&cli.config, force),
        Command::Chain(command) => command,
    };

    let settings = Settings::load(&cli.config)?;
    let rpc_url = cli
        .rpc_url
        .clone()
        .or_else(|| settings.rpc_url(&cli.network).cloned())
        .with_context(|| {
            format!(
                "No RPC URL for network {}: pass --rpc-url or set rpc_urls.{} in {}",
                cli.network,
                cli.network,
                cli.config.display()
            )
        })?;

    let rpc = RpcClient::new(rpc_url)?;
    let chain_id = rpc
        .chain_id()
        .await
        .with_context(|| format!("Failed to reach the node at {}", rpc.url()))?;

    let registry = NetworkRegistry::builtin().with_overrides(settings.networks.clone());
    let network = registry.get(chain_id)?.clone();
    if network.name != cli.network {
        tracing::warn!(
            requested = %cli.network,
            chain_id,
            resolved = %network.name,
            "Node chain id does not match the requested network, using the node's network"
        );
    }

    let deployer = match settings.deployer {
        Some(deployer) => deployer,
        None => rpc
            .accounts()
            .await?
            .first()
            .copied()
            .context("The node exposes no account to deploy from, set `deployer` in the settings")?,
    };

    let ctx = ChainContext::new(network, deployer);
    tracing::info!(
        network = ctx.network_name(),
        chain_id = ctx.chain_id,
        deployer = %ctx.deployer,
        rpc_url = %rpc.url(),
        "Connected"
    );

    let caller = RpcCaller::new(rpc, deployer);
    let artifacts = ArtifactStore::new(&settings.artifacts_dir);
    let store = DeploymentStore::open(&settings.deployments_dir, ctx.network_name(), chain_id)?;
    let contracts = RpcDeployer::new(&caller, artifacts.clone(), store);

    match command {
        ChainCommand::Deploy {
            tags,
            experimental,
            redeploy,
        } => {
            let options = ScriptOptions {
                tags,
                experimental,
                redeploy,
                verify_delay: settings.verify_delay(),
                sale: settings.nft.clone(),
            };
            let env = ScriptEnv {
                deployer: contracts,
                caller: &caller,
                verifier: EtherscanVerifier::new(settings.etherscan_api_key.clone(), artifacts)?,
                sleeper: TokioSleeper,
            };

            let executed = run_scripts(&ctx, &env, &options).await?;
            tracing::info!(scripts = executed.len(), "Deployment complete");
        }

        ChainCommand::FundLink {
            contract,
            amount,
            link_address,
        } => {
            let funded = fund_link(&ctx, &caller, &contracts, contract, link_address, amount).await?;
            println!(
                "Contract {} funded with {} LINK wei (balance {}), transaction {}",
                contract, funded.amount, funded.balance, funded.tx_hash
            );
        }

        ChainCommand::RequestRandomNumber {
            contract,
            supply,
            max_attempts,
            poll_interval,
        } => {
            let mut ledger = ConsumerLedger::new(&caller, contract);
            if ctx.is_development() {
                ledger = ledger.with_coordinator_mock(contracts.get(VRF_COORDINATOR_MOCK)?.address);
            }

            let mut policy = settings.poll.policy();
            if let Some(max_attempts) = max_attempts {
                policy = policy.with_max_attempts(max_attempts);
            }
            if let Some(secs) = poll_interval {
                policy.interval = std::time::Duration::from_secs(secs);
            }

            tracing::info!(
                contract = %contract,
                from = %caller.sender(),
                "Requesting a random number..."
            );
            let watcher =
                FulfillmentWatcher::new(&ledger, TokioSleeper, ctx.environment()).with_policy(policy);
            let outcome = request_random_number(&ledger, &watcher, supply).await?;

            println!("Request id: {}", outcome.request.id);
            println!("Random number: {}", outcome.value);
            println!("Random offset (supply {}): {}", supply, outcome.offset);
        }

        ChainCommand::ReadRandomNumber {
            contract,
            request_id,
        } => {
            let ledger = ConsumerLedger::new(&caller, contract);
            let value = read_random_number(&ledger, RequestId::new(request_id)?).await?;
            println!("Random number: {}", value);
        }

        ChainCommand::Deployments => {
            println!("{}", contracts.store().render_table()?);
        }
    }

    Ok(())
}
