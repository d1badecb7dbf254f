use alloy_core::primitives::Address;
use anyhow::Result;

use super::mocks::{LINK_TOKEN, VRF_COORDINATOR_MOCK};
use super::{ScriptEnv, ScriptOptions};
use crate::caller::ContractCaller;
use crate::context::ChainContext;
use crate::deployer::{ContractDeployer, DeployOptions, Deployment};
use crate::fulfillment::Sleeper;
use crate::instructions;
use crate::verify::{ExplorerVerifier, VerificationRequest};

pub const RANDOM_NUMBER_CONSUMER: &str = "RandomNumberConsumer";

/// A deployed consumer and the follow-up commands printed for it.
#[derive(Debug, Clone)]
pub struct ConsumerDeployment {
    pub deployment: Deployment,
    pub instructions: Vec<String>,
}

/// Coordinator and LINK token the consumer is wired to.
fn vrf_addresses<D: ContractDeployer>(
    ctx: &ChainContext,
    deployer: &D,
) -> Result<(Address, Address)> {
    if ctx.is_local() {
        let coordinator = deployer.get(VRF_COORDINATOR_MOCK)?.address;
        let link_token = deployer.get(LINK_TOKEN)?.address;
        return Ok((coordinator, link_token));
    }

    Ok((ctx.network.vrf_coordinator()?, ctx.network.link_token()?))
}

pub async fn deploy_random_number_consumer<D, C, V, S>(
    ctx: &ChainContext,
    env: &ScriptEnv<D, C, V, S>,
    options: &ScriptOptions,
) -> Result<ConsumerDeployment>
where
    D: ContractDeployer + Sync,
    C: ContractCaller + Sync,
    V: ExplorerVerifier + Sync,
    S: Sleeper + Sync,
{
    let (coordinator, link_token) = vrf_addresses(ctx, &env.deployer)?;
    let args = vec![
        coordinator.to_string(),
        link_token.to_string(),
        ctx.network.key_hash.to_string(),
        ctx.network.fee.to_string(),
    ];

    let deployment = env
        .deployer
        .deploy(
            RANDOM_NUMBER_CONSUMER,
            DeployOptions::with_args(args.clone()).force(options.redeploy),
        )
        .await?;

    env.verify(
        ctx,
        options,
        VerificationRequest {
            contract: RANDOM_NUMBER_CONSUMER.to_string(),
            address: deployment.address,
            constructor_args: args,
        },
    )
    .await?;

    let link_flag = ctx.is_local().then_some(link_token);
    let lines =
        instructions::consumer_instructions(deployment.address, ctx.network_name(), link_flag);
    instructions::print(&lines);

    Ok(ConsumerDeployment {
        deployment,
        instructions: lines,
    })
}
