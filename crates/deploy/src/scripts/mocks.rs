use anyhow::Result;

use super::{ScriptEnv, ScriptOptions};
use crate::caller::ContractCaller;
use crate::context::ChainContext;
use crate::deployer::{ContractDeployer, DeployOptions, Deployment};
use crate::fulfillment::Sleeper;
use crate::verify::ExplorerVerifier;

pub const LINK_TOKEN: &str = "LinkToken";
pub const VRF_COORDINATOR_MOCK: &str = "VRFCoordinatorMock";

/// The LINK token and coordinator mock deployed on development chains.
#[derive(Debug, Clone)]
pub struct Mocks {
    pub link_token: Deployment,
    pub coordinator: Deployment,
}

/// Deploy the LINK token and the VRF coordinator mock. Does nothing off development chains.
pub async fn deploy_mocks<D, C, V, S>(
    ctx: &ChainContext,
    env: &ScriptEnv<D, C, V, S>,
    options: &ScriptOptions,
) -> Result<Option<Mocks>>
where
    D: ContractDeployer + Sync,
    C: ContractCaller + Sync,
    V: ExplorerVerifier + Sync,
    S: Sleeper + Sync,
{
    if !ctx.is_development() {
        tracing::debug!(network = ctx.network_name(), "Not a development network, no mocks");
        return Ok(None);
    }

    tracing::info!("Local network detected! Deploying mocks...");
    let link_token = env
        .deployer
        .deploy(LINK_TOKEN, DeployOptions::default().force(options.redeploy))
        .await?;
    let coordinator = env
        .deployer
        .deploy(
            VRF_COORDINATOR_MOCK,
            DeployOptions::with_args(vec![link_token.address.to_string()])
                .force(options.redeploy),
        )
        .await?;
    tracing::info!(
        link_token = %link_token.address,
        coordinator = %coordinator.address,
        "Mocks Deployed!"
    );

    Ok(Some(Mocks {
        link_token,
        coordinator,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::tests::{context, env};

    #[tokio::test]
    async fn test_mocks_only_on_development_chain() {
        let env = env();

        let none = deploy_mocks(&context(4), &env, &ScriptOptions::default())
            .await
            .unwrap();
        assert!(none.is_none());
        assert!(env.deployer.order.lock().unwrap().is_empty());

        let mocks = deploy_mocks(&context(31337), &env, &ScriptOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mocks.coordinator.args, vec![mocks.link_token.address.to_string()]);
    }
}
