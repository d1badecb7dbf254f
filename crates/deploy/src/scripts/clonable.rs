//! Experimental clonable offset-variant collection: a reference implementation plus a
//! factory minting minimal clones of it.

use anyhow::Result;

use super::consumer::RANDOM_NUMBER_CONSUMER;
use super::{ScriptEnv, ScriptOptions};
use crate::caller::ContractCaller;
use crate::context::ChainContext;
use crate::deployer::{ContractDeployer, DeployOptions, Deployment};
use crate::fulfillment::Sleeper;
use crate::ledger::{ConsumerLedger, RandomnessLedger};
use crate::sale::NftSaleSettings;
use crate::verify::{ExplorerVerifier, VerificationRequest};

pub const CLONABLE_NFT: &str = "OffsetVariantVRF721NFTClonable";
pub const CLONE_FACTORY: &str = "OffsetVariantVRF721NFTCloneFactory";

#[derive(Debug, Clone)]
pub struct ClonableDeployment {
    pub reference: Deployment,
    pub factory: Deployment,
}

pub async fn deploy_clonable_nft<D, C, V, S>(
    ctx: &ChainContext,
    env: &ScriptEnv<D, C, V, S>,
    options: &ScriptOptions,
) -> Result<ClonableDeployment>
where
    D: ContractDeployer + Sync,
    C: ContractCaller + Sync,
    V: ExplorerVerifier + Sync,
    S: Sleeper + Sync,
{
    let consumer = env.deployer.get(RANDOM_NUMBER_CONSUMER)?;
    let sale = NftSaleSettings::resolve(ctx, options.sale.as_ref())?;
    let args = sale.constructor_args(chrono::Utc::now(), consumer.address)?;

    let reference = env
        .deployer
        .deploy(CLONABLE_NFT, DeployOptions::default().force(options.redeploy))
        .await?;
    if reference.newly_deployed {
        let data = env.deployer.encode_call(CLONABLE_NFT, "initialize", &args)?;
        env.caller.send(Some(reference.address), data).await?;
        tracing::info!(reference = %reference.address, "Reference implementation initialized");
    }

    let factory = env
        .deployer
        .deploy(
            CLONE_FACTORY,
            DeployOptions::with_args(vec![reference.address.to_string()])
                .force(options.redeploy),
        )
        .await?;

    let data = env.deployer.encode_call(CLONE_FACTORY, "newVRF721Clone", &args)?;
    let receipt = env.caller.send(Some(factory.address), data).await?;
    tracing::info!(
        factory = %factory.address,
        gas_used = %receipt.gas_used,
        "New clone deployed"
    );

    ConsumerLedger::new(&env.caller, consumer.address)
        .authorize_requester(reference.address, true)
        .await?;

    env.verify(
        ctx,
        options,
        VerificationRequest {
            contract: CLONABLE_NFT.to_string(),
            address: reference.address,
            constructor_args: Vec::new(),
        },
    )
    .await?;

    Ok(ClonableDeployment { reference, factory })
}
