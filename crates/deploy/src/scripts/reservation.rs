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

pub const RESERVATION_VARIANT_NFT: &str = "ReservationVariantVRF721NFT";

/// Deploy the reservation-variant collection and approve it as a randomness requester.
pub async fn deploy_reservation_nft<D, C, V, S>(
    ctx: &ChainContext,
    env: &ScriptEnv<D, C, V, S>,
    options: &ScriptOptions,
) -> Result<Deployment>
where
    D: ContractDeployer + Sync,
    C: ContractCaller + Sync,
    V: ExplorerVerifier + Sync,
    S: Sleeper + Sync,
{
    let consumer = env.deployer.get(RANDOM_NUMBER_CONSUMER)?;
    let sale = NftSaleSettings::resolve(ctx, options.sale.as_ref())?;
    let args = sale.constructor_args(chrono::Utc::now(), consumer.address)?;

    let nft = env
        .deployer
        .deploy(
            RESERVATION_VARIANT_NFT,
            DeployOptions::with_args(args.clone()).force(options.redeploy),
        )
        .await?;

    ConsumerLedger::new(&env.caller, consumer.address)
        .authorize_requester(nft.address, true)
        .await?;

    env.verify(
        ctx,
        options,
        VerificationRequest {
            contract: RESERVATION_VARIANT_NFT.to_string(),
            address: nft.address,
            constructor_args: args,
        },
    )
    .await?;

    Ok(nft)
}
