//! Deploy scripts, run in order and selected by tag.
//!
//! | script                        | tags                                   |
//! |-------------------------------|----------------------------------------|
//! | `00_mocks`                    | `all`, `mocks` (development chains)    |
//! | `01_random_number_consumer`   | `reservation-variant`, `offset-variant`|
//! | `03_reservation_variant_nft`  | `reservation-variant`                  |
//! | `03_clonable_nft`             | `all`, `vrf` (experimental)            |

pub mod clonable;
pub mod consumer;
pub mod mocks;
pub mod reservation;

use std::time::Duration;

use anyhow::Result;

use crate::caller::ContractCaller;
use crate::context::ChainContext;
use crate::deployer::ContractDeployer;
use crate::fulfillment::Sleeper;
use crate::sale::NftSaleConfig;
use crate::verify::{DEFAULT_VERIFY_DELAY, ExplorerVerifier, VerificationRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ScriptTag {
    All,
    Mocks,
    ReservationVariant,
    OffsetVariant,
    Vrf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeployScript {
    #[strum(serialize = "00_mocks")]
    Mocks,
    #[strum(serialize = "01_random_number_consumer")]
    RandomNumberConsumer,
    #[strum(serialize = "03_reservation_variant_nft")]
    ReservationVariantNft,
    #[strum(serialize = "03_clonable_nft")]
    ClonableNft,
}

impl DeployScript {
    /// Every script, in execution order.
    pub const ALL: [DeployScript; 4] = [
        DeployScript::Mocks,
        DeployScript::RandomNumberConsumer,
        DeployScript::ReservationVariantNft,
        DeployScript::ClonableNft,
    ];

    pub fn tags(&self) -> &'static [ScriptTag] {
        match self {
            DeployScript::Mocks => &[ScriptTag::All, ScriptTag::Mocks],
            DeployScript::RandomNumberConsumer => {
                &[ScriptTag::ReservationVariant, ScriptTag::OffsetVariant]
            }
            DeployScript::ReservationVariantNft => &[ScriptTag::ReservationVariant],
            DeployScript::ClonableNft => &[ScriptTag::All, ScriptTag::Vrf],
        }
    }

    /// Experimental scripts only run when explicitly enabled.
    pub fn experimental(&self) -> bool {
        matches!(self, DeployScript::ClonableNft)
    }

    fn selected(&self, options: &ScriptOptions) -> bool {
        if self.experimental() && !options.experimental {
            return false;
        }
        options.tags.is_empty() || self.tags().iter().any(|tag| options.tags.contains(tag))
    }
}

/// Options shared by all scripts of a run.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Tags to run. Empty runs every non-experimental script.
    pub tags: Vec<ScriptTag>,
    /// Include experimental scripts.
    pub experimental: bool,
    /// Redeploy contracts even if an identical deployment is recorded.
    pub redeploy: bool,
    /// Wait before explorer verification.
    pub verify_delay: Duration,
    /// Sale settings of the NFT collections; demo defaults apply off mainnet when absent.
    pub sale: Option<NftSaleConfig>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            experimental: false,
            redeploy: false,
            verify_delay: DEFAULT_VERIFY_DELAY,
            sale: None,
        }
    }
}

/// Collaborators the scripts run against.
pub struct ScriptEnv<D, C, V, S> {
    pub deployer: D,
    pub caller: C,
    pub verifier: V,
    pub sleeper: S,
}

impl<D, C, V, S> ScriptEnv<D, C, V, S>
where
    D: ContractDeployer + Sync,
    C: ContractCaller + Sync,
    V: ExplorerVerifier + Sync,
    S: Sleeper + Sync,
{
    async fn verify(
        &self,
        ctx: &ChainContext,
        options: &ScriptOptions,
        request: VerificationRequest,
    ) -> Result<()> {
        crate::verify::verify_if_supported(
            ctx,
            &self.verifier,
            &self.sleeper,
            options.verify_delay,
            &request,
        )
        .await?;
        Ok(())
    }
}

/// Run the selected scripts in order and return the ones that ran.
pub async fn run_scripts<D, C, V, S>(
    ctx: &ChainContext,
    env: &ScriptEnv<D, C, V, S>,
    options: &ScriptOptions,
) -> Result<Vec<DeployScript>>
where
    D: ContractDeployer + Sync,
    C: ContractCaller + Sync,
    V: ExplorerVerifier + Sync,
    S: Sleeper + Sync,
{
    let mut executed = Vec::new();

    for script in DeployScript::ALL {
        if !script.selected(options) {
            tracing::debug!(script = %script, "Script not selected");
            continue;
        }

        tracing::info!(script = %script, network = ctx.network_name(), "Running deploy script");
        let ran = match script {
            DeployScript::Mocks => mocks::deploy_mocks(ctx, env, options).await?.is_some(),
            DeployScript::RandomNumberConsumer => {
                consumer::deploy_random_number_consumer(ctx, env, options).await?;
                true
            }
            DeployScript::ReservationVariantNft => {
                reservation::deploy_reservation_nft(ctx, env, options).await?;
                true
            }
            DeployScript::ClonableNft => {
                clonable::deploy_clonable_nft(ctx, env, options).await?;
                true
            }
        };

        if ran {
            executed.push(script);
        }
    }

    Ok(executed)
}
