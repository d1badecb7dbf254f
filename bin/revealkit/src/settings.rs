//! Layered settings: built-in defaults, then the TOML settings file, then `REVEALKIT_`
//! environment variables (`__` separates nested keys, e.g. `REVEALKIT_POLL__MAX_ATTEMPTS`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use revealkit_deploy::fulfillment::DEFAULT_POLL_INTERVAL;
use revealkit_deploy::verify::DEFAULT_VERIFY_DELAY;
use revealkit_deploy::{NetworkParams, NftSaleConfig, PollPolicy};
use serde::{Deserialize, Serialize};
use url::Url;

const ENV_PREFIX: &str = "REVEALKIT_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sender of every transaction. Defaults to the node's first account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployer: Option<Address>,
    /// Root of the Hardhat compilation artifacts.
    pub artifacts_dir: PathBuf,
    /// Root of the per-network deployment records.
    pub deployments_dir: PathBuf,
    /// Etherscan API key. Verification is skipped without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etherscan_api_key: Option<String>,
    /// Additional networks, or replacements of built-in ones with the same chain id.
    pub networks: Vec<NetworkParams>,
    /// JSON-RPC endpoint per network name.
    pub rpc_urls: BTreeMap<String, Url>,
    pub poll: PollSettings,
    pub verify: VerifySettings,
    /// Sale settings of the NFT collections. Every field is required on mainnet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft: Option<NftSaleConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut rpc_urls = BTreeMap::new();
        if let Ok(local) = Url::parse("http://127.0.0.1:8545") {
            rpc_urls.insert("localhost".to_string(), local);
        }

        Self {
            deployer: None,
            artifacts_dir: PathBuf::from("artifacts"),
            deployments_dir: PathBuf::from("deployments"),
            etherscan_api_key: None,
            networks: Vec::new(),
            rpc_urls,
            poll: PollSettings::default(),
            verify: VerifySettings::default(),
            nft: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            max_attempts: None,
        }
    }
}

impl PollSettings {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.interval_secs),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifySettings {
    /// Seconds to wait between a deployment and its explorer verification.
    pub delay_secs: u64,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_VERIFY_DELAY.as_secs(),
        }
    }
}

impl Settings {
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the settings. A missing file only leaves the defaults in place.
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            networks = settings.networks.len(),
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Write the default settings to `path`.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists, use --force to overwrite it",
                path.display()
            );
        }

        let content =
            toml::to_string_pretty(&Settings::default()).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        tracing::info!(path = %path.display(), "Settings file written");
        Ok(())
    }

    pub fn rpc_url(&self, network: &str) -> Option<&Url> {
        self.rpc_urls.get(network)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_secs(self.verify.delay_secs)
    }
}
