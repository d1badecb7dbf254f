//! Per-network records of deployed contracts.
//!
//! Layout mirrors `hardhat-deploy`: `<root>/<network>/.chainId` plus one
//! `<Contract>.json` per deployment.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use comfy_table::{Table, presets::UTF8_FULL};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ConfigError;

const CHAIN_ID_FILENAME: &str = ".chainId";

/// A deployed contract instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub address: Address,
    /// Human-readable constructor arguments.
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// SHA-256 of the creation data (bytecode + encoded arguments).
    pub fingerprint: String,
    /// Unix timestamp of the deployment.
    pub deployed_at: u64,
}

/// Compute the fingerprint of a deployment from its creation data.
///
/// The same bytecode and constructor arguments always produce the same fingerprint.
pub fn fingerprint(deploy_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(deploy_data);
    hex::encode(hasher.finalize())
}

/// Deployment records of a single network.
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    network: String,
    dir: PathBuf,
}

impl DeploymentStore {
    /// Open (creating if needed) the records of `network` under `root`.
    ///
    /// Fails if the directory was created for a different chain id.
    pub fn open(root: &Path, network: &str, chain_id: u64) -> Result<Self> {
        let dir = root.join(network);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create deployments directory {}", dir.display()))?;

        let chain_id_path = dir.join(CHAIN_ID_FILENAME);
        if chain_id_path.exists() {
            let recorded = std::fs::read_to_string(&chain_id_path)
                .with_context(|| format!("Failed to read {}", chain_id_path.display()))?;
            let recorded: u64 = recorded
                .trim()
                .parse()
                .with_context(|| format!("Invalid chain id in {}", chain_id_path.display()))?;
            if recorded != chain_id {
                anyhow::bail!(
                    "Deployments in {} belong to chain {}, but the node reports chain {}",
                    dir.display(),
                    recorded,
                    chain_id
                );
            }
        } else {
            std::fs::write(&chain_id_path, chain_id.to_string())
                .with_context(|| format!("Failed to write {}", chain_id_path.display()))?;
        }

        tracing::debug!(path = %dir.display(), network, "Deployment store opened");

        Ok(Self {
            network: network.to_string(),
            dir,
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    fn record_path(&self, contract: &str) -> PathBuf {
        self.dir.join(format!("{}.json", contract))
    }

    pub fn get(&self, contract: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(contract);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployment record {}", path.display()))?;
        Ok(Some(record))
    }

    /// Like [`Self::get`], but a missing record is a [`ConfigError::MissingDeployment`].
    pub fn require(&self, contract: &str) -> Result<DeploymentRecord> {
        self.get(contract)?.ok_or_else(|| {
            ConfigError::MissingDeployment {
                contract: contract.to_string(),
                network: self.network.clone(),
            }
            .into()
        })
    }

    pub fn save(&self, contract: &str, record: &DeploymentRecord) -> Result<()> {
        let path = self.record_path(contract);
        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize deployment record")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write deployment record {}", path.display()))?;
        Ok(())
    }

    /// All records, sorted by contract name.
    pub fn list(&self) -> Result<Vec<(String, DeploymentRecord)>> {
        let mut records = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(contract) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(record) = self.get(contract)? {
                records.push((contract.to_string(), record));
            }
        }

        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }

    /// Render the records as a table for the terminal.
    pub fn render_table(&self) -> Result<String> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Contract", "Address", "Deployed at", "Transaction"]);

        for (contract, record) in self.list()? {
            let deployed_at = chrono::DateTime::from_timestamp(record.deployed_at as i64, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| record.deployed_at.to_string());
            table.add_row(vec![
                contract,
                record.address.to_string(),
                deployed_at,
                record
                    .transaction_hash
                    .map(|h| h.to_string())
                    .unwrap_or_default(),
            ]);
        }

        Ok(table.to_string())
    }
}
