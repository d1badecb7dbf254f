use std::future::Future;

use alloy_core::primitives::{Address, Bytes};
use anyhow::{Context, Result};

use crate::artifacts::ArtifactStore;
use crate::caller::ContractCaller;
use crate::rpc::TransactionReceipt;
use crate::store::{DeploymentRecord, DeploymentStore, fingerprint};

/// Options of a single deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Human-readable constructor arguments, parsed against the artifact ABI.
    pub args: Vec<String>,
    /// Deploy a new instance even if an identical one is recorded.
    pub force: bool,
}

impl DeployOptions {
    pub fn with_args(args: Vec<String>) -> Self {
        Self { args, force: false }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Outcome of [`ContractDeployer::deploy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub contract: String,
    pub address: Address,
    pub args: Vec<String>,
    /// `false` when an existing instance was reused.
    pub newly_deployed: bool,
    pub receipt: Option<TransactionReceipt>,
}

impl Deployment {
    fn from_record(contract: &str, record: DeploymentRecord) -> Self {
        Self {
            contract: contract.to_string(),
            address: record.address,
            args: record.args,
            newly_deployed: false,
            receipt: None,
        }
    }
}

/// Deploys contracts by name and remembers them per network.
pub trait ContractDeployer {
    /// Deploy `contract`, or return the recorded instance if it was deployed with the
    /// same bytecode and arguments and `force` is not set.
    fn deploy(
        &self,
        contract: &str,
        options: DeployOptions,
    ) -> impl Future<Output = Result<Deployment>> + Send;

    /// A previously deployed instance. Missing records are a configuration error.
    fn get(&self, contract: &str) -> Result<Deployment>;

    /// Encode a call to `function` on `contract` from human-readable arguments.
    fn encode_call(&self, contract: &str, function: &str, args: &[String]) -> Result<Bytes>;
}

/// [`ContractDeployer`] sending creation transactions through a [`ContractCaller`].
#[derive(Debug, Clone)]
pub struct RpcDeployer<C> {
    caller: C,
    artifacts: ArtifactStore,
    store: DeploymentStore,
}

impl<C: ContractCaller> RpcDeployer<C> {
    pub fn new(caller: C, artifacts: ArtifactStore, store: DeploymentStore) -> Self {
        Self {
            caller,
            artifacts,
            store,
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn store(&self) -> &DeploymentStore {
        &self.store
    }
}

impl<C: ContractCaller + Sync> ContractDeployer for RpcDeployer<C> {
    async fn deploy(&self, contract: &str, options: DeployOptions) -> Result<Deployment> {
        let artifact = self.artifacts.load(contract)?;
        let data = artifact.deploy_data(&options.args)?;
        let fingerprint = fingerprint(&data);

        if let Some(existing) = self.store.get(contract)? {
            if !options.force && existing.fingerprint == fingerprint {
                tracing::info!(
                    contract,
                    address = %existing.address,
                    network = self.store.network(),
                    "Reusing existing deployment"
                );
                return Ok(Deployment::from_record(contract, existing));
            }

            tracing::info!(
                contract,
                previous = %existing.address,
                forced = options.force,
                "Redeploying contract"
            );
        }

        tracing::info!(contract, from = %self.caller.sender(), "Deploying contract...");
        let receipt = self
            .caller
            .send(None, data)
            .await
            .with_context(|| format!("Failed to deploy {}", contract))?;
        let address = receipt
            .contract_address
            .with_context(|| format!("Receipt for {} has no contract address", contract))?;

        let record = DeploymentRecord {
            address,
            args: options.args.clone(),
            transaction_hash: Some(receipt.transaction_hash),
            fingerprint,
            deployed_at: chrono::Utc::now().timestamp() as u64,
        };
        self.store.save(contract, &record)?;

        tracing::info!(
            contract,
            address = %address,
            tx_hash = %receipt.transaction_hash,
            gas_used = %receipt.gas_used,
            "Contract deployed"
        );

        Ok(Deployment {
            contract: contract.to_string(),
            address,
            args: options.args,
            newly_deployed: true,
            receipt: Some(receipt),
        })
    }

    fn get(&self, contract: &str) -> Result<Deployment> {
        let record = self.store.require(contract)?;
        Ok(Deployment::from_record(contract, record))
    }

    fn encode_call(&self, contract: &str, function: &str, args: &[String]) -> Result<Bytes> {
        self.artifacts
            .load(contract)?
            .encode_function_call(function, args)
    }
}
