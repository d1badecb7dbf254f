//! LINK funding of randomness consumers.

use alloy_core::primitives::{Address, B256, U256};
use anyhow::Result;

use crate::caller::ContractCaller;
use crate::context::ChainContext;
use crate::deployer::ContractDeployer;
use crate::ledger::LinkToken;
use crate::scripts::mocks::LINK_TOKEN;

/// Result of a LINK transfer to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingResult {
    pub link_token: Address,
    pub amount: U256,
    pub tx_hash: B256,
    /// The consumer's LINK balance after the transfer.
    pub balance: U256,
}

/// The LINK token to pay with: an explicit address, the local mock, or the network's token.
pub fn resolve_link_token<D: ContractDeployer>(
    ctx: &ChainContext,
    deployer: &D,
    link_override: Option<Address>,
) -> Result<Address> {
    if let Some(link) = link_override {
        return Ok(link);
    }
    if ctx.is_development() {
        return Ok(deployer.get(LINK_TOKEN)?.address);
    }
    Ok(ctx.network.link_token()?)
}

/// Transfer `amount` LINK (default: the network's `fund_amount`) from the deployer to `contract`.
pub async fn fund_link<C, D>(
    ctx: &ChainContext,
    caller: C,
    deployer: &D,
    contract: Address,
    link_override: Option<Address>,
    amount: Option<U256>,
) -> Result<FundingResult>
where
    C: ContractCaller + Sync,
    D: ContractDeployer,
{
    let link_token = resolve_link_token(ctx, deployer, link_override)?;
    let amount = amount.unwrap_or(ctx.network.fund_amount);
    let token = LinkToken::new(caller, link_token);

    tracing::info!(
        contract = %contract,
        link_token = %link_token,
        amount = %amount,
        network = ctx.network_name(),
        "Funding contract with LINK..."
    );
    let receipt = token.transfer(contract, amount).await?;
    let balance = token.balance_of(contract).await?;

    tracing::info!(
        contract = %contract,
        tx_hash = %receipt.transaction_hash,
        balance = %balance,
        "Contract funded with LINK"
    );

    Ok(FundingResult {
        link_token,
        amount,
        tx_hash: receipt.transaction_hash,
        balance,
    })
}
