//! Read-only vault metrics: TVL, APY, balances and exchange rates, plus the
//! derived display strings. Reads never mutate chain state; failures are
//! per-metric and never halt unrelated reads.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use anyhow::Result;
use futures::future::{join_all, try_join_all};
use tracing::warn;

use crate::{
    amounts,
    api::BackendApi,
    client::VaultConnector,
    config::{Config, VaultConfig, VaultGroupConfig},
    defaults::{APY_LOOKBACK_DAYS, PRICE_SCALE, WAD},
    flow::FlowDirection,
};

/// Share supply summed across every chain the share token is deployed on.
pub async fn total_supply_by_vault(
    connector: &dyn VaultConnector,
    vault: &VaultConfig,
) -> Result<U256> {
    let supplies = try_join_all(
        vault
            .token
            .addresses
            .iter()
            .map(|entry| connector.total_supply(entry.chain_id, entry.address)),
    )
    .await?;
    Ok(supplies.into_iter().fold(U256::ZERO, |acc, s| acc + s))
}

/// TVL in the vault's base asset: total supply times the accountant rate, 1e18 scaled.
pub async fn tvl_by_vault(connector: &dyn VaultConnector, vault: &VaultConfig) -> Result<U256> {
    let total_supply = total_supply_by_vault(connector, vault).await?;
    let rate = connector.share_rate(vault.contracts.accountant).await?;
    Ok(total_supply * rate / WAD)
}

pub async fn tvl_by_group(
    connector: &dyn VaultConnector,
    config: &Config,
    group: &VaultGroupConfig,
) -> Result<U256> {
    let vaults = group
        .vaults
        .iter()
        .map(|key| config.vault_by_key(key))
        .collect::<Result<Vec<_>>>()?;
    let tvls = try_join_all(vaults.iter().map(|vault| tvl_by_vault(connector, vault))).await?;
    Ok(tvls.into_iter().fold(U256::ZERO, |acc, tvl| acc + tvl))
}

pub async fn apy_by_vault(api: &BackendApi, config: &Config, vault: &VaultConfig) -> Result<f64> {
    let token_address = vault.share_token_on(config.hub_chain_id)?;
    api.vault_apy(token_address, None, APY_LOOKBACK_DAYS).await
}

/// A group's APY is the highest APY of any of its member vaults.
pub async fn apy_by_group(
    api: &BackendApi,
    config: &Config,
    group: &VaultGroupConfig,
) -> Result<f64> {
    let vaults = group
        .vaults
        .iter()
        .map(|key| config.vault_by_key(key))
        .collect::<Result<Vec<_>>>()?;
    let apys = try_join_all(vaults.iter().map(|vault| apy_by_vault(api, config, vault))).await?;
    apys.into_iter()
        .reduce(f64::max)
        .ok_or_else(|| anyhow::anyhow!("Vault group {} has no vaults", group.key))
}

/// TVL and APY for one vault group; the two metrics fail independently.
#[derive(Debug)]
pub struct VaultGroupMetrics {
    pub key: String,
    pub tvl: Result<U256>,
    pub apy: Result<f64>,
}

/// Dashboard view: every configured group, queried concurrently.
pub async fn dashboard_metrics(
    connector: &dyn VaultConnector,
    api: &BackendApi,
    config: &Config,
) -> Vec<VaultGroupMetrics> {
    join_all(config.vault_groups.iter().map(|group| async move {
        let (tvl, apy) = tokio::join!(
            tvl_by_group(connector, config, group),
            apy_by_group(api, config, group),
        );
        if let Err(err) = &tvl {
            warn!("Failed to fetch TVL for group {}: {err:?}", group.key);
        }
        if let Err(err) = &apy {
            warn!("Failed to fetch APY for group {}: {err:?}", group.key);
        }
        VaultGroupMetrics {
            key: group.key.clone(),
            tvl,
            apy,
        }
    }))
    .await
}

/// The per-vault reads behind the vault detail view. Each field carries its
/// own result so one failing read never blocks the others.
#[derive(Debug)]
pub struct VaultOverview {
    pub share_balance: Result<U256>,
    pub apy: Result<f64>,
    pub tvl: Result<U256>,
    pub eth_per_share_rate: Result<U256>,
    /// 1e8 scaled.
    pub eth_price: Result<U256>,
}

pub async fn vault_overview(
    connector: &dyn VaultConnector,
    api: &BackendApi,
    config: &Config,
    vault: &VaultConfig,
    owner: Address,
) -> Result<VaultOverview> {
    let share_token = vault.share_token_on(config.hub_chain_id)?;

    let (share_balance, apy, tvl, eth_per_share_rate, eth_price) = tokio::join!(
        connector.balance_of(config.hub_chain_id, share_token, owner),
        apy_by_vault(api, config, vault),
        tvl_by_vault(connector, vault),
        eth_rate_for_vault(connector, vault),
        connector.eth_price(),
    );

    Ok(VaultOverview {
        share_balance,
        apy,
        tvl,
        eth_per_share_rate,
        eth_price,
    })
}

/// Share rate in WETH terms when the vault quotes WETH, otherwise the base rate.
async fn eth_rate_for_vault(connector: &dyn VaultConnector, vault: &VaultConfig) -> Result<U256> {
    match vault.deposit_token("weth") {
        Ok(weth) => {
            connector
                .rate_in_quote(vault.contracts.accountant, weth.address)
                .await
        }
        Err(_) => connector.share_rate(vault.contracts.accountant).await,
    }
}

impl VaultOverview {
    pub fn formatted_apy(&self) -> Option<String> {
        self.apy.as_ref().ok().map(|apy| amounts::format_percent(*apy))
    }

    pub fn formatted_tvl_usd(&self) -> Option<String> {
        let tvl = *self.tvl.as_ref().ok()?;
        let price = *self.eth_price.as_ref().ok()?;
        Some(amounts::format_usd_wad(amounts::usd_from_wad(tvl, price)))
    }

    pub fn formatted_balance(&self, max_fraction_digits: usize) -> Option<String> {
        let balance = *self.share_balance.as_ref().ok()?;
        Some(amounts::format_units(balance, 18, max_fraction_digits))
    }

    pub fn formatted_balance_usd(&self) -> Option<String> {
        let balance = *self.share_balance.as_ref().ok()?;
        let rate = *self.eth_per_share_rate.as_ref().ok()?;
        let price = *self.eth_price.as_ref().ok()?;
        let usd_per_share = price * rate / PRICE_SCALE;
        Some(amounts::format_usd_wad(balance * usd_per_share / WAD))
    }
}

/// Key for the token-level read cache: one entry per flow direction, token
/// index and wallet. Invalidated wholesale when inputs change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenCacheKey {
    pub direction: FlowDirection,
    pub token_index: usize,
    pub owner: Address,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenData {
    pub rate_in_quote: U256,
    pub balance: U256,
}

/// Cached reader for the (rate, balance) pair behind the amount input field.
#[derive(Default)]
pub struct TokenDataReader {
    cache: HashMap<TokenCacheKey, TokenData>,
}

impl TokenDataReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(
        &mut self,
        connector: &dyn VaultConnector,
        config: &Config,
        vault: &VaultConfig,
        key: TokenCacheKey,
    ) -> Result<TokenData> {
        if let Some(data) = self.cache.get(&key) {
            return Ok(*data);
        }

        let tokens = match key.direction {
            FlowDirection::Deposit => &vault.deposit.tokens,
            FlowDirection::Withdraw => &vault.withdraw.tokens,
        };
        let token = tokens.get(key.token_index).ok_or_else(|| {
            anyhow::anyhow!(
                "Token index {} out of range for vault {}",
                key.token_index,
                vault.key
            )
        })?;

        let (rate_in_quote, balance) = tokio::try_join!(
            connector.rate_in_quote(vault.contracts.accountant, token.address),
            connector.balance_of(config.hub_chain_id, token.address, key.owner),
        )?;

        let data = TokenData {
            rate_in_quote,
            balance,
        };
        self.cache.insert(key, data);
        Ok(data)
    }

    /// Drop every cached entry; called when the selected vault or wallet changes.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}
