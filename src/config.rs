use alloy::primitives::Address;
use anyhow::{Context, Result};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub hub_chain_id: u64,
    pub atomic_queue_address: Address,
    pub eth_usd_feed_address: Address,
    pub chains: Vec<ChainConfig>,
    pub api: Api,
    pub vaults: Vec<VaultConfig>,
    pub vault_groups: Vec<VaultGroupConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_http_url: String,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Api {
    pub base_url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct VaultConfig {
    pub key: String,
    pub name: String,
    pub token: ShareTokenConfig,
    pub contracts: VaultContracts,
    pub deposit: DepositConfig,
    pub withdraw: WithdrawConfig,
}

/// The vault's share token, deployed on the hub chain and possibly bridged elsewhere.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ShareTokenConfig {
    pub symbol: String,
    pub addresses: Vec<ChainAddress>,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct ChainAddress {
    pub chain_id: u64,
    pub address: Address,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct VaultContracts {
    pub teller: Address,
    pub accountant: Address,
    pub boring_vault: Address,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DepositConfig {
    /// 0 means deposits settle on the hub chain, no bridge step.
    pub bridge_chain_identifier: u32,
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WithdrawConfig {
    /// 0 means shares already live on the hub chain, no bridge step.
    pub bridge_chain_identifier: u32,
    /// Chain the shares are bridged back from when a bridge is required.
    pub source_chain_id: u64,
    pub tokens: Vec<TokenConfig>,
}

/// A deposit or want token on the hub chain.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TokenConfig {
    pub key: String,
    pub symbol: String,
    pub address: Address,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct VaultGroupConfig {
    pub key: String,
    pub name: String,
    pub vaults: Vec<String>,
    pub benefits: Benefits,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Benefits {
    pub multipliers: Vec<TokenValue>,
    pub tokens: Vec<TokenValue>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TokenValue {
    pub token: String,
    pub value: f64,
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse config")
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&raw)
    }

    pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig> {
        self.chains
            .iter()
            .find(|chain| chain.chain_id == chain_id)
            .with_context(|| format!("No chain configured with id {chain_id}"))
    }

    pub fn explorer_tx_link(&self, chain_id: u64, tx_hash: &str) -> Option<String> {
        let chain = self.chain(chain_id).ok()?;
        chain
            .explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{tx_hash}", base.trim_end_matches('/')))
    }

    pub fn vault_by_key(&self, key: &str) -> Result<&VaultConfig> {
        self.vaults
            .iter()
            .find(|vault| vault.key == key)
            .with_context(|| format!("No vault configured with key {key}"))
    }

    pub fn group_by_key(&self, key: &str) -> Result<&VaultGroupConfig> {
        self.vault_groups
            .iter()
            .find(|group| group.key == key)
            .with_context(|| format!("No vault group configured with key {key}"))
    }
}

impl VaultConfig {
    /// Address of the share token on the given chain, a configuration error if absent.
    pub fn share_token_on(&self, chain_id: u64) -> Result<Address> {
        self.token
            .addresses
            .iter()
            .find(|entry| entry.chain_id == chain_id)
            .map(|entry| entry.address)
            .with_context(|| {
                format!(
                    "Share token for vault {} is not deployed on chain {chain_id}",
                    self.key
                )
            })
    }

    pub fn deposit_token(&self, token_key: &str) -> Result<&TokenConfig> {
        self.deposit
            .tokens
            .iter()
            .find(|token| token.key == token_key)
            .with_context(|| format!("Vault {} has no deposit token {token_key}", self.key))
    }

    pub fn want_token(&self, token_key: &str) -> Result<&TokenConfig> {
        self.withdraw
            .tokens
            .iter()
            .find(|token| token.key == token_key)
            .with_context(|| format!("Vault {} has no want token {token_key}", self.key))
    }
}
