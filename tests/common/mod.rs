#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use alloy::primitives::{Address, B256, TxHash, U256};
use anyhow::Result;
use async_trait::async_trait;

use nucleus_optimizer::VaultConnector;
use nucleus_optimizer::config::Config;
use nucleus_optimizer::contracts::{AtomicRequest, BridgeData};

pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Scripted connector: fixed read answers, recorded calls, and a set of
/// operations that fail on demand.
pub struct MockConnector {
    pub allowance: U256,
    pub rate_in_quote: U256,
    pub share_rate: U256,
    pub total_supply: U256,
    pub balance: U256,
    pub eth_price: U256,
    pub preview_fee: U256,
    pub failing: HashSet<&'static str>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self {
            allowance: U256::ZERO,
            rate_in_quote: U256::from(WAD),
            share_rate: U256::from(WAD),
            total_supply: U256::ZERO,
            balance: U256::ZERO,
            eth_price: U256::from(3_000u64 * 100_000_000),
            preview_fee: U256::ZERO,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockConnector {
    pub fn with_failing(ops: &[&'static str]) -> Self {
        Self {
            failing: ops.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == op)
            .count()
    }

    fn record(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.failing.contains(op) {
            anyhow::bail!("injected failure in {op}");
        }
        Ok(())
    }

    fn tx_hash(&self) -> TxHash {
        B256::with_last_byte(self.calls.lock().unwrap().len() as u8)
    }
}

#[async_trait]
impl VaultConnector for MockConnector {
    async fn balance_of(&self, _chain_id: u64, _token: Address, _owner: Address) -> Result<U256> {
        self.record("balance_of")?;
        Ok(self.balance)
    }

    async fn allowance(
        &self,
        _chain_id: u64,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256> {
        self.record("allowance")?;
        Ok(self.allowance)
    }

    async fn total_supply(&self, _chain_id: u64, _token: Address) -> Result<U256> {
        self.record("total_supply")?;
        Ok(self.total_supply)
    }

    async fn share_rate(&self, _accountant: Address) -> Result<U256> {
        self.record("share_rate")?;
        Ok(self.share_rate)
    }

    async fn rate_in_quote(&self, _accountant: Address, _quote: Address) -> Result<U256> {
        self.record("rate_in_quote")?;
        Ok(self.rate_in_quote)
    }

    async fn eth_price(&self) -> Result<U256> {
        self.record("eth_price")?;
        Ok(self.eth_price)
    }

    async fn preview_fee(
        &self,
        _chain_id: u64,
        _teller: Address,
        _share_amount: U256,
        _bridge_data: BridgeData,
    ) -> Result<U256> {
        self.record("preview_fee")?;
        Ok(self.preview_fee)
    }

    async fn approve(
        &self,
        _chain_id: u64,
        _token: Address,
        _spender: Address,
        _amount: U256,
    ) -> Result<TxHash> {
        self.record("approve")?;
        Ok(self.tx_hash())
    }

    async fn deposit(
        &self,
        _teller: Address,
        _deposit_asset: Address,
        _amount: U256,
        _minimum_mint: U256,
    ) -> Result<TxHash> {
        self.record("deposit")?;
        Ok(self.tx_hash())
    }

    async fn deposit_and_bridge(
        &self,
        _teller: Address,
        _deposit_asset: Address,
        _amount: U256,
        _minimum_mint: U256,
        _bridge_data: BridgeData,
        _fee: U256,
    ) -> Result<TxHash> {
        self.record("deposit_and_bridge")?;
        Ok(self.tx_hash())
    }

    async fn bridge_shares(
        &self,
        _chain_id: u64,
        _teller: Address,
        _share_amount: U256,
        _bridge_data: BridgeData,
        _fee: U256,
    ) -> Result<TxHash> {
        self.record("bridge_shares")?;
        Ok(self.tx_hash())
    }

    async fn update_atomic_request(
        &self,
        _queue: Address,
        _offer: Address,
        _want: Address,
        _request: AtomicRequest,
    ) -> Result<TxHash> {
        self.record("update_atomic_request")?;
        Ok(self.tx_hash())
    }
}

/// Two vaults: `sseth` settles on the hub chain, `bobaeth` bridges both ways.
pub fn test_config() -> Config {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    Config::from_toml(
        r#"
        hub_chain_id = 1
        atomic_queue_address = "0xD45884B592E316eB816199615A95C182F75dea07"
        eth_usd_feed_address = "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"

        [[chains]]
        chain_id = 1
        rpc_http_url = "http://127.0.0.1:8545"
        explorer_url = "https://etherscan.io"

        [[chains]]
        chain_id = 1329
        rpc_http_url = "http://127.0.0.1:8546"

        [api]
        base_url = "http://127.0.0.1:9"

        [[vaults]]
        key = "sseth"
        name = "Super Symbiotic ETH"

        [vaults.token]
        symbol = "ssETH"
        addresses = [
            { chain_id = 1, address = "0x917ceE801a67f933F2e6b33fC0cD1ED2d5909D88" },
        ]

        [vaults.contracts]
        teller = "0x99dE9e5a3eC2750a6983C8732E6e795A35e7B861"
        accountant = "0xbe16605B22a7faCEf247363312121670DFe5afBE"
        boring_vault = "0x917ceE801a67f933F2e6b33fC0cD1ED2d5909D88"

        [vaults.deposit]
        bridge_chain_identifier = 0
        tokens = [
            { key = "weth", symbol = "WETH", address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2" },
        ]

        [vaults.withdraw]
        bridge_chain_identifier = 0
        source_chain_id = 1
        tokens = [
            { key = "weth", symbol = "WETH", address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2" },
        ]

        [[vaults]]
        key = "bobaeth"
        name = "Boba ETH"

        [vaults.token]
        symbol = "bobaETH"
        addresses = [
            { chain_id = 1, address = "0x289f3bFA25d8D6912Bb19995d3CbF35871ABB291" },
            { chain_id = 1329, address = "0xa3931d71877C0E7a3148CB7Eb4463524FEc27fbD" },
        ]

        [vaults.contracts]
        teller = "0xB52C7d88F0514796877B04cF736E9Eb3A5b7866A"
        accountant = "0x6035fD26be16345b7f6892Ca8cc5a04B2fa5a7A6"
        boring_vault = "0x289f3bFA25d8D6912Bb19995d3CbF35871ABB291"

        [vaults.deposit]
        bridge_chain_identifier = 30280
        tokens = [
            { key = "weth", symbol = "WETH", address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2" },
        ]

        [vaults.withdraw]
        bridge_chain_identifier = 30101
        source_chain_id = 1329
        tokens = [
            { key = "weth", symbol = "WETH", address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2" },
        ]

        [[vault_groups]]
        key = "groupone"
        name = "Group 1"
        vaults = ["sseth", "bobaeth"]

        [vault_groups.benefits]
        multipliers = [{ token = "eth", value = 3.0 }]
        tokens = [{ token = "mkr", value = 128.2 }]
    "#,
    )
    .expect("test config parses")
}

pub fn owner() -> Address {
    "0x1111111111111111111111111111111111111111"
        .parse()
        .unwrap()
}
