//! Clients for the protocol backend: externally computed APY and the
//! withdrawal order history.

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use chrono::DateTime;

use crate::{amounts, config::VaultConfig};

#[derive(Debug, serde::Deserialize)]
struct VaultApyResponse {
    apy: Option<f64>,
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Fulfilled,
    Cancelled,
    Expired,
}

impl OrderStatus {
    pub fn display(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Fulfilled => "Fulfilled",
            Self::Cancelled => "Cancelled",
            Self::Expired => "Expired",
        }
    }
}

/// One atomic-queue withdrawal order as reported by the backend. Amounts and
/// block numbers arrive as decimal strings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub id: u64,
    pub user: Address,
    pub offer_token: Address,
    pub want_token: Address,
    pub amount: String,
    pub deadline: String,
    pub atomic_price: String,
    pub created_timestamp: String,
    pub ending_timestamp: String,
    pub created_block_number: String,
    pub ending_block_number: Option<String>,
    pub created_log_index: String,
    pub created_transaction_index: String,
    pub ending_log_index: Option<String>,
    pub ending_transaction_index: Option<String>,
    pub status: OrderStatus,
    pub queue_address: String,
    pub chain_id: u64,
    pub offer_amount_spent: String,
    pub want_amount_rec: String,
    pub created_transaction_hash: String,
    pub ending_transaction_hash: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WithdrawalParams {
    pub user: Address,
    pub vault_address: Option<Address>,
    pub chain_id: Option<u64>,
    pub status: Option<String>,
    pub all: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub struct BackendApi {
    base_url: String,
    client: reqwest::Client,
}

impl BackendApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn vault_apy(
        &self,
        token_address: Address,
        block_number: Option<u64>,
        lookback_days: u32,
    ) -> Result<f64> {
        let mut url = format!(
            "{}/v1/vaults/apy?token_address={token_address}&lookback_days={lookback_days}",
            self.base_url
        );
        if let Some(block_number) = block_number {
            url.push_str(&format!("&block_number={block_number}"));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("APY request failed")?
            .error_for_status()
            .context("APY request returned an error status")?
            .json::<VaultApyResponse>()
            .await
            .context("Failed to decode APY response")?;

        match (response.apy, response.error) {
            (Some(apy), _) => Ok(apy),
            (None, Some(error)) => anyhow::bail!("APY backend error: {error}"),
            (None, None) => anyhow::bail!("APY response contained no data"),
        }
    }

    pub async fn withdrawals(&self, params: &WithdrawalParams) -> Result<Vec<Order>> {
        let url = self.withdrawals_url(params);
        self.client
            .get(&url)
            .send()
            .await
            .context("Withdrawals request failed")?
            .error_for_status()
            .context("Withdrawals request returned an error status")?
            .json()
            .await
            .context("Failed to decode withdrawals response")
    }

    fn withdrawals_url(&self, params: &WithdrawalParams) -> String {
        let mut url = format!(
            "{}/v1/protocol/withdrawals?user={}",
            self.base_url, params.user
        );
        if let Some(vault_address) = params.vault_address {
            url.push_str(&format!("&vault_address={vault_address}"));
        }
        if let Some(chain_id) = params.chain_id {
            url.push_str(&format!("&chain_id={chain_id}"));
        }
        url.push_str(&format!(
            "&status={}",
            params.status.as_deref().unwrap_or("all")
        ));
        if params.all {
            url.push_str("&all=true");
        }
        if let Some(page) = params.page {
            url.push_str(&format!("&page={page}"));
        }
        if let Some(limit) = params.limit {
            url.push_str(&format!("&limit={limit}"));
        }
        url
    }
}

/// A withdrawal order rendered for a history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRow {
    pub status: String,
    pub date: String,
    pub time: String,
    pub amount: String,
    pub vault_asset_symbol: String,
    pub want_asset_symbol: Option<String>,
    pub minimum_price: String,
    pub deadline: String,
    pub created_at: String,
}

impl Order {
    pub fn to_row(&self, vault: &VaultConfig) -> Result<WithdrawalRow> {
        let created = parse_timestamp(&self.created_timestamp)?;
        let deadline = parse_timestamp(&self.deadline)?;

        let amount = U256::from_str_radix(&self.amount, 10)
            .with_context(|| format!("Invalid order amount: {}", self.amount))?;
        let minimum_price = U256::from_str_radix(&self.atomic_price, 10)
            .with_context(|| format!("Invalid atomic price: {}", self.atomic_price))?;

        let want_asset_symbol = vault
            .withdraw
            .tokens
            .iter()
            .find(|token| token.address == self.want_token)
            .map(|token| token.symbol.clone());

        Ok(WithdrawalRow {
            status: self.status.display().to_string(),
            date: created.format("%b %d, %Y").to_string(),
            time: created.format("%H:%M %p").to_string(),
            amount: amounts::format_units(amount, 18, 18),
            vault_asset_symbol: vault.token.symbol.clone(),
            want_asset_symbol,
            minimum_price: amounts::format_units(minimum_price, 18, 18),
            deadline: deadline.format("%b %d, %Y, %H:%M %p").to_string(),
            created_at: created.format("%b %d, %Y, %H:%M %p").to_string(),
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<chrono::Utc>> {
    let secs = raw
        .parse::<i64>()
        .with_context(|| format!("Invalid timestamp: {raw}"))?;
    DateTime::from_timestamp(secs, 0).with_context(|| format!("Timestamp out of range: {raw}"))
}
