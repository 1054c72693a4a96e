use std::collections::HashMap;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    config::Config,
    contracts::{Accountant, AtomicQueue, AtomicRequest, BridgeData, Erc20, PriceFeed, Teller},
    defaults,
};

/// Chain access seam between the orchestration layer and the RPC stack.
///
/// Write methods simulate, submit, and wait for one confirmation before
/// returning the transaction hash. Tests drive the sequencer through a mock
/// implementation to inject failures.
#[async_trait]
pub trait VaultConnector: Send + Sync {
    async fn balance_of(&self, chain_id: u64, token: Address, owner: Address) -> Result<U256>;
    async fn allowance(
        &self,
        chain_id: u64,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256>;
    async fn total_supply(&self, chain_id: u64, token: Address) -> Result<U256>;
    async fn share_rate(&self, accountant: Address) -> Result<U256>;
    async fn rate_in_quote(&self, accountant: Address, quote: Address) -> Result<U256>;
    /// ETH/USD price scaled by 1e8.
    async fn eth_price(&self) -> Result<U256>;
    async fn preview_fee(
        &self,
        chain_id: u64,
        teller: Address,
        share_amount: U256,
        bridge_data: BridgeData,
    ) -> Result<U256>;

    async fn approve(
        &self,
        chain_id: u64,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash>;
    async fn deposit(
        &self,
        teller: Address,
        deposit_asset: Address,
        amount: U256,
        minimum_mint: U256,
    ) -> Result<TxHash>;
    async fn deposit_and_bridge(
        &self,
        teller: Address,
        deposit_asset: Address,
        amount: U256,
        minimum_mint: U256,
        bridge_data: BridgeData,
        fee: U256,
    ) -> Result<TxHash>;
    async fn bridge_shares(
        &self,
        chain_id: u64,
        teller: Address,
        share_amount: U256,
        bridge_data: BridgeData,
        fee: U256,
    ) -> Result<TxHash>;
    async fn update_atomic_request(
        &self,
        queue: Address,
        offer: Address,
        want: Address,
        request: AtomicRequest,
    ) -> Result<TxHash>;
}

/// Alloy-backed connector holding one provider per configured chain.
///
/// The browser original switches the wallet's active chain; here a step simply
/// routes to the provider for its chain id.
pub struct EvmClient {
    providers: HashMap<u64, DynProvider>,
    hub_chain_id: u64,
    eth_usd_feed: Address,
}

impl EvmClient {
    pub fn from_config(config: &Config, signer: PrivateKeySigner) -> Result<Self> {
        let wallet = EthereumWallet::from(signer);

        let mut providers = HashMap::new();
        for chain in &config.chains {
            let url = chain
                .rpc_http_url
                .parse()
                .with_context(|| format!("Failed to parse rpc url for chain {}", chain.chain_id))?;
            let provider = ProviderBuilder::new()
                .wallet(wallet.clone())
                .connect_http(url)
                .erased();
            providers.insert(chain.chain_id, provider);
        }

        Ok(Self {
            providers,
            hub_chain_id: config.hub_chain_id,
            eth_usd_feed: config.eth_usd_feed_address,
        })
    }

    fn provider(&self, chain_id: u64) -> Result<&DynProvider> {
        self.providers
            .get(&chain_id)
            .with_context(|| format!("No provider configured for chain {chain_id}"))
    }

    /// Wait for a receipt with the fixed parameters: 60s timeout per attempt,
    /// polling every 10s, up to 5 attempts with a 5s pause in between. RPC
    /// errors while polling count against the attempt, not the caller.
    async fn wait_for_receipt(&self, chain_id: u64, tx_hash: TxHash) -> Result<()> {
        let provider = self.provider(chain_id)?;

        for attempt in 1..=defaults::RECEIPT_RETRY_COUNT {
            let deadline = tokio::time::Instant::now() + defaults::RECEIPT_TIMEOUT;

            loop {
                match provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        anyhow::ensure!(receipt.status(), "Transaction {tx_hash} reverted");
                        info!("Transaction {tx_hash} confirmed on chain {chain_id}");
                        return Ok(());
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!("Receipt poll failed for {tx_hash}: {err:?}");
                    }
                }

                if tokio::time::Instant::now() + defaults::RECEIPT_POLL_INTERVAL > deadline {
                    break;
                }
                tokio::time::sleep(defaults::RECEIPT_POLL_INTERVAL).await;
            }

            if attempt < defaults::RECEIPT_RETRY_COUNT {
                warn!(
                    "Timed out waiting for {tx_hash} (attempt {attempt}/{})",
                    defaults::RECEIPT_RETRY_COUNT
                );
                tokio::time::sleep(defaults::RECEIPT_RETRY_DELAY).await;
            }
        }

        anyhow::bail!("Timed out waiting for receipt of transaction {tx_hash}")
    }
}

#[async_trait]
impl VaultConnector for EvmClient {
    async fn balance_of(&self, chain_id: u64, token: Address, owner: Address) -> Result<U256> {
        let erc20 = Erc20::new(token, self.provider(chain_id)?.clone());
        erc20
            .balanceOf(owner)
            .call()
            .await
            .with_context(|| format!("balanceOf({owner}) failed for token {token}"))
    }

    async fn allowance(
        &self,
        chain_id: u64,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        let erc20 = Erc20::new(token, self.provider(chain_id)?.clone());
        erc20
            .allowance(owner, spender)
            .call()
            .await
            .with_context(|| format!("allowance query failed for token {token}"))
    }

    async fn total_supply(&self, chain_id: u64, token: Address) -> Result<U256> {
        let erc20 = Erc20::new(token, self.provider(chain_id)?.clone());
        erc20
            .totalSupply()
            .call()
            .await
            .with_context(|| format!("totalSupply failed for token {token} on chain {chain_id}"))
    }

    async fn share_rate(&self, accountant: Address) -> Result<U256> {
        let accountant = Accountant::new(accountant, self.provider(self.hub_chain_id)?.clone());
        accountant
            .getRate()
            .call()
            .await
            .context("getRate call failed")
    }

    async fn rate_in_quote(&self, accountant: Address, quote: Address) -> Result<U256> {
        let accountant = Accountant::new(accountant, self.provider(self.hub_chain_id)?.clone());
        accountant
            .getRateInQuoteSafe(quote)
            .call()
            .await
            .with_context(|| format!("getRateInQuoteSafe({quote}) call failed"))
    }

    async fn eth_price(&self) -> Result<U256> {
        let feed = PriceFeed::new(self.eth_usd_feed, self.provider(self.hub_chain_id)?.clone());
        let answer = feed
            .latestAnswer()
            .call()
            .await
            .context("latestAnswer call failed")?;
        U256::try_from(answer).context("Price feed returned a negative answer")
    }

    async fn preview_fee(
        &self,
        chain_id: u64,
        teller: Address,
        share_amount: U256,
        bridge_data: BridgeData,
    ) -> Result<U256> {
        let teller = Teller::new(teller, self.provider(chain_id)?.clone());
        teller
            .previewFee(share_amount, bridge_data)
            .call()
            .await
            .context("previewFee call failed")
    }

    async fn approve(
        &self,
        chain_id: u64,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash> {
        let erc20 = Erc20::new(token, self.provider(chain_id)?.clone());
        let call = erc20.approve(spender, amount);
        call.call().await.context("approve simulation failed")?;
        let pending = call.send().await.context("approve submission failed")?;
        let tx_hash = *pending.tx_hash();
        info!("Approving {amount} of {token} for {spender}: {tx_hash}");
        self.wait_for_receipt(chain_id, tx_hash).await?;
        Ok(tx_hash)
    }

    async fn deposit(
        &self,
        teller: Address,
        deposit_asset: Address,
        amount: U256,
        minimum_mint: U256,
    ) -> Result<TxHash> {
        let teller = Teller::new(teller, self.provider(self.hub_chain_id)?.clone());
        let call = teller.deposit(deposit_asset, amount, minimum_mint);
        call.call().await.context("deposit simulation failed")?;
        let pending = call.send().await.context("deposit submission failed")?;
        let tx_hash = *pending.tx_hash();
        info!("Depositing {amount} of {deposit_asset}: {tx_hash}");
        self.wait_for_receipt(self.hub_chain_id, tx_hash).await?;
        Ok(tx_hash)
    }

    async fn deposit_and_bridge(
        &self,
        teller: Address,
        deposit_asset: Address,
        amount: U256,
        minimum_mint: U256,
        bridge_data: BridgeData,
        fee: U256,
    ) -> Result<TxHash> {
        let teller = Teller::new(teller, self.provider(self.hub_chain_id)?.clone());
        let call = teller
            .depositAndBridge(deposit_asset, amount, minimum_mint, bridge_data)
            .value(fee);
        call.call()
            .await
            .context("depositAndBridge simulation failed")?;
        let pending = call
            .send()
            .await
            .context("depositAndBridge submission failed")?;
        let tx_hash = *pending.tx_hash();
        info!("Depositing and bridging {amount} of {deposit_asset}: {tx_hash}");
        self.wait_for_receipt(self.hub_chain_id, tx_hash).await?;
        Ok(tx_hash)
    }

    async fn bridge_shares(
        &self,
        chain_id: u64,
        teller: Address,
        share_amount: U256,
        bridge_data: BridgeData,
        fee: U256,
    ) -> Result<TxHash> {
        let teller = Teller::new(teller, self.provider(chain_id)?.clone());
        let call = teller.bridge(share_amount, bridge_data).value(fee);
        call.call().await.context("bridge simulation failed")?;
        let pending = call.send().await.context("bridge submission failed")?;
        let tx_hash = *pending.tx_hash();
        info!("Bridging {share_amount} shares from chain {chain_id}: {tx_hash}");
        self.wait_for_receipt(chain_id, tx_hash).await?;
        Ok(tx_hash)
    }

    async fn update_atomic_request(
        &self,
        queue: Address,
        offer: Address,
        want: Address,
        request: AtomicRequest,
    ) -> Result<TxHash> {
        let queue = AtomicQueue::new(queue, self.provider(self.hub_chain_id)?.clone());
        let call = queue.updateAtomicRequest(offer, want, request);
        call.call()
            .await
            .context("updateAtomicRequest simulation failed")?;
        let pending = call
            .send()
            .await
            .context("updateAtomicRequest submission failed")?;
        let tx_hash = *pending.tx_hash();
        info!("Updating atomic request for {offer} -> {want}: {tx_hash}");
        self.wait_for_receipt(self.hub_chain_id, tx_hash).await?;
        Ok(tx_hash)
    }
}
