use alloy::primitives::{Address, U256};
use tracing::{info, warn};

use crate::{
    amounts,
    config::TokenConfig,
    contracts::{AtomicRequest, BridgeData},
    defaults::{DEFAULT_SLIPPAGE_WAD, WAD, WITHDRAW_DEADLINE},
    error::FlowError,
    flow::{FlowDirection, FlowStatus, Sequencer, StepKind, plan_steps, prepare_bridge_data},
};

#[derive(Debug, Clone)]
pub struct WithdrawRequest<'a> {
    pub vault_key: &'a str,
    pub want_token: &'a str,
    /// User-entered decimal amount of vault shares to redeem.
    pub amount: &'a str,
    pub owner: Address,
}

/// A resolved withdraw: optional bridge leg, optional approval, and the
/// atomic-queue request posted at a slippage-adjusted price.
#[derive(Debug, Clone)]
pub struct WithdrawPlan {
    pub steps: Vec<StepKind>,
    pub vault_key: String,
    pub owner: Address,
    pub share_amount: U256,
    pub share_token: Address,
    pub want_token: TokenConfig,
    pub teller: Address,
    pub atomic_queue: Address,
    /// Rate in the want asset discounted by the default slippage, 1e18.
    pub atomic_price: U256,
    /// Unix seconds; the request expires three days out.
    pub deadline: u64,
    pub source_chain_id: u64,
    pub bridge_data: Option<BridgeData>,
}

impl WithdrawPlan {
    /// Expected proceeds in the want asset if the request fills at the posted price.
    pub fn expected_receive(&self) -> U256 {
        self.share_amount * self.atomic_price / WAD
    }
}

impl Sequencer<'_> {
    pub async fn plan_withdraw(
        &self,
        request: WithdrawRequest<'_>,
    ) -> Result<WithdrawPlan, FlowError> {
        let vault = self
            .config
            .vault_by_key(request.vault_key)
            .map_err(FlowError::config)?;
        let want_token = vault
            .want_token(request.want_token)
            .map_err(FlowError::config)?;
        let share_token = vault
            .share_token_on(self.config.hub_chain_id)
            .map_err(FlowError::config)?;

        let share_amount = amounts::parse_units(request.amount, 18)
            .map_err(|err| FlowError::InvalidAmount(format!("{err:#}")))?;
        if share_amount.is_zero() {
            return Err(FlowError::InvalidAmount("amount must be positive".into()));
        }

        let bridge_required = vault.withdraw.bridge_chain_identifier != 0;
        let bridge_data = bridge_required
            .then(|| prepare_bridge_data(vault.withdraw.bridge_chain_identifier, request.owner));
        if bridge_required {
            // The shares must exist on the redemption source chain to bridge back.
            vault
                .share_token_on(vault.withdraw.source_chain_id)
                .map_err(FlowError::config)?;
        }

        let rate = self
            .connector
            .rate_in_quote(vault.contracts.accountant, want_token.address)
            .await
            .map_err(|err| FlowError::read("exchange rate", err))?;
        if rate.is_zero() {
            return Err(FlowError::Config(format!(
                "no exchange rate for {} in vault {}",
                want_token.key, vault.key
            )));
        }
        let atomic_price = rate - rate * DEFAULT_SLIPPAGE_WAD / WAD;

        let deadline = chrono::Utc::now().timestamp() as u64 + WITHDRAW_DEADLINE.as_secs();

        let allowance = self
            .connector
            .allowance(
                self.config.hub_chain_id,
                share_token,
                request.owner,
                self.config.atomic_queue_address,
            )
            .await
            .map_err(|err| FlowError::read("allowance", err))?;
        let needs_approval = allowance < share_amount;

        Ok(WithdrawPlan {
            steps: plan_steps(FlowDirection::Withdraw, bridge_required, needs_approval),
            vault_key: vault.key.clone(),
            owner: request.owner,
            share_amount,
            share_token,
            want_token: want_token.clone(),
            teller: vault.contracts.teller,
            atomic_queue: self.config.atomic_queue_address,
            atomic_price,
            deadline,
            source_chain_id: vault.withdraw.source_chain_id,
            bridge_data,
        })
    }

    /// Execute a withdraw plan: bridge (if required) from the source chain,
    /// approve the atomic queue, then post the withdraw request. Halts on the
    /// first failure.
    pub async fn run_withdraw(
        &self,
        plan: &WithdrawPlan,
        on_update: &mut dyn FnMut(&FlowStatus),
    ) -> FlowStatus {
        let mut status = FlowStatus::new(FlowDirection::Withdraw, &plan.steps);
        on_update(&status);

        let hub = self.config.hub_chain_id;
        for kind in &plan.steps {
            status.begin(*kind);
            on_update(&status);
            info!("Withdraw from {}: running {kind:?} step", plan.vault_key);

            let result = match kind {
                StepKind::Bridge => self.run_bridge_step(plan).await,
                StepKind::Approve => {
                    self.connector
                        .approve(
                            hub,
                            plan.share_token,
                            plan.atomic_queue,
                            plan.share_amount,
                        )
                        .await
                }
                StepKind::UpdateWithdrawRequest => {
                    self.connector
                        .update_atomic_request(
                            plan.atomic_queue,
                            plan.share_token,
                            plan.want_token.address,
                            AtomicRequest {
                                deadline: plan.deadline,
                                atomicPrice: plan.atomic_price,
                                offerAmount: plan.share_amount,
                                inSolve: false,
                            },
                        )
                        .await
                }
                other => Err(anyhow::anyhow!("step {other:?} is not part of a withdraw")),
            };

            match result {
                Ok(tx_hash) => {
                    let chain_id = match kind {
                        StepKind::Bridge => plan.source_chain_id,
                        _ => hub,
                    };
                    status.complete(*kind, tx_hash, self.explorer_link(chain_id, tx_hash));
                    on_update(&status);
                }
                Err(err) => {
                    warn!(
                        "Withdraw from {} failed at {kind:?}: {err:?}",
                        plan.vault_key
                    );
                    status.fail(*kind, format!("{err:#}"));
                    on_update(&status);
                    return status;
                }
            }
        }

        status
    }

    /// The bridge leg re-fetches the fee preview right before submitting, on
    /// the chain the shares are bridged back from.
    async fn run_bridge_step(&self, plan: &WithdrawPlan) -> anyhow::Result<alloy::primitives::TxHash> {
        let bridge_data = plan
            .bridge_data
            .clone()
            .ok_or_else(|| anyhow::anyhow!("bridge step planned without bridge data"))?;

        let fee = self
            .connector
            .preview_fee(
                plan.source_chain_id,
                plan.teller,
                plan.share_amount,
                bridge_data.clone(),
            )
            .await?;

        self.connector
            .bridge_shares(
                plan.source_chain_id,
                plan.teller,
                plan.share_amount,
                bridge_data,
                fee,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_receive_uses_discounted_rate() {
        let plan = WithdrawPlan {
            steps: vec![StepKind::UpdateWithdrawRequest],
            vault_key: "sseth".to_string(),
            owner: Address::ZERO,
            share_amount: U256::from(4u64) * WAD,
            share_token: Address::ZERO,
            want_token: TokenConfig {
                key: "weth".to_string(),
                symbol: "WETH".to_string(),
                address: Address::ZERO,
            },
            teller: Address::ZERO,
            atomic_queue: Address::ZERO,
            atomic_price: WAD / U256::from(2u64),
            deadline: 0,
            source_chain_id: 1,
            bridge_data: None,
        };
        assert_eq!(plan.expected_receive(), U256::from(2u64) * WAD);
    }
}
