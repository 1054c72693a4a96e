use alloy::primitives::{Address, U256};
use tracing::{info, warn};

use crate::{
    amounts,
    config::TokenConfig,
    contracts::BridgeData,
    defaults::{DEFAULT_SLIPPAGE_WAD, WAD},
    error::FlowError,
    flow::{FlowDirection, FlowStatus, Sequencer, StepKind, plan_steps, prepare_bridge_data},
};

#[derive(Debug, Clone)]
pub struct DepositRequest<'a> {
    pub vault_key: &'a str,
    pub deposit_token: &'a str,
    /// User-entered decimal amount of the deposit asset.
    pub amount: &'a str,
    pub owner: Address,
}

/// Everything a deposit needs, resolved upfront: the step list, the scaled
/// amount, the slippage-adjusted minimum mint and the bridge fee.
#[derive(Debug, Clone)]
pub struct DepositPlan {
    pub steps: Vec<StepKind>,
    pub vault_key: String,
    pub owner: Address,
    pub deposit_token: TokenConfig,
    pub teller: Address,
    pub boring_vault: Address,
    pub amount: U256,
    pub minimum_mint: U256,
    pub fee: U256,
    pub bridge_data: Option<BridgeData>,
}

/// amount * 1e18 / rate, discounted by the default slippage.
fn minimum_mint(deposit_amount: U256, rate: U256) -> U256 {
    let mint = deposit_amount * WAD / rate;
    mint - mint * DEFAULT_SLIPPAGE_WAD / WAD
}

impl Sequencer<'_> {
    pub async fn plan_deposit(&self, request: DepositRequest<'_>) -> Result<DepositPlan, FlowError> {
        let vault = self
            .config
            .vault_by_key(request.vault_key)
            .map_err(FlowError::config)?;
        let token = vault
            .deposit_token(request.deposit_token)
            .map_err(FlowError::config)?;

        let amount = amounts::parse_units(request.amount, 18)
            .map_err(|err| FlowError::InvalidAmount(format!("{err:#}")))?;
        if amount.is_zero() {
            return Err(FlowError::InvalidAmount("amount must be positive".into()));
        }

        let rate = self
            .connector
            .rate_in_quote(vault.contracts.accountant, token.address)
            .await
            .map_err(|err| FlowError::read("exchange rate", err))?;
        if rate.is_zero() {
            return Err(FlowError::Config(format!(
                "no exchange rate for {} in vault {}",
                token.key, vault.key
            )));
        }
        let minimum_mint = minimum_mint(amount, rate);

        let bridge_required = vault.deposit.bridge_chain_identifier != 0;
        let bridge_data = bridge_required
            .then(|| prepare_bridge_data(vault.deposit.bridge_chain_identifier, request.owner));

        let fee = match &bridge_data {
            Some(bridge_data) => self
                .connector
                .preview_fee(
                    self.config.hub_chain_id,
                    vault.contracts.teller,
                    minimum_mint,
                    bridge_data.clone(),
                )
                .await
                .map_err(|err| FlowError::read("bridge fee preview", err))?,
            None => U256::ZERO,
        };

        let allowance = self
            .connector
            .allowance(
                self.config.hub_chain_id,
                token.address,
                request.owner,
                vault.contracts.boring_vault,
            )
            .await
            .map_err(|err| FlowError::read("allowance", err))?;
        let needs_approval = allowance < amount;

        Ok(DepositPlan {
            steps: plan_steps(FlowDirection::Deposit, bridge_required, needs_approval),
            vault_key: vault.key.clone(),
            owner: request.owner,
            deposit_token: token.clone(),
            teller: vault.contracts.teller,
            boring_vault: vault.contracts.boring_vault,
            amount,
            minimum_mint,
            fee,
            bridge_data,
        })
    }

    /// Execute a deposit plan step by step, invoking `on_update` after every
    /// status transition. Halts on the first failure.
    pub async fn run_deposit(
        &self,
        plan: &DepositPlan,
        on_update: &mut dyn FnMut(&FlowStatus),
    ) -> FlowStatus {
        let mut status = FlowStatus::new(FlowDirection::Deposit, &plan.steps);
        on_update(&status);

        let hub = self.config.hub_chain_id;
        for kind in &plan.steps {
            status.begin(*kind);
            on_update(&status);
            info!("Deposit into {}: running {kind:?} step", plan.vault_key);

            let result = match kind {
                StepKind::Approve => {
                    self.connector
                        .approve(
                            hub,
                            plan.deposit_token.address,
                            plan.boring_vault,
                            plan.amount,
                        )
                        .await
                }
                StepKind::Deposit => match &plan.bridge_data {
                    Some(bridge_data) => {
                        self.connector
                            .deposit_and_bridge(
                                plan.teller,
                                plan.deposit_token.address,
                                plan.amount,
                                plan.minimum_mint,
                                bridge_data.clone(),
                                plan.fee,
                            )
                            .await
                    }
                    None => {
                        self.connector
                            .deposit(
                                plan.teller,
                                plan.deposit_token.address,
                                plan.amount,
                                plan.minimum_mint,
                            )
                            .await
                    }
                },
                other => Err(anyhow::anyhow!("step {other:?} is not part of a deposit")),
            };

            match result {
                Ok(tx_hash) => {
                    status.complete(*kind, tx_hash, self.explorer_link(hub, tx_hash));
                    on_update(&status);
                }
                Err(err) => {
                    warn!(
                        "Deposit into {} failed at {kind:?}: {err:?}",
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
}
