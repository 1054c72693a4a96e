mod common;

use alloy::primitives::U256;

use common::{MockConnector, WAD, owner, test_config};
use nucleus_optimizer::error::FlowError;
use nucleus_optimizer::flow::{
    DepositRequest, FlowStatus, Sequencer, StepKind, StepStatus, WithdrawRequest,
};

fn no_updates() -> impl FnMut(&FlowStatus) {
    |_status: &FlowStatus| {}
}

#[tokio::test]
async fn deposit_plans_approval_when_allowance_is_short() {
    let config = test_config();
    let connector = MockConnector {
        allowance: U256::from(WAD), // 1 token approved, depositing 10
        ..MockConnector::default()
    };
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "sseth",
            deposit_token: "weth",
            amount: "10",
            owner: owner(),
        })
        .await
        .unwrap();

    assert_eq!(plan.steps, vec![StepKind::Approve, StepKind::Deposit]);
    assert_eq!(plan.amount, U256::from(10u64) * U256::from(WAD));
    assert!(plan.bridge_data.is_none());
    assert!(plan.fee.is_zero());
}

#[tokio::test]
async fn deposit_skips_approval_when_allowance_covers_amount() {
    let config = test_config();
    let connector = MockConnector {
        allowance: U256::from(10u64) * U256::from(WAD),
        ..MockConnector::default()
    };
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "sseth",
            deposit_token: "weth",
            amount: "10",
            owner: owner(),
        })
        .await
        .unwrap();

    assert_eq!(plan.steps, vec![StepKind::Deposit]);
}

#[tokio::test]
async fn deposit_runs_approve_then_deposit() {
    let config = test_config();
    let connector = MockConnector::default();
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "sseth",
            deposit_token: "weth",
            amount: "2.5",
            owner: owner(),
        })
        .await
        .unwrap();
    let status = sequencer.run_deposit(&plan, &mut no_updates()).await;

    assert!(status.is_complete());
    let approve = status.step(StepKind::Approve).unwrap();
    assert_eq!(approve.status, StepStatus::Done);
    assert!(approve.tx_hash.is_some());
    assert!(
        approve
            .explorer_link
            .as_deref()
            .is_some_and(|link| link.starts_with("https://etherscan.io/tx/0x"))
    );

    let writes: Vec<_> = connector
        .recorded_calls()
        .into_iter()
        .filter(|call| call == "approve" || call == "deposit")
        .collect();
    assert_eq!(writes, vec!["approve", "deposit"]);
}

#[tokio::test]
async fn failed_deposit_keeps_completed_approval() {
    let config = test_config();
    let connector = MockConnector::with_failing(&["deposit"]);
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "sseth",
            deposit_token: "weth",
            amount: "10",
            owner: owner(),
        })
        .await
        .unwrap();
    let status = sequencer.run_deposit(&plan, &mut no_updates()).await;

    assert!(status.has_error());
    assert_eq!(
        status.step(StepKind::Approve).unwrap().status,
        StepStatus::Done
    );
    let deposit = status.step(StepKind::Deposit).unwrap();
    assert_eq!(deposit.status, StepStatus::Error);
    assert!(
        status
            .error_message()
            .is_some_and(|message| message.contains("injected failure"))
    );
}

#[tokio::test]
async fn bridged_vault_deposits_through_deposit_and_bridge() {
    let config = test_config();
    let connector = MockConnector {
        preview_fee: U256::from(1_000u64),
        ..MockConnector::default()
    };
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "bobaeth",
            deposit_token: "weth",
            amount: "1",
            owner: owner(),
        })
        .await
        .unwrap();

    assert_eq!(plan.fee, U256::from(1_000u64));
    let bridge_data = plan.bridge_data.as_ref().unwrap();
    assert_eq!(bridge_data.chainSelector, 30280);
    assert_eq!(bridge_data.destinationChainReceiver, owner());

    let status = sequencer.run_deposit(&plan, &mut no_updates()).await;
    assert!(status.is_complete());
    assert_eq!(connector.count_calls("deposit_and_bridge"), 1);
    assert_eq!(connector.count_calls("deposit"), 0);
}

#[tokio::test]
async fn deposit_rejects_zero_and_unknown_inputs() {
    let config = test_config();
    let connector = MockConnector::default();
    let sequencer = Sequencer::new(&connector, &config);

    let err = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "sseth",
            deposit_token: "weth",
            amount: "0",
            owner: owner(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::InvalidAmount(_)));

    let err = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "sseth",
            deposit_token: "usdc",
            amount: "1",
            owner: owner(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Config(_)));
}

#[tokio::test]
async fn withdraw_without_bridge_identifier_has_no_bridge_step() {
    let config = test_config();
    let connector = MockConnector::default();
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_withdraw(WithdrawRequest {
            vault_key: "sseth",
            want_token: "weth",
            amount: "3",
            owner: owner(),
        })
        .await
        .unwrap();

    assert!(!plan.steps.contains(&StepKind::Bridge));
    assert_eq!(
        plan.steps,
        vec![StepKind::Approve, StepKind::UpdateWithdrawRequest]
    );
    assert!(plan.bridge_data.is_none());
}

#[tokio::test]
async fn withdraw_posts_request_at_discounted_price() {
    let config = test_config();
    let connector = MockConnector {
        rate_in_quote: U256::from(2u64) * U256::from(WAD),
        allowance: U256::MAX,
        ..MockConnector::default()
    };
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_withdraw(WithdrawRequest {
            vault_key: "sseth",
            want_token: "weth",
            amount: "1",
            owner: owner(),
        })
        .await
        .unwrap();

    // 2.0 rate minus 0.5% slippage.
    assert_eq!(plan.atomic_price, U256::from(1_990_000_000_000_000_000u128));
    assert_eq!(plan.steps, vec![StepKind::UpdateWithdrawRequest]);

    let status = sequencer.run_withdraw(&plan, &mut no_updates()).await;
    assert!(status.is_complete());
    assert_eq!(connector.count_calls("update_atomic_request"), 1);
}

#[tokio::test]
async fn bridged_withdraw_runs_bridge_approve_request_in_order() {
    let config = test_config();
    let connector = MockConnector::default();
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_withdraw(WithdrawRequest {
            vault_key: "bobaeth",
            want_token: "weth",
            amount: "5",
            owner: owner(),
        })
        .await
        .unwrap();
    assert_eq!(plan.source_chain_id, 1329);
    assert_eq!(
        plan.steps,
        vec![
            StepKind::Bridge,
            StepKind::Approve,
            StepKind::UpdateWithdrawRequest
        ]
    );

    let status = sequencer.run_withdraw(&plan, &mut no_updates()).await;
    assert!(status.is_complete());

    let writes: Vec<_> = connector
        .recorded_calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call.as_str(),
                "bridge_shares" | "approve" | "update_atomic_request"
            )
        })
        .collect();
    assert_eq!(writes, vec!["bridge_shares", "approve", "update_atomic_request"]);

    // The bridge leg confirms on the source chain, which has no explorer.
    assert!(
        status
            .step(StepKind::Bridge)
            .unwrap()
            .explorer_link
            .is_none()
    );
    assert!(
        status
            .step(StepKind::Approve)
            .unwrap()
            .explorer_link
            .is_some()
    );
}

#[tokio::test]
async fn bridge_failure_halts_before_later_steps() {
    let config = test_config();
    let connector = MockConnector::with_failing(&["bridge_shares"]);
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_withdraw(WithdrawRequest {
            vault_key: "bobaeth",
            want_token: "weth",
            amount: "5",
            owner: owner(),
        })
        .await
        .unwrap();
    let status = sequencer.run_withdraw(&plan, &mut no_updates()).await;

    assert_eq!(
        status.step(StepKind::Bridge).unwrap().status,
        StepStatus::Error
    );
    assert_eq!(
        status.step(StepKind::Approve).unwrap().status,
        StepStatus::Idle
    );
    assert_eq!(
        status.step(StepKind::UpdateWithdrawRequest).unwrap().status,
        StepStatus::Idle
    );
    assert_eq!(connector.count_calls("approve"), 0);
    assert_eq!(connector.count_calls("update_atomic_request"), 0);
}

#[tokio::test]
async fn status_updates_arrive_in_order() {
    let config = test_config();
    let connector = MockConnector {
        allowance: U256::MAX,
        ..MockConnector::default()
    };
    let sequencer = Sequencer::new(&connector, &config);

    let plan = sequencer
        .plan_deposit(DepositRequest {
            vault_key: "sseth",
            deposit_token: "weth",
            amount: "1",
            owner: owner(),
        })
        .await
        .unwrap();

    let mut snapshots: Vec<Vec<StepStatus>> = Vec::new();
    let mut on_update = |status: &FlowStatus| {
        snapshots.push(status.steps.iter().map(|step| step.status).collect());
    };
    sequencer.run_deposit(&plan, &mut on_update).await;

    assert_eq!(
        snapshots,
        vec![
            vec![StepStatus::Idle],
            vec![StepStatus::Processing],
            vec![StepStatus::Done],
        ]
    );
}
