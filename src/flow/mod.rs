//! The transaction-flow state machine: which steps a deposit or withdraw
//! needs, in what order, and how far the active flow has progressed.
//!
//! Steps run strictly in order. Each one goes idle -> processing -> done, or
//! idle -> processing -> error, and an error halts the flow without touching
//! the status of steps that already completed.

use alloy::primitives::{Address, Bytes, TxHash};

use crate::{
    client::VaultConnector,
    config::Config,
    contracts::BridgeData,
    defaults::{BRIDGE_MESSAGE_GAS, NATIVE_TOKEN_PLACEHOLDER},
};

mod deposit;
mod withdraw;

pub use deposit::{DepositPlan, DepositRequest};
pub use withdraw::{WithdrawPlan, WithdrawRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowDirection {
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Approve,
    Bridge,
    Deposit,
    UpdateWithdrawRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Idle,
    Processing,
    Done,
    Error,
}

#[derive(Debug, Clone)]
pub struct TransactionStep {
    pub kind: StepKind,
    pub status: StepStatus,
    pub tx_hash: Option<TxHash>,
    pub explorer_link: Option<String>,
    pub error: Option<String>,
}

impl TransactionStep {
    fn new(kind: StepKind) -> Self {
        Self {
            kind,
            status: StepStatus::Idle,
            tx_hash: None,
            explorer_link: None,
            error: None,
        }
    }
}

/// Per-flow status aggregate. Created fresh when the user initiates an
/// action, mutated step by step, and reset when the display is dismissed.
#[derive(Debug, Clone)]
pub struct FlowStatus {
    pub direction: FlowDirection,
    pub steps: Vec<TransactionStep>,
}

impl FlowStatus {
    pub fn new(direction: FlowDirection, kinds: &[StepKind]) -> Self {
        Self {
            direction,
            steps: kinds.iter().copied().map(TransactionStep::new).collect(),
        }
    }

    pub fn step(&self, kind: StepKind) -> Option<&TransactionStep> {
        self.steps.iter().find(|step| step.kind == kind)
    }

    fn step_mut(&mut self, kind: StepKind) -> &mut TransactionStep {
        self.steps
            .iter_mut()
            .find(|step| step.kind == kind)
            .expect("step kinds come from the plan that built this status")
    }

    fn begin(&mut self, kind: StepKind) {
        self.step_mut(kind).status = StepStatus::Processing;
    }

    fn complete(&mut self, kind: StepKind, tx_hash: TxHash, explorer_link: Option<String>) {
        let step = self.step_mut(kind);
        step.status = StepStatus::Done;
        step.tx_hash = Some(tx_hash);
        step.explorer_link = explorer_link;
    }

    fn fail(&mut self, kind: StepKind, message: String) {
        let step = self.step_mut(kind);
        step.status = StepStatus::Error;
        step.error = Some(message);
    }

    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|step| step.status == StepStatus::Done)
    }

    pub fn has_error(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.status == StepStatus::Error)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.steps
            .iter()
            .find_map(|step| step.error.as_deref())
    }

    /// Dismissal: everything back to idle so the user can retry from the start.
    pub fn reset(&mut self) {
        for step in &mut self.steps {
            *step = TransactionStep::new(step.kind);
        }
    }
}

/// The ordered step list for a flow, as a pure function of the three inputs
/// that determine it.
pub fn plan_steps(
    direction: FlowDirection,
    bridge_required: bool,
    needs_approval: bool,
) -> Vec<StepKind> {
    let mut steps = Vec::with_capacity(3);
    match direction {
        FlowDirection::Deposit => {
            if needs_approval {
                steps.push(StepKind::Approve);
            }
            steps.push(StepKind::Deposit);
        }
        FlowDirection::Withdraw => {
            if bridge_required {
                steps.push(StepKind::Bridge);
            }
            if needs_approval {
                steps.push(StepKind::Approve);
            }
            steps.push(StepKind::UpdateWithdrawRequest);
        }
    }
    steps
}

/// Destination routing for a teller bridge message: shares go back to the
/// request owner, the fee is paid in the native token.
pub fn prepare_bridge_data(chain_selector: u32, receiver: Address) -> BridgeData {
    BridgeData {
        chainSelector: chain_selector,
        destinationChainReceiver: receiver,
        bridgeFeeToken: NATIVE_TOKEN_PLACEHOLDER,
        messageGas: BRIDGE_MESSAGE_GAS,
        data: Bytes::new(),
    }
}

/// Plans and drives deposit/withdraw flows against a [`VaultConnector`].
pub struct Sequencer<'a> {
    connector: &'a dyn VaultConnector,
    config: &'a Config,
}

impl<'a> Sequencer<'a> {
    pub fn new(connector: &'a dyn VaultConnector, config: &'a Config) -> Self {
        Self { connector, config }
    }

    fn explorer_link(&self, chain_id: u64, tx_hash: TxHash) -> Option<String> {
        self.config.explorer_tx_link(chain_id, &tx_hash.to_string())
    }
}
