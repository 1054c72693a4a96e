//! Headless engine for a Nucleus yield-vault optimizer front end.
//!
//! The crate covers everything below the UI: immutable vault/vault-group
//! configuration, alloy-backed chain access, fixed-point amount math, vault
//! metrics (TVL, APY, balances, rates), backend API clients, and the
//! deposit/withdraw step sequencer that orchestrates approval, bridging and
//! atomic-queue redemption requests across chains.

pub mod amounts;
pub mod api;
pub mod client;
pub mod config;
pub mod contracts;
pub mod defaults;
pub mod error;
pub mod flow;
pub mod metrics;

pub use client::{EvmClient, VaultConnector};
pub use config::Config;
pub use error::FlowError;
pub use flow::{
    DepositPlan, DepositRequest, FlowDirection, FlowStatus, Sequencer, StepKind, StepStatus,
    TransactionStep, WithdrawPlan, WithdrawRequest, plan_steps,
};
