use std::time::Duration;

use alloy::primitives::{U256, address, Address};

/// 1e18, the scale of token amounts and exchange rates.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// 1e8, the scale of the ETH/USD price feed.
pub const PRICE_SCALE: U256 = U256::from_limbs([100_000_000, 0, 0, 0]);

/// Default slippage applied to minimum mint and atomic price, 0.5% in WAD.
pub const DEFAULT_SLIPPAGE_WAD: U256 = U256::from_limbs([5_000_000_000_000_000, 0, 0, 0]);

/// Placeholder address the tellers use for the native token as bridge fee asset.
pub const NATIVE_TOKEN_PLACEHOLDER: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Gas forwarded with a bridge message.
pub const BRIDGE_MESSAGE_GAS: u64 = 100_000;

/// Withdraw requests stay open for three days.
pub const WITHDRAW_DEADLINE: Duration = Duration::from_secs(3 * 24 * 60 * 60);

pub const APY_LOOKBACK_DAYS: u32 = 14;

/// Receipt wait: 60s timeout, 10s polling, 5 retries, 5s between retries.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const RECEIPT_RETRY_COUNT: u32 = 5;
pub const RECEIPT_RETRY_DELAY: Duration = Duration::from_secs(5);
