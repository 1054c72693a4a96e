//! Fixed-point conversions between user-entered decimal strings, on-chain
//! integer amounts (1e18), the 1e8 price feed scale, and display strings.
//! All conversions are integer multiply-then-divide and truncate, never round.

use alloy::primitives::U256;
use anyhow::{Context, Result};

use crate::defaults::{PRICE_SCALE, WAD};

/// Parse a decimal string into an integer scaled by `decimals`.
///
/// Fraction digits beyond `decimals` are truncated. Overflow is an error.
pub fn parse_units(input: &str, decimals: u32) -> Result<U256> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("Amount is empty");
    }

    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };

    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        anyhow::bail!("Invalid decimal amount: {input}");
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).with_context(|| format!("Amount too large: {input}"))?
    };

    let mut fraction_padded = fraction.to_string();
    fraction_padded.truncate(decimals as usize);
    while fraction_padded.len() < decimals as usize {
        fraction_padded.push('0');
    }
    let fraction = if fraction_padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&fraction_padded, 10)
            .with_context(|| format!("Amount too large: {input}"))?
    };

    let scale = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .context("Decimal scale overflow")?;
    whole
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(fraction))
        .with_context(|| format!("Amount too large: {input}"))
}

/// Format an integer scaled by `decimals` as a decimal string with thousands
/// separators, truncated to at most `max_fraction_digits` fraction digits.
pub fn format_units(value: U256, decimals: u32, max_fraction_digits: usize) -> String {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / scale;
    let fraction = value % scale;

    let mut fraction = format!("{fraction:0>width$}", width = decimals as usize);
    fraction.truncate(max_fraction_digits);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        group_thousands(&whole.to_string())
    } else {
        format!("{}.{fraction}", group_thousands(&whole.to_string()))
    }
}

/// Convert a 1e18 amount to a 1e18 USD value using a 1e8 price.
pub fn usd_from_wad(amount_wad: U256, price_e8: U256) -> U256 {
    amount_wad * price_e8 / PRICE_SCALE
}

/// Format a 1e18 USD value as currency with two (truncated) cent digits.
pub fn format_usd_wad(usd_wad: U256) -> String {
    let dollars = usd_wad / WAD;
    let cents = usd_wad % WAD * U256::from(100u64) / WAD;
    format!("${}.{:02}", group_thousands(&dollars.to_string()), cents.to::<u64>())
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
