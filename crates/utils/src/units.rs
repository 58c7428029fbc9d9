// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{
    utils::{format_units, parse_units},
    U256,
};
use anyhow::{anyhow, Context, Result};

/// Decimals of the confidential test token.
pub const TOKEN_DECIMALS: u8 = 6;

/// Parse a human readable amount such as `"12.5"` into base units of a token with `decimals`.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<u64> {
    let parsed = parse_units(amount, decimals)
        .with_context(|| format!("Could not parse amount '{amount}'"))?;
    let value = parsed.get_absolute();
    u64::try_from(value).map_err(|_| anyhow!("Amount '{amount}' does not fit in 64 bits"))
}

/// Render base units as a decimal string, trimming trailing zeros.
pub fn format_amount(value: u64, decimals: u8) -> Result<String> {
    let formatted = format_units(U256::from(value), decimals)
        .with_context(|| format!("Could not format amount {value}"))?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    Ok(trimmed.to_string())
}
