//! Fixed-point conversion between human-readable token amounts and base units.
//!
//! Everything here stays in `U256`; amounts never pass through floating point.

use ethers::types::U256;
use ethers::utils::format_units;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Invalid amount: {0}")]
    Invalid(String),
    #[error("Amount {amount} has more than {decimals} decimal places")]
    TooManyDecimals { amount: String, decimals: u8 },
    #[error("Amount overflows uint256")]
    Overflow,
}

/// Parse a run of ASCII digits; empty means zero.
fn parse_digits(digits: &str) -> Result<U256, UnitsError> {
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| UnitsError::Overflow)
}

/// Scale a decimal string (e.g. `"2.5"`) to the token's smallest unit.
///
/// Unlike `ethers::utils::parse_units`, excess fractional digits are rejected
/// rather than truncated, and every step is overflow-checked.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let trimmed = amount.trim();

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::Invalid(trimmed.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals {
            amount: trimmed.to_string(),
            decimals,
        });
    }

    let scale = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or(UnitsError::Overflow)?;
    // below 10^decimals, so this product cannot overflow once `scale` exists
    let fraction_part = parse_digits(fraction)? * U256::exp10(decimals as usize - fraction.len());

    parse_digits(whole)?
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_part))
        .ok_or(UnitsError::Overflow)
}

/// Convert every amount and return the converted values with their exact sum.
pub fn total_base_units<S: AsRef<str>>(
    amounts: &[S],
    decimals: u8,
) -> Result<(Vec<U256>, U256), UnitsError> {
    let mut converted = Vec::with_capacity(amounts.len());
    let mut total = U256::zero();
    for amount in amounts {
        let value = to_base_units(amount.as_ref(), decimals)?;
        total = total.checked_add(value).ok_or(UnitsError::Overflow)?;
        converted.push(value);
    }
    Ok((converted, total))
}

pub fn format_base_units(value: U256, decimals: u8) -> String {
    format_units(value, decimals as u32).unwrap_or_else(|_| value.to_string())
}
