//! Exact conversion between decimal token amounts and base units.
//!
//! Amounts are handled as strings and `U256` only. Nothing here goes through
//! floating point, so `parse_amount(&format_amount(x)) == x` for every `x`.

use crate::TypesError;
use alloy_primitives::U256;

/// Decimal scale of every token amount handled by the manager.
pub const TOKEN_DECIMALS: u8 = 18;

/// Parses a human-entered decimal amount into base units at 18 decimals.
pub fn parse_amount(input: &str) -> Result<U256, TypesError> {
	parse_amount_with_decimals(input, TOKEN_DECIMALS)
}

/// Parses a decimal amount into base units at the given scale.
///
/// Accepts plain digits with at most one `.`. More fractional digits than
/// `decimals` is rejected rather than rounded.
///
/// # Errors
///
/// Returns `TypesError::InvalidAmount` for empty input, signs, exponents,
/// excess precision or values that do not fit in 256 bits.
pub fn parse_amount_with_decimals(input: &str, decimals: u8) -> Result<U256, TypesError> {
	let invalid = |reason: &str| TypesError::InvalidAmount {
		input: input.to_string(),
		reason: reason.to_string(),
	};

	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err(invalid("amount is empty"));
	}

	let (whole, fraction) = match trimmed.split_once('.') {
		Some((whole, fraction)) => (whole, fraction),
		None => (trimmed, ""),
	};

	if whole.is_empty() && fraction.is_empty() {
		return Err(invalid("amount has no digits"));
	}
	if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
		return Err(invalid("only digits and a single '.' are allowed"));
	}
	if fraction.len() > decimals as usize {
		return Err(invalid(&format!("more than {} decimal places", decimals)));
	}

	let scale = U256::from(10u64).pow(U256::from(decimals));
	let whole_units = if whole.is_empty() {
		U256::ZERO
	} else {
		U256::from_str_radix(whole, 10).map_err(|_| invalid("amount too large"))?
	};

	let padded = format!("{:0<width$}", fraction, width = decimals as usize);
	let fraction_units = if padded.is_empty() {
		U256::ZERO
	} else {
		U256::from_str_radix(&padded, 10).map_err(|_| invalid("invalid fraction"))?
	};

	whole_units
		.checked_mul(scale)
		.and_then(|v| v.checked_add(fraction_units))
		.ok_or_else(|| invalid("amount too large"))
}

/// Formats base units as a decimal amount at 18 decimals.
pub fn format_amount(amount: U256) -> String {
	format_amount_with_decimals(amount, TOKEN_DECIMALS)
}

/// Formats base units as a decimal amount at the given scale.
///
/// Trailing fractional zeros are trimmed but at least one fractional digit is
/// kept, so one token reads `1.0`.
pub fn format_amount_with_decimals(amount: U256, decimals: u8) -> String {
	if decimals == 0 {
		return amount.to_string();
	}

	let divisor = U256::from(10u64).pow(U256::from(decimals));
	let whole = amount / divisor;
	let fractional = amount % divisor;

	let fractional_str = format!(
		"{:0>width$}",
		fractional.to_string(),
		width = decimals as usize
	);
	let trimmed = fractional_str.trim_end_matches('0');

	if trimmed.is_empty() {
		format!("{}.0", whole)
	} else {
		format!("{}.{}", whole, trimmed)
	}
}
