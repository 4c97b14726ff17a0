//! Address parsing and display helpers.

use crate::TypesError;
use alloy_primitives::Address;

/// Parses an operator-supplied address.
///
/// Requires a `0x` prefix and 40 hex digits. Mixed-case input must carry a
/// valid EIP-55 checksum; all-lowercase and all-uppercase input is accepted
/// as is.
pub fn parse_address(input: &str) -> Result<Address, TypesError> {
	let trimmed = input.trim();
	let invalid = || TypesError::InvalidAddress(trimmed.to_string());

	let hex = trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
		.ok_or_else(invalid)?;
	if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(invalid());
	}

	let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
	let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
	if has_lower && has_upper {
		return Address::parse_checksummed(format!("0x{}", hex), None).map_err(|_| invalid());
	}

	hex.parse::<Address>().map_err(|_| invalid())
}

/// Returns true if the input would be accepted by [`parse_address`].
pub fn is_valid_address(input: &str) -> bool {
	parse_address(input).is_ok()
}

/// Shortens an address for display, e.g. `0x5FbD...0aa3`.
pub fn format_address_short(address: &Address) -> String {
	let full = address.to_checksum(None);
	format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
