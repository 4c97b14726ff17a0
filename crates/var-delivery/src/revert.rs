//! Revert payload decoding.

use alloy_primitives::hex;

/// Human-readable description of a revert payload.
///
/// `Error(string)` and `Panic(uint256)` payloads decode to their message.
/// Anything else is described by its selector, or as raw hex when it is too
/// short to carry one.
pub fn describe_revert(data: &[u8]) -> String {
	if data.is_empty() {
		return "execution reverted without data".to_string();
	}
	if let Some(reason) = alloy_sol_types::decode_revert_reason(data) {
		return reason;
	}
	if data.len() >= 4 {
		format!(
			"execution reverted with custom error 0x{} ({} bytes)",
			hex::encode(&data[..4]),
			data.len()
		)
	} else {
		format!("execution reverted: 0x{}", hex::encode(data))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;
	use alloy_sol_types::{Panic, Revert, SolError};

	#[test]
	fn test_error_string() {
		let data = Revert {
			reason: "Only deployer bot".to_string(),
		}
		.abi_encode();
		assert!(describe_revert(&data).contains("Only deployer bot"));
	}

	#[test]
	fn test_panic_code() {
		let data = Panic {
			code: U256::from(0x11u64),
		}
		.abi_encode();
		let described = describe_revert(&data);
		assert!(described.to_lowercase().contains("overflow"), "{described}");
	}

	#[test]
	fn test_custom_error_selector() {
		let data = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0xff, 0xfe];
		assert_eq!(
			describe_revert(&data),
			"execution reverted with custom error 0xdeadbeef (8 bytes)"
		);
	}

	#[test]
	fn test_empty_and_short_payloads() {
		assert_eq!(describe_revert(&[]), "execution reverted without data");
		assert_eq!(describe_revert(&[0xff]), "execution reverted: 0xff");
	}
}
