//! Event extraction from receipts.
//!
//! A receipt can carry logs from several contracts. Each log is decoded on its
//! own against the given interface; logs that do not belong to it simply
//! decode to nothing. Only the absence of any match is an error.

use alloy_dyn_abi::{DynSolValue, EventExt};
use alloy_json_abi::{Event, JsonAbi};
use thiserror::Error;
use var_types::{Log, ParsedEvent, TransactionHash, TransactionReceipt};

/// Errors raised while extracting events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
	/// No log in the receipt decoded to the requested event.
	#[error("Event {event} not found in receipt of {tx_hash}")]
	NotFound {
		event: String,
		tx_hash: TransactionHash,
	},
}

/// Decodes `log` against every non-anonymous event in `abi` whose selector
/// matches its first topic. Returns `None` if none decodes.
pub fn decode_log(abi: &JsonAbi, log: &Log) -> Option<ParsedEvent> {
	let selector = log.topics.first()?;
	abi.events()
		.filter(|event| !event.anonymous && event.selector() == *selector)
		.find_map(|event| {
			let decoded = event
				.decode_log_parts(log.topics.iter().copied(), &log.data)
				.ok()?;
			Some(ParsedEvent {
				name: event.name.clone(),
				emitter: log.address,
				args: name_arguments(event, decoded.indexed, decoded.body),
			})
		})
}

/// Pairs decoded values with their parameter names in declaration order.
fn name_arguments(
	event: &Event,
	indexed: Vec<DynSolValue>,
	body: Vec<DynSolValue>,
) -> Vec<(String, DynSolValue)> {
	let mut indexed = indexed.into_iter();
	let mut body = body.into_iter();
	event
		.inputs
		.iter()
		.enumerate()
		.filter_map(|(position, param)| {
			let value = if param.indexed {
				indexed.next()
			} else {
				body.next()
			}?;
			let name = if param.name.is_empty() {
				position.to_string()
			} else {
				param.name.clone()
			};
			Some((name, value))
		})
		.collect()
}

/// Returns the first event named `event_name` in `receipt`.
///
/// When several logs decode to the same name the first one wins and the
/// others are reported with a warning.
///
/// # Errors
///
/// Returns `EventError::NotFound` when no log decodes to `event_name`.
pub fn extract_event(
	receipt: &TransactionReceipt,
	abi: &JsonAbi,
	event_name: &str,
) -> Result<ParsedEvent, EventError> {
	let (first, matches) = receipt
		.logs
		.iter()
		.map(|log| decode_log(abi, log))
		.fold((None, 0usize), |(first, matches), decoded| match decoded {
			Some(event) if event.name == event_name => (first.or(Some(event)), matches + 1),
			_ => (first, matches),
		});

	if matches > 1 {
		tracing::warn!(
			event = event_name,
			tx_hash = %receipt.hash,
			matches,
			"Multiple matching events in receipt, using the first"
		);
	}

	first.ok_or_else(|| EventError::NotFound {
		event: event_name.to_string(),
		tx_hash: receipt.hash,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{keccak256, Address, U256};
	use var_types::utils::builders::{LogBuilder, TransactionReceiptBuilder};

	const FACTORY_ABI: &str = r#"[
		{"type":"event","name":"Deployed","anonymous":false,"inputs":[
			{"name":"proxy","type":"address","indexed":true},
			{"name":"implementation","type":"address","indexed":false},
			{"name":"symbol","type":"string","indexed":false}
		]},
		{"type":"event","name":"BotUpdated","anonymous":false,"inputs":[
			{"name":"bot","type":"address","indexed":true}
		]}
	]"#;

	fn abi() -> JsonAbi {
		serde_json::from_str(FACTORY_ABI).unwrap()
	}

	fn deployed_log(emitter: Address, proxy: Address, implementation: Address) -> Log {
		let event = abi().event("Deployed").unwrap()[0].clone();
		let body = DynSolValue::Tuple(vec![
			DynSolValue::Address(implementation),
			DynSolValue::String("TKN".to_string()),
		])
		.abi_encode_params();
		LogBuilder::new(emitter)
			.topic(event.selector())
			.address_topic(proxy)
			.data(body)
			.build()
	}

	fn transfer_log(token: Address) -> Log {
		// Transfer(address,address,uint256) from an unrelated token.
		LogBuilder::new(token)
			.topic(keccak256("Transfer(address,address,uint256)"))
			.address_topic(Address::ZERO)
			.address_topic(Address::repeat_byte(0x77))
			.data(U256::from(1000u64).to_be_bytes::<32>().to_vec())
			.build()
	}

	#[test]
	fn test_extract_skips_unrelated_logs() {
		let factory = Address::repeat_byte(0xfa);
		let proxy = Address::repeat_byte(0x99);
		let implementation = Address::repeat_byte(0x11);

		let receipt = TransactionReceiptBuilder::new()
			.with_logs(vec![
				transfer_log(Address::repeat_byte(0x01)),
				deployed_log(factory, proxy, implementation),
				// Right selector, truncated data: must not abort the scan.
				LogBuilder::new(factory)
					.topic(abi().event("Deployed").unwrap()[0].selector())
					.data(vec![0u8; 3])
					.build(),
			])
			.build();

		let event = extract_event(&receipt, &abi(), "Deployed").unwrap();
		assert_eq!(event.name, "Deployed");
		assert_eq!(event.emitter, factory);
		assert_eq!(event.address_arg("proxy"), Some(proxy));
		assert_eq!(event.address_arg("implementation"), Some(implementation));
		assert_eq!(
			event.arg("symbol"),
			Some(&DynSolValue::String("TKN".to_string()))
		);
	}

	#[test]
	fn test_extract_not_found() {
		let receipt = TransactionReceiptBuilder::new()
			.with_logs(vec![transfer_log(Address::repeat_byte(0x01))])
			.build();

		let err = extract_event(&receipt, &abi(), "Deployed").unwrap_err();
		assert_eq!(
			err,
			EventError::NotFound {
				event: "Deployed".to_string(),
				tx_hash: receipt.hash,
			}
		);
	}

	#[test]
	fn test_extract_other_event_name_does_not_match() {
		let bot_event = abi().event("BotUpdated").unwrap()[0].clone();
		let receipt = TransactionReceiptBuilder::new()
			.with_log(
				LogBuilder::new(Address::repeat_byte(0xfa))
					.topic(bot_event.selector())
					.address_topic(Address::repeat_byte(0xb0))
					.build(),
			)
			.build();

		assert!(extract_event(&receipt, &abi(), "Deployed").is_err());
		let event = extract_event(&receipt, &abi(), "BotUpdated").unwrap();
		assert_eq!(event.address_arg("bot"), Some(Address::repeat_byte(0xb0)));
	}

	#[test]
	fn test_multiple_matches_first_wins() {
		let factory = Address::repeat_byte(0xfa);
		let receipt = TransactionReceiptBuilder::new()
			.with_logs(vec![
				deployed_log(factory, Address::repeat_byte(0x01), Address::ZERO),
				deployed_log(factory, Address::repeat_byte(0x02), Address::ZERO),
			])
			.build();

		let event = extract_event(&receipt, &abi(), "Deployed").unwrap();
		assert_eq!(event.address_arg("proxy"), Some(Address::repeat_byte(0x01)));
	}

	#[test]
	fn test_decode_log_without_topics() {
		let log = LogBuilder::new(Address::ZERO).data(vec![1, 2, 3]).build();
		assert_eq!(decode_log(&abi(), &log), None);
	}
}
