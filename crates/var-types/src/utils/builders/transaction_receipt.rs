//! Transaction receipt builder.

use crate::{Log, TransactionHash, TransactionReceipt};
use alloy_primitives::{Address, B256};

/// Builder for `TransactionReceipt` with sensible defaults.
#[derive(Debug, Clone)]
pub struct TransactionReceiptBuilder {
	hash: TransactionHash,
	block_number: u64,
	success: bool,
	contract_address: Option<Address>,
	logs: Vec<Log>,
}

impl Default for TransactionReceiptBuilder {
	fn default() -> Self {
		Self {
			hash: TransactionHash(B256::repeat_byte(0x11)),
			block_number: 12345,
			success: true,
			contract_address: None,
			logs: Vec::new(),
		}
	}
}

impl TransactionReceiptBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_hash(mut self, hash: TransactionHash) -> Self {
		self.hash = hash;
		self
	}

	pub fn with_block_number(mut self, block_number: u64) -> Self {
		self.block_number = block_number;
		self
	}

	/// Marks the receipt as a creation of `address`.
	pub fn with_contract_address(mut self, address: Address) -> Self {
		self.contract_address = Some(address);
		self
	}

	pub fn with_log(mut self, log: Log) -> Self {
		self.logs.push(log);
		self
	}

	pub fn with_logs(mut self, logs: Vec<Log>) -> Self {
		self.logs = logs;
		self
	}

	pub fn successful(mut self) -> Self {
		self.success = true;
		self
	}

	pub fn failed(mut self) -> Self {
		self.success = false;
		self
	}

	pub fn build(self) -> TransactionReceipt {
		TransactionReceipt {
			hash: self.hash,
			block_number: self.block_number,
			success: self.success,
			contract_address: self.contract_address,
			logs: self.logs,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_and_overrides() {
		let receipt = TransactionReceiptBuilder::new().build();
		assert!(receipt.success);
		assert_eq!(receipt.block_number, 12345);
		assert!(receipt.logs.is_empty());

		let created = Address::repeat_byte(0x42);
		let receipt = TransactionReceiptBuilder::new()
			.failed()
			.with_block_number(7)
			.with_contract_address(created)
			.build();
		assert!(!receipt.success);
		assert_eq!(receipt.block_number, 7);
		assert_eq!(receipt.contract_address, Some(created));
	}
}
