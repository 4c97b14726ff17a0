//! Transaction delivery types.
//!
//! These are the shapes the orchestrator hands to, and receives from, the
//! delivery layer. They deliberately carry only what the deployment flows
//! consume so that tests can build them without a node.

use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A call or contract creation to be signed by the session wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	/// Target contract. `None` creates a new contract from `data`.
	pub to: Option<Address>,
	/// Calldata, or init code for a creation.
	pub data: Bytes,
	/// Native value attached to the call.
	pub value: U256,
}

impl Transaction {
	/// Builds a call to an existing contract.
	pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
		Self {
			to: Some(to),
			data: data.into(),
			value: U256::ZERO,
		}
	}

	/// Builds a contract creation from init code.
	pub fn create(init_code: impl Into<Bytes>) -> Self {
		Self {
			to: None,
			data: init_code.into(),
			value: U256::ZERO,
		}
	}

	/// Returns true if this transaction deploys a contract.
	pub fn is_create(&self) -> bool {
		self.to.is_none()
	}
}

impl From<Transaction> for TransactionRequest {
	fn from(tx: Transaction) -> Self {
		let to = match tx.to {
			Some(address) => TxKind::Call(address),
			None => TxKind::Create,
		};

		TransactionRequest {
			to: Some(to),
			value: Some(tx.value),
			input: TransactionInput {
				input: Some(tx.data),
				data: None,
			},
			..Default::default()
		}
	}
}

/// Hash of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub B256);

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<B256> for TransactionHash {
	fn from(hash: B256) -> Self {
		Self(hash)
	}
}

/// Event log emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
	/// Contract that emitted the log.
	pub address: Address,
	/// Indexed parameters. Topic 0 is the event selector for non-anonymous events.
	pub topics: Vec<B256>,
	/// ABI-encoded non-indexed parameters.
	pub data: Bytes,
}

/// Confirmed outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// Hash of the transaction.
	pub hash: TransactionHash,
	/// Block the transaction was included in.
	pub block_number: u64,
	/// Execution status.
	pub success: bool,
	/// Address of the created contract, for creations.
	pub contract_address: Option<Address>,
	/// Logs in emission order.
	pub logs: Vec<Log>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_call_converts_to_request() {
		let to = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
		let request: TransactionRequest = Transaction::call(to, vec![0xde, 0xad]).into();

		assert_eq!(request.to, Some(TxKind::Call(to)));
		assert_eq!(request.value, Some(U256::ZERO));
		assert_eq!(request.input.input().map(|d| d.to_vec()), Some(vec![0xde, 0xad]));
	}

	#[test]
	fn test_create_converts_to_request() {
		let tx = Transaction::create(vec![0x60, 0x80]);
		assert!(tx.is_create());

		let request: TransactionRequest = tx.into();
		assert_eq!(request.to, Some(TxKind::Create));
	}

	#[test]
	fn test_hash_display_is_prefixed_hex() {
		let hash = TransactionHash(B256::repeat_byte(0xab));
		assert!(hash.to_string().starts_with("0xabab"));
		assert_eq!(hash.to_string().len(), 66);
	}
}
