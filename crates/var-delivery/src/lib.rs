//! Transaction lifecycle for the VAR deployment manager.
//!
//! This crate submits transactions, waits for their confirmation and turns
//! receipts into typed results. The chain is reached through
//! [`DeliveryInterface`]; [`TransactionManager`] layers contract deployment,
//! ABI-encoded calls and revert recovery on top of it.
//!
//! Submission failures and confirmation failures are reported the same way,
//! as [`DeliveryError::TransactionFailed`]. Nothing is retried.

use alloy_dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{hex, Address, Bytes, U256};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use var_types::{Transaction, TransactionHash, TransactionReceipt};

pub mod events;
pub mod revert;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use events::{decode_log, extract_event, EventError};

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error, Clone)]
pub enum DeliveryError {
	/// No signing key is configured for the session.
	#[error("Wallet not configured")]
	WalletNotConfigured,
	/// The signing key could not be parsed.
	#[error("Invalid private key: {0}")]
	InvalidKey(String),
	/// A read against the node failed.
	#[error("Network error: {0}")]
	Network(String),
	/// Submission, confirmation or execution of a transaction failed.
	#[error("Transaction failed{}: {reason}", .hash.map(|h| format!(" ({h})")).unwrap_or_default())]
	TransactionFailed {
		/// Set once the transaction was accepted by the node.
		hash: Option<TransactionHash>,
		/// Decoded revert reason, or the node's error message.
		reason: String,
		/// Raw revert payload, when the node returned one.
		revert_data: Option<Bytes>,
	},
	/// A creation was confirmed but the receipt names no contract.
	#[error("Deployment {0} confirmed without a contract address")]
	MissingContractAddress(TransactionHash),
	/// Calldata could not be encoded or return data decoded.
	#[error("ABI error: {0}")]
	Abi(String),
}

impl DeliveryError {
	/// The raw revert payload carried by a failed transaction.
	pub fn revert_data(&self) -> Option<&Bytes> {
		match self {
			DeliveryError::TransactionFailed { revert_data, .. } => revert_data.as_ref(),
			_ => None,
		}
	}

	/// Builds a failure from a revert payload, decoding it when possible.
	pub fn reverted(hash: Option<TransactionHash>, data: Bytes) -> Self {
		DeliveryError::TransactionFailed {
			hash,
			reason: revert::describe_revert(&data),
			revert_data: Some(data),
		}
	}
}

/// Trait defining the interface for transaction delivery implementations.
///
/// One implementation is bound to one network and at most one signer.
/// Switching networks means building a new implementation.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait DeliveryInterface: Send + Sync {
	/// Chain id of the bound network.
	fn chain_id(&self) -> u64;

	/// Address of the signing wallet, `None` when no key is configured.
	fn signer_address(&self) -> Option<Address>;

	/// Signs and submits a transaction, returning its hash.
	///
	/// Fails with `WalletNotConfigured` without a signer and with
	/// `TransactionFailed` when the node rejects the transaction (including
	/// reverts caught during gas estimation).
	async fn submit(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError>;

	/// Waits until the transaction has the given number of confirmations and
	/// returns its receipt. The receipt may report a failed execution.
	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError>;

	/// Returns the receipt of a mined transaction.
	async fn get_receipt(&self, hash: &TransactionHash) -> Result<TransactionReceipt, DeliveryError>;

	/// Native balance of an address, in wei.
	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError>;

	/// Runtime code at an address. Empty for accounts without code.
	async fn get_code(&self, address: Address) -> Result<Bytes, DeliveryError>;

	/// Executes a call without submitting it, optionally at a past block.
	///
	/// Reverts are reported as `TransactionFailed` carrying the payload.
	async fn eth_call(&self, tx: Transaction, block: Option<u64>) -> Result<Bytes, DeliveryError>;
}

/// Selects the overload of `name` that accepts `args` and encodes the call.
pub fn encode_call(
	abi: &JsonAbi,
	name: &str,
	args: &[DynSolValue],
) -> Result<(Function, Bytes), DeliveryError> {
	let overloads = abi
		.function(name)
		.ok_or_else(|| DeliveryError::Abi(format!("Function {} not found in ABI", name)))?;

	let mut last_error = None;
	for function in overloads.iter().filter(|f| f.inputs.len() == args.len()) {
		let encoded = conform_integers(function, args)
			.and_then(|args| function.abi_encode_input(&args).map_err(|e| e.to_string()));
		match encoded {
			Ok(data) => return Ok((function.clone(), Bytes::from(data))),
			Err(e) => last_error = Some(e),
		}
	}

	Err(DeliveryError::Abi(match last_error {
		Some(e) => format!("Invalid arguments for {}: {}", name, e),
		None => format!("No overload of {} takes {} argument(s)", name, args.len()),
	}))
}

/// Narrows or widens integer arguments to the width the function declares, so
/// callers can pass amounts as `uint256` regardless of the parameter type.
fn conform_integers(function: &Function, args: &[DynSolValue]) -> Result<Vec<DynSolValue>, String> {
	args.iter()
		.zip(&function.inputs)
		.map(|(arg, param)| match (arg, param.resolve()) {
			(DynSolValue::Uint(value, _), Ok(DynSolType::Uint(bits))) => {
				if value.bit_len() > bits {
					return Err(format!("{} does not fit in uint{}", value, bits));
				}
				Ok(DynSolValue::Uint(*value, bits))
			},
			(DynSolValue::Int(value, _), Ok(DynSolType::Int(bits))) => {
				Ok(DynSolValue::Int(*value, bits))
			},
			_ => Ok(arg.clone()),
		})
		.collect()
}

/// Sends transactions through a delivery implementation and waits for them.
#[derive(Clone)]
pub struct TransactionManager {
	delivery: Arc<dyn DeliveryInterface>,
	confirmations: u64,
}

impl TransactionManager {
	pub fn new(delivery: Arc<dyn DeliveryInterface>, confirmations: u64) -> Self {
		Self {
			delivery,
			confirmations,
		}
	}

	pub fn delivery(&self) -> &Arc<dyn DeliveryInterface> {
		&self.delivery
	}

	/// The signing wallet, or `WalletNotConfigured`.
	pub fn wallet(&self) -> Result<Address, DeliveryError> {
		self.delivery
			.signer_address()
			.ok_or(DeliveryError::WalletNotConfigured)
	}

	/// Submits `tx` and waits for a successful receipt.
	///
	/// A receipt with failed status is turned into `TransactionFailed`. The
	/// call is replayed against the parent block to recover the revert payload
	/// when the node still has that state.
	pub async fn send_and_confirm(
		&self,
		tx: Transaction,
	) -> Result<TransactionReceipt, DeliveryError> {
		self.wallet()?;

		let hash = self.delivery.submit(tx.clone()).await?;
		tracing::info!(tx_hash = %hash, "Transaction submitted");

		let receipt = self
			.delivery
			.wait_for_confirmation(&hash, self.confirmations)
			.await?;

		if !receipt.success {
			tracing::error!(tx_hash = %hash, block = receipt.block_number, "Transaction reverted");
			return Err(self.replay_failure(hash, tx, receipt.block_number).await);
		}

		tracing::info!(
			tx_hash = %hash,
			block = receipt.block_number,
			logs = receipt.logs.len(),
			"Transaction confirmed"
		);
		Ok(receipt)
	}

	async fn replay_failure(
		&self,
		hash: TransactionHash,
		tx: Transaction,
		block_number: u64,
	) -> DeliveryError {
		let replay_block = block_number.saturating_sub(1);
		match self.delivery.eth_call(tx, Some(replay_block)).await {
			Err(DeliveryError::TransactionFailed {
				reason,
				revert_data,
				..
			}) => DeliveryError::TransactionFailed {
				hash: Some(hash),
				reason,
				revert_data,
			},
			other => {
				if let Err(e) = other {
					tracing::debug!(tx_hash = %hash, error = %e, "Could not replay failed transaction");
				}
				DeliveryError::TransactionFailed {
					hash: Some(hash),
					reason: "execution reverted".to_string(),
					revert_data: None,
				}
			},
		}
	}

	/// Deploys contract creation code and returns the new address.
	pub async fn deploy(
		&self,
		bytecode: &Bytes,
		constructor_args: &[u8],
	) -> Result<(Address, TransactionReceipt), DeliveryError> {
		let mut init_code = bytecode.to_vec();
		init_code.extend_from_slice(constructor_args);

		let receipt = self.send_and_confirm(Transaction::create(init_code)).await?;
		let address = receipt
			.contract_address
			.ok_or(DeliveryError::MissingContractAddress(receipt.hash))?;

		tracing::info!(address = %address, tx_hash = %receipt.hash, "Contract deployed");
		Ok((address, receipt))
	}

	/// Calls `name` on the contract at `to` and waits for confirmation.
	pub async fn call(
		&self,
		to: Address,
		abi: &JsonAbi,
		name: &str,
		args: &[DynSolValue],
	) -> Result<TransactionReceipt, DeliveryError> {
		self.call_with_value(to, abi, name, args, U256::ZERO).await
	}

	/// Like [`call`](Self::call) with native value attached.
	pub async fn call_with_value(
		&self,
		to: Address,
		abi: &JsonAbi,
		name: &str,
		args: &[DynSolValue],
		value: U256,
	) -> Result<TransactionReceipt, DeliveryError> {
		let (function, data) = encode_call(abi, name, args)?;
		tracing::debug!(
			to = %to,
			function = %function.signature(),
			calldata = %hex::encode_prefixed(&data),
			"Sending contract call"
		);

		let mut tx = Transaction::call(to, data);
		tx.value = value;
		self.send_and_confirm(tx).await
	}

	/// Calls a view function and decodes its return values.
	pub async fn read(
		&self,
		to: Address,
		abi: &JsonAbi,
		name: &str,
		args: &[DynSolValue],
	) -> Result<Vec<DynSolValue>, DeliveryError> {
		let (function, data) = encode_call(abi, name, args)?;
		let output = self
			.delivery
			.eth_call(Transaction::call(to, data), None)
			.await?;

		function.abi_decode_output(&output).map_err(|e| {
			DeliveryError::Abi(format!(
				"Failed to decode output of {}: {}",
				function.signature(),
				e
			))
		})
	}

	/// Calls a view function that returns a single value.
	pub async fn read_one(
		&self,
		to: Address,
		abi: &JsonAbi,
		name: &str,
		args: &[DynSolValue],
	) -> Result<DynSolValue, DeliveryError> {
		self.read(to, abi, name, args)
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| DeliveryError::Abi(format!("{} returned no value", name)))
	}
}
