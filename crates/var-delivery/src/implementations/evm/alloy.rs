//! Alloy-based EVM delivery.
//!
//! Binds one HTTP provider to one network. When a private key is configured
//! the provider carries a wallet and fills nonce, gas and chain id itself;
//! without one only read operations are available.

use crate::{DeliveryError, DeliveryInterface};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{
	DynProvider, PendingTransactionConfig, PendingTransactionError, Provider, ProviderBuilder,
};
use alloy_rpc_types::{BlockId, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use var_types::{Log, NetworkProfile, Transaction, TransactionHash, TransactionReceipt};

/// Parses a hex private key, with or without `0x`.
///
/// The error never echoes the key.
pub fn signer_from_key(key: &str) -> Result<PrivateKeySigner, DeliveryError> {
	key.trim()
		.parse::<PrivateKeySigner>()
		.map_err(|_| DeliveryError::InvalidKey("expected 32 bytes of hex".to_string()))
}

/// Maps a node error into a transaction failure, keeping any revert payload.
fn transaction_error(hash: Option<TransactionHash>, error: TransportError) -> DeliveryError {
	match error.as_error_resp().and_then(|payload| payload.as_revert_data()) {
		Some(data) => DeliveryError::reverted(hash, data),
		None => DeliveryError::TransactionFailed {
			hash,
			reason: error.to_string(),
			revert_data: None,
		},
	}
}

/// EVM delivery over a single Alloy provider.
pub struct AlloyDelivery {
	provider: DynProvider,
	chain_id: u64,
	signer: Option<Address>,
	confirmation_timeout: Duration,
}

impl AlloyDelivery {
	/// Creates a delivery bound to `network`.
	///
	/// The connection is lazy: nothing is sent until the first request.
	pub fn new(
		network: &NetworkProfile,
		signer: Option<PrivateKeySigner>,
		confirmation_timeout: Duration,
	) -> Result<Self, DeliveryError> {
		let url = network.endpoint().parse().map_err(|e| {
			DeliveryError::Network(format!("Invalid RPC URL for network {}: {}", network.id, e))
		})?;

		let signer_address = signer.as_ref().map(|s| s.address());
		let provider = match signer {
			Some(signer) => {
				let wallet = EthereumWallet::from(signer.with_chain_id(Some(network.chain_id)));
				ProviderBuilder::new().wallet(wallet).connect_http(url).erased()
			},
			None => ProviderBuilder::new().connect_http(url).erased(),
		};

		tracing::debug!(
			network = %network.id,
			chain_id = network.chain_id,
			endpoint = %network.endpoint(),
			wallet = ?signer_address,
			"Created delivery provider"
		);

		Ok(Self {
			provider,
			chain_id: network.chain_id,
			signer: signer_address,
			confirmation_timeout,
		})
	}
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	fn signer_address(&self) -> Option<Address> {
		self.signer
	}

	async fn submit(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError> {
		let from = self.signer.ok_or(DeliveryError::WalletNotConfigured)?;

		let mut request: TransactionRequest = tx.into();
		request.from = Some(from);

		tracing::debug!(
			chain_id = self.chain_id,
			to = ?request.to,
			value = ?request.value,
			data_len = request.input.input().map(|d| d.len()).unwrap_or(0),
			"Sending transaction"
		);

		let pending = self.provider.send_transaction(request).await.map_err(|e| {
			tracing::error!(chain_id = self.chain_id, error = %e, "Transaction submission failed");
			transaction_error(None, e)
		})?;

		Ok(TransactionHash(*pending.tx_hash()))
	}

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError> {
		tracing::info!(
			tx_hash = %hash,
			confirmations,
			timeout_secs = self.confirmation_timeout.as_secs(),
			"Waiting for confirmation"
		);

		let config = PendingTransactionConfig::new(hash.0)
			.with_required_confirmations(confirmations.max(1))
			.with_timeout(Some(self.confirmation_timeout));

		let failed = |reason: String| DeliveryError::TransactionFailed {
			hash: Some(*hash),
			reason,
			revert_data: None,
		};

		let pending = self
			.provider
			.watch_pending_transaction(config)
			.await
			.map_err(|e| match e {
				PendingTransactionError::TransportError(e) => transaction_error(Some(*hash), e),
				other => failed(format!("Transaction watch failed: {}", other)),
			})?;

		let confirmed = pending
			.await
			.map_err(|e| failed(format!("Failed to confirm transaction: {}", e)))?;

		self.get_receipt(&TransactionHash(confirmed)).await
	}

	async fn get_receipt(&self, hash: &TransactionHash) -> Result<TransactionReceipt, DeliveryError> {
		match self.provider.get_transaction_receipt(hash.0).await {
			Ok(Some(receipt)) => {
				let logs = receipt
					.inner
					.logs()
					.iter()
					.map(|log| Log {
						address: log.address(),
						topics: log.topics().to_vec(),
						data: log.inner.data.data.clone(),
					})
					.collect();

				Ok(TransactionReceipt {
					hash: TransactionHash(receipt.transaction_hash),
					block_number: receipt.block_number.unwrap_or(0),
					success: receipt.status(),
					contract_address: receipt.contract_address,
					logs,
				})
			},
			Ok(None) => Err(DeliveryError::Network(format!(
				"Transaction {} not found on chain {}",
				hash, self.chain_id
			))),
			Err(e) => Err(DeliveryError::Network(format!(
				"Failed to get receipt on chain {}: {}",
				self.chain_id, e
			))),
		}
	}

	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError> {
		self.provider
			.get_balance(address)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get balance: {}", e)))
	}

	async fn get_code(&self, address: Address) -> Result<Bytes, DeliveryError> {
		self.provider
			.get_code_at(address)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get code: {}", e)))
	}

	async fn eth_call(&self, tx: Transaction, block: Option<u64>) -> Result<Bytes, DeliveryError> {
		let mut request: TransactionRequest = tx.into();
		request.from = self.signer;

		let call = self.provider.call(request);
		let call = match block {
			Some(number) => call.block(BlockId::number(number)),
			None => call,
		};

		call.await.map_err(|e| match e.as_error_resp() {
			Some(_) => transaction_error(None, e),
			None => DeliveryError::Network(format!("Failed to call contract: {}", e)),
		})
	}
}
