//! Session context.
//!
//! A session binds the active network to its transaction manager and carries
//! the registry, the activity log and the compiler. It is never mutated in
//! place: [`Session::switch_network`] returns a new one.

use crate::OrchestratorError;
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tokio::sync::OnceCell;
use var_compiler::{CompiledArtifact, Compiler, SourceReference};
use var_delivery::{DeliveryInterface, TransactionManager};
use var_storage::{ActivityLog, ContractRegistry};
use var_types::{NetworkProfile, RegistryKey, RoleTag};

/// Source files of the two contracts the flows deploy.
#[derive(Debug, Clone)]
pub struct ContractSources {
	pub factory: SourceReference,
	pub implementation: SourceReference,
}

/// Everything a flow or command needs to talk to one network.
pub struct Session {
	network: NetworkProfile,
	transactions: TransactionManager,
	registry: ContractRegistry,
	activity: ActivityLog,
	compiler: Arc<Compiler>,
	sources: ContractSources,
	default_supply: U256,
	implementation_abi: OnceCell<JsonAbi>,
}

impl Session {
	pub fn new(
		network: NetworkProfile,
		transactions: TransactionManager,
		registry: ContractRegistry,
		activity: ActivityLog,
		compiler: Arc<Compiler>,
		sources: ContractSources,
	) -> Self {
		Self {
			network,
			transactions,
			registry,
			activity,
			compiler,
			sources,
			// 1_000_000 * 10^18
			default_supply: U256::from(10u64).pow(U256::from(24u64)),
			implementation_abi: OnceCell::new(),
		}
	}

	/// Overrides the initial supply used when an ecosystem names none.
	pub fn with_default_supply(mut self, supply: U256) -> Self {
		self.default_supply = supply;
		self
	}

	/// Returns a session bound to another network.
	///
	/// The registry, activity log, compiler and any interface already loaded
	/// carry over. The current session is left as it is.
	pub fn switch_network(
		&self,
		network: NetworkProfile,
		delivery: Arc<dyn DeliveryInterface>,
		confirmations: u64,
	) -> Session {
		tracing::info!(from = %self.network.id, to = %network.id, "Switching network");
		Session {
			network,
			transactions: TransactionManager::new(delivery, confirmations),
			registry: self.registry.clone(),
			activity: self.activity.clone(),
			compiler: self.compiler.clone(),
			sources: self.sources.clone(),
			default_supply: self.default_supply,
			implementation_abi: OnceCell::new_with(self.implementation_abi.get().cloned()),
		}
	}

	pub fn network(&self) -> &NetworkProfile {
		&self.network
	}

	pub fn transactions(&self) -> &TransactionManager {
		&self.transactions
	}

	pub fn registry(&self) -> &ContractRegistry {
		&self.registry
	}

	pub fn activity(&self) -> &ActivityLog {
		&self.activity
	}

	pub fn sources(&self) -> &ContractSources {
		&self.sources
	}

	pub fn default_supply(&self) -> U256 {
		self.default_supply
	}

	/// The signing wallet. Write-capable steps call this before anything else.
	pub fn wallet(&self) -> Result<Address, OrchestratorError> {
		Ok(self.transactions.wallet()?)
	}

	/// Registry key of `role` on the active network.
	pub fn key(&self, role: RoleTag) -> RegistryKey {
		RegistryKey::new(self.network.id.clone(), role)
	}

	/// Compiles `source` from the current files on disk.
	pub async fn compile(
		&self,
		source: &SourceReference,
	) -> Result<CompiledArtifact, OrchestratorError> {
		let output = self.compiler.compile(source).await?;
		if !output.warnings.is_empty() {
			tracing::warn!(
				contract = %source.contract,
				warnings = output.warnings.len(),
				"Compiled with warnings"
			);
		}
		Ok(output.artifact)
	}

	/// Interface of the factory contract.
	pub async fn factory_abi(&self) -> Result<JsonAbi, OrchestratorError> {
		Ok(self.compile(&self.sources.factory).await?.abi)
	}

	/// Interface of the token implementation, compiled once per session.
	pub async fn implementation_abi(&self) -> Result<&JsonAbi, OrchestratorError> {
		self.implementation_abi
			.get_or_try_init(|| async {
				tracing::info!(contract = %self.sources.implementation.contract, "Loading token interface");
				Ok::<_, OrchestratorError>(self.compile(&self.sources.implementation).await?.abi)
			})
			.await
	}

	/// The most recently recorded factory on the active network.
	pub async fn latest_factory(&self) -> Result<Address, OrchestratorError> {
		self.registry
			.latest(&self.key(RoleTag::Factory))
			.await?
			.ok_or_else(|| OrchestratorError::NoFactory {
				network: self.network.id.clone(),
			})
	}

	/// `explicit` if given, otherwise the most recently recorded proxy.
	pub async fn resolve_proxy(&self, explicit: Option<Address>) -> Result<Address, OrchestratorError> {
		if let Some(proxy) = explicit {
			return Ok(proxy);
		}
		self.registry
			.latest(&self.key(RoleTag::Proxy))
			.await?
			.ok_or_else(|| OrchestratorError::NoProxy {
				network: self.network.id.clone(),
			})
	}

	/// Appends `address` under `role` on the active network.
	pub async fn remember(&self, role: RoleTag, address: Address) -> Result<bool, OrchestratorError> {
		Ok(self.registry.append(&self.key(role), address).await?)
	}

	/// Writes one line to the activity log.
	pub async fn record(&self, message: &str) {
		self.activity.record(message).await;
	}
}
