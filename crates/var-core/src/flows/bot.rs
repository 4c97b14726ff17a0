//! Bot flow: implementation deployment and ecosystem creation.
//!
//! `Start -> FactorySelected -> ImplementationDeployed -> ImplementationLinked -> ProxyDeployed`
//!
//! Every ecosystem gets a freshly deployed implementation. The implementation
//! is recorded right after its deployment, before the factory knows about it,
//! so it stays in the registry whatever happens afterwards.

use crate::error::check_transition;
use crate::{FlowError, FlowState, OrchestratorError, Session};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, U256};
use std::fmt;
use tracing::instrument;
use var_delivery::extract_event;
use var_types::{RoleTag, TransactionHash};

/// Event the factory emits for every ecosystem it deploys.
pub const DEPLOYED_EVENT: &str = "Deployed";

/// Progress of the bot flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
	Start,
	FactorySelected,
	ImplementationDeployed,
	ImplementationLinked,
	ProxyDeployed,
}

impl fmt::Display for BotState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			BotState::Start => "start",
			BotState::FactorySelected => "factory selected",
			BotState::ImplementationDeployed => "implementation deployed",
			BotState::ImplementationLinked => "implementation linked",
			BotState::ProxyDeployed => "proxy deployed",
		};
		f.write_str(name)
	}
}

impl FlowState for BotState {
	fn can_transition_to(self, to: Self) -> bool {
		matches!(
			(self, to),
			(BotState::Start, BotState::FactorySelected)
				| (BotState::FactorySelected, BotState::ImplementationDeployed)
				| (BotState::ImplementationDeployed, BotState::ImplementationLinked)
				| (BotState::ImplementationLinked, BotState::ProxyDeployed)
		)
	}
}

/// Parameters of a new token ecosystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcosystemParams {
	pub name: String,
	pub symbol: String,
	/// Initial supply in base units. `None` uses the session default.
	pub initial_supply: Option<U256>,
}

impl EcosystemParams {
	pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			symbol: symbol.into(),
			initial_supply: None,
		}
	}

	pub fn with_supply(mut self, supply: U256) -> Self {
		self.initial_supply = Some(supply);
		self
	}
}

/// Outcome of a completed bot flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcosystemDeployment {
	pub network: String,
	pub factory: Address,
	pub implementation: Address,
	pub proxy: Address,
	pub name: String,
	pub symbol: String,
	pub initial_supply: U256,
	pub tx_hash: TransactionHash,
}

/// Drives the bot flow against a session.
pub struct BotFlow<'a> {
	session: &'a Session,
	state: BotState,
	factory: Option<Address>,
	factory_abi: Option<JsonAbi>,
	implementation: Option<Address>,
}

impl<'a> BotFlow<'a> {
	pub fn new(session: &'a Session) -> Self {
		Self {
			session,
			state: BotState::Start,
			factory: None,
			factory_abi: None,
			implementation: None,
		}
	}

	pub fn state(&self) -> BotState {
		self.state
	}

	pub fn factory(&self) -> Option<Address> {
		self.factory
	}

	pub fn implementation(&self) -> Option<Address> {
		self.implementation
	}

	/// Picks the most recently recorded factory on the active network.
	///
	/// Fails with `NoFactory` before anything is compiled or sent.
	pub async fn select_factory(&mut self) -> Result<Address, OrchestratorError> {
		check_transition(self.state, BotState::FactorySelected)?;
		self.session.wallet()?;

		let factory = self.session.latest_factory().await?;
		self.factory = Some(factory);
		self.state = BotState::FactorySelected;
		tracing::info!(factory = %factory, network = %self.session.network().id, "Factory selected");
		Ok(factory)
	}

	/// Compiles and deploys a new implementation, then records it.
	pub async fn deploy_implementation(&mut self) -> Result<Address, OrchestratorError> {
		check_transition(self.state, BotState::ImplementationDeployed)?;
		let session = self.session;

		if self.factory_abi.is_none() {
			self.factory_abi = Some(session.factory_abi().await?);
		}
		let artifact = session.compile(&session.sources().implementation).await?;
		let (implementation, receipt) =
			session.transactions().deploy(&artifact.bytecode, &[]).await?;

		self.implementation = Some(implementation);
		self.state = BotState::ImplementationDeployed;
		tracing::info!(
			implementation = %implementation,
			tx_hash = %receipt.hash,
			"Implementation deployed"
		);

		session.remember(RoleTag::Implementation, implementation).await?;
		session
			.record(&format!(
				"Deployed Implementation: {} ({})",
				implementation,
				session.network().id
			))
			.await;
		Ok(implementation)
	}

	/// Points the factory at the deployed implementation.
	pub async fn link_implementation(&mut self) -> Result<TransactionHash, OrchestratorError> {
		check_transition(self.state, BotState::ImplementationLinked)?;
		let session = self.session;
		let (factory, implementation) = self.deployed(BotState::ImplementationLinked)?;
		let abi = self.interface().await?;

		let receipt = session
			.transactions()
			.call(
				factory,
				abi,
				"setImplementation",
				&[DynSolValue::Address(implementation)],
			)
			.await?;

		self.state = BotState::ImplementationLinked;
		tracing::info!(factory = %factory, implementation = %implementation, "Implementation linked");
		session
			.record(&format!(
				"Linked Implementation: {} into {}",
				implementation, factory
			))
			.await;
		Ok(receipt.hash)
	}

	/// Asks the factory for a new ecosystem and records its proxy.
	///
	/// If the transaction succeeds but its receipt carries no `Deployed`
	/// event, the flow fails with `ProxyUndiscoverable`: the proxy exists on
	/// chain but its address is unknown.
	pub async fn deploy_ecosystem(
		&mut self,
		params: &EcosystemParams,
	) -> Result<EcosystemDeployment, OrchestratorError> {
		check_transition(self.state, BotState::ProxyDeployed)?;
		let session = self.session;
		let (factory, implementation) = self.deployed(BotState::ProxyDeployed)?;
		let supply = params.initial_supply.unwrap_or(session.default_supply());
		let abi = self.interface().await?;

		let receipt = session
			.transactions()
			.call(
				factory,
				abi,
				"botDeployEcosystem",
				&[
					DynSolValue::String(params.name.clone()),
					DynSolValue::String(params.symbol.clone()),
					DynSolValue::Uint(supply, 256),
				],
			)
			.await?;

		let proxy = extract_event(&receipt, abi, DEPLOYED_EVENT)
			.map_err(|e| e.to_string())
			.and_then(|event| {
				event
					.address_arg("proxy")
					.ok_or_else(|| format!("{} event has no proxy argument", DEPLOYED_EVENT))
			})
			.map_err(|reason| {
				tracing::error!(
					tx_hash = %receipt.hash,
					implementation = %implementation,
					%reason,
					"Ecosystem deployed but proxy not found in receipt"
				);
				OrchestratorError::ProxyUndiscoverable {
					tx_hash: receipt.hash,
					implementation,
					reason,
				}
			})?;

		self.state = BotState::ProxyDeployed;
		tracing::info!(proxy = %proxy, tx_hash = %receipt.hash, "Proxy deployed");

		session.remember(RoleTag::Proxy, proxy).await?;
		session
			.record(&format!(
				"Bot deployed VAR: {} and Proxy: {} for {} ({})",
				implementation, proxy, params.name, params.symbol
			))
			.await;

		Ok(EcosystemDeployment {
			network: session.network().id.clone(),
			factory,
			implementation,
			proxy,
			name: params.name.clone(),
			symbol: params.symbol.clone(),
			initial_supply: supply,
			tx_hash: receipt.hash,
		})
	}

	/// Runs every step in order.
	#[instrument(skip_all, fields(network = %self.session.network().id, symbol = %params.symbol))]
	pub async fn run(
		mut self,
		params: &EcosystemParams,
	) -> Result<EcosystemDeployment, FlowError<BotState>> {
		self.select_factory().await.map_err(|e| self.fail(e))?;
		self.deploy_implementation()
			.await
			.map_err(|e| self.fail(e))?;
		self.link_implementation()
			.await
			.map_err(|e| self.fail(e))?;
		let deployment = self
			.deploy_ecosystem(params)
			.await
			.map_err(|e| self.fail(e))?;
		Ok(deployment)
	}

	fn fail(&self, source: OrchestratorError) -> FlowError<BotState> {
		tracing::error!(state = %self.state, error = %source, "Bot flow failed");
		FlowError {
			reached: self.state,
			source,
		}
	}

	fn deployed(&self, to: BotState) -> Result<(Address, Address), OrchestratorError> {
		self.factory
			.zip(self.implementation)
			.ok_or_else(|| OrchestratorError::InvalidTransition {
				from: self.state.to_string(),
				to: to.to_string(),
			})
	}

	async fn interface(&mut self) -> Result<&JsonAbi, OrchestratorError> {
		let abi = match self.factory_abi.take() {
			Some(abi) => abi,
			None => self.session.factory_abi().await?,
		};
		Ok(self.factory_abi.insert(abi))
	}
}
