//! Owner flow: factory deployment and bot authorization.
//!
//! `Start -> FactoryDeployed -> FactoryInitialized -> BotAssigned`
//!
//! The factory is recorded as soon as it is deployed, so a failure in a later
//! step can be resumed with [`OwnerFlow::resume_at`] instead of redeploying.

use crate::error::check_transition;
use crate::{FlowError, FlowState, OrchestratorError, Session};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use std::fmt;
use tracing::instrument;
use var_types::{RoleTag, TransactionHash};

/// Progress of the owner flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerState {
	Start,
	FactoryDeployed,
	FactoryInitialized,
	BotAssigned,
}

impl fmt::Display for OwnerState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OwnerState::Start => "start",
			OwnerState::FactoryDeployed => "factory deployed",
			OwnerState::FactoryInitialized => "factory initialized",
			OwnerState::BotAssigned => "bot assigned",
		};
		f.write_str(name)
	}
}

impl FlowState for OwnerState {
	fn can_transition_to(self, to: Self) -> bool {
		matches!(
			(self, to),
			(OwnerState::Start, OwnerState::FactoryDeployed)
				| (OwnerState::FactoryDeployed, OwnerState::FactoryInitialized)
				| (OwnerState::FactoryInitialized, OwnerState::BotAssigned)
				// Re-assigning replaces the previous bot.
				| (OwnerState::BotAssigned, OwnerState::BotAssigned)
		)
	}
}

/// Outcome of a completed owner flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerReport {
	pub network: String,
	pub factory: Address,
	pub bot: Address,
}

/// Drives the owner flow against a session.
pub struct OwnerFlow<'a> {
	session: &'a Session,
	state: OwnerState,
	factory: Option<Address>,
	abi: Option<JsonAbi>,
}

impl<'a> OwnerFlow<'a> {
	/// A flow that starts by deploying a new factory.
	pub fn new(session: &'a Session) -> Self {
		Self {
			session,
			state: OwnerState::Start,
			factory: None,
			abi: None,
		}
	}

	/// A flow for a factory that is already deployed and initialized.
	pub fn resume(session: &'a Session, factory: Address) -> Self {
		Self::resume_at(session, factory, OwnerState::FactoryInitialized)
	}

	/// A flow for `factory` that has already completed `reached`.
	///
	/// Resuming at `FactoryDeployed` finishes a factory whose initialization
	/// failed: [`run`](Self::run) initializes it before assigning the bot.
	pub fn resume_at(session: &'a Session, factory: Address, reached: OwnerState) -> Self {
		Self {
			session,
			state: reached,
			factory: Some(factory),
			abi: None,
		}
	}

	pub fn state(&self) -> OwnerState {
		self.state
	}

	pub fn factory(&self) -> Option<Address> {
		self.factory
	}

	/// Compiles and deploys the factory, then records it.
	pub async fn deploy_factory(&mut self) -> Result<Address, OrchestratorError> {
		check_transition(self.state, OwnerState::FactoryDeployed)?;
		let session = self.session;
		session.wallet()?;

		let artifact = session.compile(&session.sources().factory).await?;
		let (factory, receipt) = session.transactions().deploy(&artifact.bytecode, &[]).await?;

		self.factory = Some(factory);
		self.abi = Some(artifact.abi);
		self.state = OwnerState::FactoryDeployed;
		tracing::info!(
			factory = %factory,
			network = %session.network().id,
			tx_hash = %receipt.hash,
			"Factory deployed"
		);

		session.remember(RoleTag::Factory, factory).await?;
		session
			.record(&format!(
				"Deployed Factory: {} ({})",
				factory,
				session.network().id
			))
			.await;
		Ok(factory)
	}

	/// Initializes the factory with no implementation.
	///
	/// The bot links a real implementation later.
	pub async fn initialize(&mut self) -> Result<TransactionHash, OrchestratorError> {
		check_transition(self.state, OwnerState::FactoryInitialized)?;
		let session = self.session;
		let factory = self.require_factory(OwnerState::FactoryInitialized)?;
		let abi = self.interface().await?;

		let receipt = session
			.transactions()
			.call(factory, abi, "initialize", &[DynSolValue::Address(Address::ZERO)])
			.await?;

		self.state = OwnerState::FactoryInitialized;
		tracing::info!(factory = %factory, tx_hash = %receipt.hash, "Factory initialized");
		session
			.record(&format!("Initialized Factory: {}", factory))
			.await;
		Ok(receipt.hash)
	}

	/// Authorizes `bot` as the factory's deployer.
	pub async fn assign_bot(&mut self, bot: Address) -> Result<TransactionHash, OrchestratorError> {
		check_transition(self.state, OwnerState::BotAssigned)?;
		let session = self.session;
		session.wallet()?;
		let factory = self.require_factory(OwnerState::BotAssigned)?;
		let abi = self.interface().await?;

		let receipt = session
			.transactions()
			.call(factory, abi, "setDeployerBot", &[DynSolValue::Address(bot)])
			.await?;

		self.state = OwnerState::BotAssigned;
		tracing::info!(factory = %factory, bot = %bot, tx_hash = %receipt.hash, "Deployer bot assigned");
		session.record(&format!("Set Bot Address: {}", bot)).await;
		Ok(receipt.hash)
	}

	/// Runs every remaining step and assigns `bot`.
	#[instrument(skip_all, fields(network = %self.session.network().id, bot = %bot))]
	pub async fn run(mut self, bot: Address) -> Result<OwnerReport, FlowError<OwnerState>> {
		if self.state == OwnerState::Start {
			self.deploy_factory().await.map_err(|e| self.fail(e))?;
		}
		if self.state == OwnerState::FactoryDeployed {
			self.initialize().await.map_err(|e| self.fail(e))?;
		}
		self.assign_bot(bot).await.map_err(|e| self.fail(e))?;

		let factory = self
			.require_factory(OwnerState::BotAssigned)
			.map_err(|e| self.fail(e))?;
		Ok(OwnerReport {
			network: self.session.network().id.clone(),
			factory,
			bot,
		})
	}

	fn fail(&self, source: OrchestratorError) -> FlowError<OwnerState> {
		tracing::error!(state = %self.state, error = %source, "Owner flow failed");
		FlowError {
			reached: self.state,
			source,
		}
	}

	fn require_factory(&self, to: OwnerState) -> Result<Address, OrchestratorError> {
		self.factory.ok_or_else(|| OrchestratorError::InvalidTransition {
			from: self.state.to_string(),
			to: to.to_string(),
		})
	}

	async fn interface(&mut self) -> Result<&JsonAbi, OrchestratorError> {
		let abi = match self.abi.take() {
			Some(abi) => abi,
			None => self.session.factory_abi().await?,
		};
		Ok(self.abi.insert(abi))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{created_address, selector, FakeChain, Harness, FACTORY};
	use var_delivery::DeliveryError;

	fn bot() -> Address {
		Address::repeat_byte(0xb0)
	}

	#[tokio::test]
	async fn test_owner_flow_on_fresh_network() {
		let chain = FakeChain::new();
		let harness = Harness::builder()
			.chain(chain.clone())
			.compilations(FACTORY, 1)
			.build()
			.await;

		let report = OwnerFlow::new(&harness.session).run(bot()).await.unwrap();
		let factory = created_address(0);
		assert_eq!(report.factory, factory);
		assert_eq!(report.bot, bot());
		assert_eq!(report.network, "testnet");

		let submitted = chain.submitted();
		assert_eq!(submitted.len(), 3);
		assert!(submitted[0].is_create());
		assert_eq!(submitted[1].to, Some(factory));
		assert_eq!(&submitted[1].data[..4], selector("initialize(address)").as_slice());
		assert_eq!(&submitted[1].data[4..], &[0u8; 32]);
		assert_eq!(&submitted[2].data[..4], selector("setDeployerBot(address)").as_slice());
		assert_eq!(&submitted[2].data[16..36], bot().as_slice());

		let factories = harness
			.session
			.registry()
			.list(&harness.session.key(RoleTag::Factory))
			.await
			.unwrap();
		assert_eq!(factories, vec![factory]);

		let lines = harness.activity_lines().await;
		assert_eq!(lines.len(), 3);
		assert!(lines[0].ends_with(&format!("Deployed Factory: {} (testnet)", factory)));
		assert!(lines[1].ends_with(&format!("Initialized Factory: {}", factory)));
		assert!(lines[2].ends_with(&format!("Set Bot Address: {}", bot())));
	}

	#[tokio::test]
	async fn test_missing_wallet_stops_before_compiling() {
		let harness = Harness::builder().without_wallet().build().await;

		let err = OwnerFlow::new(&harness.session).run(bot()).await.unwrap_err();
		assert_eq!(err.reached, OwnerState::Start);
		assert!(matches!(
			err.source,
			OrchestratorError::Delivery(DeliveryError::WalletNotConfigured)
		));
		assert!(harness.activity_lines().await.is_empty());
	}

	#[tokio::test]
	async fn test_failure_keeps_completed_steps() {
		let chain = FakeChain::new().revert_on("initialize(address)", "Initializable: already initialized");
		let harness = Harness::builder()
			.chain(chain.clone())
			.compilations(FACTORY, 1)
			.build()
			.await;

		let err = OwnerFlow::new(&harness.session).run(bot()).await.unwrap_err();
		assert_eq!(err.reached, OwnerState::FactoryDeployed);
		assert!(err.to_string().contains("already initialized"));
		assert!(err.revert_data().is_some());

		// The deployed factory is recorded and can be resumed later.
		assert_eq!(harness.session.latest_factory().await.unwrap(), created_address(0));
		assert_eq!(chain.submitted().len(), 2);
		assert_eq!(harness.activity_lines().await.len(), 1);
	}

	#[tokio::test]
	async fn test_resume_after_failed_initialization() {
		let chain = FakeChain::new().revert_on("initialize(address)", "paused");
		let harness = Harness::builder()
			.chain(chain.clone())
			.compilations(FACTORY, 2)
			.build()
			.await;

		let err = OwnerFlow::new(&harness.session).run(bot()).await.unwrap_err();
		assert_eq!(err.reached, OwnerState::FactoryDeployed);

		chain.stop_reverting("initialize(address)");
		let factory = harness.session.latest_factory().await.unwrap();
		let report = OwnerFlow::resume_at(&harness.session, factory, err.reached)
			.run(bot())
			.await
			.unwrap();
		assert_eq!(report.factory, created_address(0));

		let submitted = chain.submitted();
		assert_eq!(submitted.len(), 4);
		assert_eq!(&submitted[2].data[..4], selector("initialize(address)").as_slice());
		assert_eq!(&submitted[3].data[..4], selector("setDeployerBot(address)").as_slice());
		assert!(submitted[1..].iter().all(|tx| tx.to == Some(factory)));

		// No second factory was deployed.
		let factories = harness
			.session
			.registry()
			.list(&harness.session.key(RoleTag::Factory))
			.await
			.unwrap();
		assert_eq!(factories, vec![factory]);
	}

	#[tokio::test]
	async fn test_resume_assigns_bot_only() {
		let chain = FakeChain::new();
		let harness = Harness::builder()
			.chain(chain.clone())
			.compilations(FACTORY, 1)
			.build()
			.await;
		let factory = Address::repeat_byte(0xfa);

		let mut flow = OwnerFlow::resume(&harness.session, factory);
		assert_eq!(flow.state(), OwnerState::FactoryInitialized);
		flow.assign_bot(bot()).await.unwrap();
		// Re-assigning is allowed and reuses the loaded interface.
		flow.assign_bot(Address::repeat_byte(0xb1)).await.unwrap();
		assert_eq!(flow.state(), OwnerState::BotAssigned);

		let submitted = chain.submitted();
		assert_eq!(submitted.len(), 2);
		assert!(submitted.iter().all(|tx| tx.to == Some(factory)));
	}

	#[tokio::test]
	async fn test_steps_out_of_order_are_rejected() {
		let harness = Harness::builder().build().await;

		let mut flow = OwnerFlow::new(&harness.session);
		let err = flow.assign_bot(bot()).await.unwrap_err();
		assert!(matches!(err, OrchestratorError::InvalidTransition { .. }));
		let err = flow.initialize().await.unwrap_err();
		assert_eq!(
			err.to_string(),
			"Invalid transition from start to factory initialized"
		);
		assert_eq!(flow.state(), OwnerState::Start);
	}

	#[test]
	fn test_transition_table() {
		use OwnerState::*;
		assert!(Start.can_transition_to(FactoryDeployed));
		assert!(FactoryDeployed.can_transition_to(FactoryInitialized));
		assert!(FactoryInitialized.can_transition_to(BotAssigned));
		assert!(BotAssigned.can_transition_to(BotAssigned));
		assert!(!Start.can_transition_to(BotAssigned));
		assert!(!FactoryInitialized.can_transition_to(FactoryDeployed));
	}
}
