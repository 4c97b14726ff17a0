//! Operator commands.
//!
//! Every operator action is one [`Command`] variant carrying exactly the
//! inputs it needs. [`dispatch`] runs it against a session and returns a
//! typed [`Outcome`] for the caller to render.

use crate::{
	BotFlow, DispatchError, EcosystemDeployment, EcosystemParams, OrchestratorError, OwnerFlow,
	OwnerReport, OwnerState, Session, TokenAction, TokenClient, TokenOutcome,
};
use alloy_primitives::{Address, U256};
use tracing::instrument;
use var_types::{RegistryKey, RoleTag};

/// Activity lines shown when no count is given.
pub const DEFAULT_LOG_LINES: usize = 20;

/// An operator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Owner: deploy and initialize a factory, then authorize `bot`.
	DeployFactory { bot: Address },
	/// Owner: authorize `bot` on an existing factory (the latest by default).
	///
	/// With `initialize`, the factory is first initialized; this finishes a
	/// factory whose owner flow stopped after deployment.
	AssignBot {
		bot: Address,
		factory: Option<Address>,
		initialize: bool,
	},
	/// Bot: deploy an implementation and a token ecosystem.
	DeployEcosystem(EcosystemParams),
	/// Run a token action against `proxy` (the latest by default).
	Token {
		proxy: Option<Address>,
		action: TokenAction,
	},
	/// Record a proxy deployed elsewhere.
	AddProxy { address: Address },
	/// Forget a recorded proxy.
	RemoveProxy { address: Address },
	/// Every registry bucket of the active network.
	ListContracts,
	/// Wallet address and native balance.
	Wallet,
	/// The last `lines` activity log entries.
	ActivityLog { lines: usize },
}

impl Command {
	pub fn name(&self) -> &'static str {
		match self {
			Command::DeployFactory { .. } => "deploy-factory",
			Command::AssignBot { .. } => "assign-bot",
			Command::DeployEcosystem(_) => "deploy-ecosystem",
			Command::Token { action, .. } => action.name(),
			Command::AddProxy { .. } => "add-proxy",
			Command::RemoveProxy { .. } => "remove-proxy",
			Command::ListContracts => "list-contracts",
			Command::Wallet => "wallet",
			Command::ActivityLog { .. } => "activity-log",
		}
	}
}

/// Result of a dispatched [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	Owner(OwnerReport),
	Ecosystem(EcosystemDeployment),
	Token {
		proxy: Address,
		outcome: TokenOutcome,
	},
	/// `added` is false when the proxy was already recorded.
	ProxyAdded { address: Address, added: bool },
	/// `removed` is false when the proxy was not recorded.
	ProxyRemoved { address: Address, removed: bool },
	Contracts(Vec<(RegistryKey, Vec<Address>)>),
	Wallet { address: Address, balance: U256 },
	ActivityLog(Vec<String>),
}

/// Runs `command` against `session`.
#[instrument(skip_all, fields(command = command.name(), network = %session.network().id))]
pub async fn dispatch(session: &Session, command: Command) -> Result<Outcome, DispatchError> {
	match command {
		Command::DeployFactory { bot } => {
			let report = OwnerFlow::new(session).run(bot).await?;
			Ok(Outcome::Owner(report))
		},
		Command::AssignBot {
			bot,
			factory,
			initialize,
		} => {
			let factory = match factory {
				Some(factory) => factory,
				None => session.latest_factory().await?,
			};
			let reached = if initialize {
				OwnerState::FactoryDeployed
			} else {
				OwnerState::FactoryInitialized
			};
			let report = OwnerFlow::resume_at(session, factory, reached).run(bot).await?;
			Ok(Outcome::Owner(report))
		},
		Command::DeployEcosystem(params) => {
			let deployment = BotFlow::new(session).run(&params).await?;
			Ok(Outcome::Ecosystem(deployment))
		},
		Command::Token { proxy, action } => {
			let client = TokenClient::connect(session, proxy).await?;
			let outcome = client.execute(action).await?;
			Ok(Outcome::Token {
				proxy: client.proxy(),
				outcome,
			})
		},
		Command::AddProxy { address } => {
			let added = session.remember(RoleTag::Proxy, address).await?;
			if added {
				session
					.record(&format!(
						"Added Proxy: {} ({})",
						address,
						session.network().id
					))
					.await;
			}
			Ok(Outcome::ProxyAdded { address, added })
		},
		Command::RemoveProxy { address } => {
			let removed = session
				.registry()
				.remove(&session.key(RoleTag::Proxy), address)
				.await
				.map_err(OrchestratorError::from)?;
			if removed {
				session
					.record(&format!(
						"Removed Proxy: {} ({})",
						address,
						session.network().id
					))
					.await;
			}
			Ok(Outcome::ProxyRemoved { address, removed })
		},
		Command::ListContracts => {
			let buckets = session
				.registry()
				.buckets(&session.network().id)
				.await
				.map_err(OrchestratorError::from)?;
			Ok(Outcome::Contracts(buckets))
		},
		Command::Wallet => {
			let address = session.wallet()?;
			let balance = session
				.transactions()
				.delivery()
				.get_balance(address)
				.await
				.map_err(OrchestratorError::from)?;
			Ok(Outcome::Wallet { address, balance })
		},
		Command::ActivityLog { lines } => {
			let entries = session
				.activity()
				.tail(lines)
				.await
				.map_err(OrchestratorError::ActivityLog)?;
			Ok(Outcome::ActivityLog(entries))
		},
	}
}
