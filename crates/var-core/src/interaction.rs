//! Token interaction.
//!
//! Single-shot calls against a deployed token proxy and its factory. Each
//! action stands on its own; a failed action is recorded in the activity log
//! and returned, and never affects the next one.

use crate::{OrchestratorError, Session};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, U256};
use var_types::utils::format_amount;
use var_types::{RoleTag, TransactionHash};

/// An operation on a token proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAction {
	/// `add(to, amount)`
	Mint { to: Address, amount: U256 },
	/// `transfer(to, amount)` from the wallet.
	Transfer { to: Address, amount: U256 },
	/// `transfer(from, to, amount)`, restricted to the token admin.
	AdminTransfer {
		from: Address,
		to: Address,
		amount: U256,
	},
	/// `remove(amount)`
	Burn { amount: U256 },
	TotalSupply,
	BalanceOf { account: Address },
	/// Current burn tax in basis points.
	TaxConfig,
	/// `setTaxConfig(0x0, bps)`
	SetTax { bps: u16 },
	/// Native coin held by the proxy.
	ProxyBalance,
	/// `withdrawNative(to, amount)`; the wallet when `to` is `None`.
	WithdrawNative { to: Option<Address>, amount: U256 },
	/// Compares the token's authority chain with the wallet.
	AccessCheck,
	/// Deploys a new implementation and upgrades the proxy to it.
	Upgrade,
	/// Native coin held by the latest factory.
	FactoryBalance,
	/// `sendNative(to, amount)` on the latest factory.
	FactoryWithdraw { to: Option<Address>, amount: U256 },
}

impl TokenAction {
	pub fn name(&self) -> &'static str {
		match self {
			TokenAction::Mint { .. } => "mint",
			TokenAction::Transfer { .. } => "transfer",
			TokenAction::AdminTransfer { .. } => "admin-transfer",
			TokenAction::Burn { .. } => "burn",
			TokenAction::TotalSupply => "total-supply",
			TokenAction::BalanceOf { .. } => "balance-of",
			TokenAction::TaxConfig => "tax",
			TokenAction::SetTax { .. } => "set-tax",
			TokenAction::ProxyBalance => "proxy-balance",
			TokenAction::WithdrawNative { .. } => "withdraw-native",
			TokenAction::AccessCheck => "access",
			TokenAction::Upgrade => "upgrade",
			TokenAction::FactoryBalance => "factory-balance",
			TokenAction::FactoryWithdraw { .. } => "factory-withdraw",
		}
	}
}

/// Ownership chain of a token as seen from the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
	/// Factory the token answers to.
	pub authority: Address,
	pub token_owner: Address,
	pub factory_owner: Address,
	pub wallet: Address,
	/// The wallet owns the factory.
	pub is_admin: bool,
	/// The proxy address has code.
	pub has_code: bool,
}

/// Result of a [`TokenAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
	/// A transaction was confirmed. `message` is what was logged.
	Confirmed {
		tx_hash: TransactionHash,
		message: String,
	},
	TotalSupply(U256),
	Balance { account: Address, amount: U256 },
	Tax { bps: U256 },
	NativeBalance { holder: Address, amount: U256 },
	Access(AccessReport),
	Upgraded {
		implementation: Address,
		tx_hash: TransactionHash,
	},
}

/// Runs token actions against one proxy.
pub struct TokenClient<'a> {
	session: &'a Session,
	proxy: Address,
}

impl<'a> TokenClient<'a> {
	pub fn new(session: &'a Session, proxy: Address) -> Self {
		Self { session, proxy }
	}

	/// Binds to `proxy`, or to the most recently recorded proxy.
	pub async fn connect(
		session: &'a Session,
		proxy: Option<Address>,
	) -> Result<Self, OrchestratorError> {
		let proxy = session.resolve_proxy(proxy).await?;
		Ok(Self::new(session, proxy))
	}

	pub fn proxy(&self) -> Address {
		self.proxy
	}

	/// Runs `action`. Failures are recorded as `Error on <proxy>: <error>`.
	pub async fn execute(&self, action: TokenAction) -> Result<TokenOutcome, OrchestratorError> {
		let name = action.name();
		match self.perform(action).await {
			Ok(outcome) => Ok(outcome),
			Err(e) => {
				tracing::error!(proxy = %self.proxy, action = name, error = %e, "Token action failed");
				self.session
					.record(&format!("Error on {}: {}", self.proxy, e))
					.await;
				Err(e)
			},
		}
	}

	async fn perform(&self, action: TokenAction) -> Result<TokenOutcome, OrchestratorError> {
		let proxy = self.proxy;
		match action {
			TokenAction::Mint { to, amount } => {
				self.send(
					"add",
					&[DynSolValue::Address(to), uint(amount)],
					format!("Minted {} for {} to {}", format_amount(amount), proxy, to),
				)
				.await
			},
			TokenAction::Transfer { to, amount } => {
				self.send(
					"transfer",
					&[DynSolValue::Address(to), uint(amount)],
					format!("Transferred {} from {} to {}", format_amount(amount), proxy, to),
				)
				.await
			},
			TokenAction::AdminTransfer { from, to, amount } => {
				self.send(
					"transfer",
					&[DynSolValue::Address(from), DynSolValue::Address(to), uint(amount)],
					format!(
						"Admin Transfer {} from {} to {} on {}",
						format_amount(amount),
						from,
						to,
						proxy
					),
				)
				.await
			},
			TokenAction::Burn { amount } => {
				self.send(
					"remove",
					&[uint(amount)],
					format!("Burned {} on {}", format_amount(amount), proxy),
				)
				.await
			},
			TokenAction::TotalSupply => {
				let abi = self.session.implementation_abi().await?;
				Ok(TokenOutcome::TotalSupply(
					self.read_uint(proxy, abi, "totalSupply", &[]).await?,
				))
			},
			TokenAction::BalanceOf { account } => {
				let abi = self.session.implementation_abi().await?;
				let amount = self
					.read_uint(proxy, abi, "balanceOf", &[DynSolValue::Address(account)])
					.await?;
				Ok(TokenOutcome::Balance { account, amount })
			},
			TokenAction::TaxConfig => {
				let abi = self.session.implementation_abi().await?;
				Ok(TokenOutcome::Tax {
					bps: self.read_uint(proxy, abi, "taxBps", &[]).await?,
				})
			},
			TokenAction::SetTax { bps } => {
				self.send(
					"setTaxConfig",
					&[DynSolValue::Address(Address::ZERO), uint(U256::from(bps))],
					format!("Updated tax to {} BPS on {}", bps, proxy),
				)
				.await
			},
			TokenAction::ProxyBalance => Ok(TokenOutcome::NativeBalance {
				holder: proxy,
				amount: self.balance_of(proxy).await?,
			}),
			TokenAction::WithdrawNative { to, amount } => {
				let to = match to {
					Some(to) => to,
					None => self.session.wallet()?,
				};
				self.send(
					"withdrawNative",
					&[DynSolValue::Address(to), uint(amount)],
					format!(
						"Withdrew {} native from Proxy {} to {}",
						format_amount(amount),
						proxy,
						to
					),
				)
				.await
			},
			TokenAction::AccessCheck => self.access_check().await.map(TokenOutcome::Access),
			TokenAction::Upgrade => self.upgrade().await,
			TokenAction::FactoryBalance => {
				let factory = self.session.latest_factory().await?;
				Ok(TokenOutcome::NativeBalance {
					holder: factory,
					amount: self.balance_of(factory).await?,
				})
			},
			TokenAction::FactoryWithdraw { to, amount } => self.factory_withdraw(to, amount).await,
		}
	}

	/// Sends `name(args)` to the proxy and logs `message` once confirmed.
	async fn send(
		&self,
		name: &str,
		args: &[DynSolValue],
		message: String,
	) -> Result<TokenOutcome, OrchestratorError> {
		self.session.wallet()?;
		let abi = self.session.implementation_abi().await?;
		let receipt = self
			.session
			.transactions()
			.call(self.proxy, abi, name, args)
			.await?;

		self.session.record(&message).await;
		Ok(TokenOutcome::Confirmed {
			tx_hash: receipt.hash,
			message,
		})
	}

	async fn read_uint(
		&self,
		to: Address,
		abi: &JsonAbi,
		name: &str,
		args: &[DynSolValue],
	) -> Result<U256, OrchestratorError> {
		let value = self.session.transactions().read_one(to, abi, name, args).await?;
		value
			.as_uint()
			.map(|(value, _)| value)
			.ok_or_else(|| unexpected(name, &value))
	}

	async fn read_address(
		&self,
		to: Address,
		abi: &JsonAbi,
		name: &str,
	) -> Result<Address, OrchestratorError> {
		let value = self.session.transactions().read_one(to, abi, name, &[]).await?;
		value.as_address().ok_or_else(|| unexpected(name, &value))
	}

	async fn balance_of(&self, holder: Address) -> Result<U256, OrchestratorError> {
		Ok(self
			.session
			.transactions()
			.delivery()
			.get_balance(holder)
			.await?)
	}

	async fn access_check(&self) -> Result<AccessReport, OrchestratorError> {
		let wallet = self.session.wallet()?;
		let abi = self.session.implementation_abi().await?;

		let authority = self.read_address(self.proxy, abi, "authority").await?;
		let token_owner = self.read_address(self.proxy, abi, "owner").await?;
		let factory_abi = self.session.factory_abi().await?;
		let factory_owner = self.read_address(authority, &factory_abi, "owner").await?;
		let code = self
			.session
			.transactions()
			.delivery()
			.get_code(self.proxy)
			.await?;

		Ok(AccessReport {
			authority,
			token_owner,
			factory_owner,
			wallet,
			is_admin: factory_owner == wallet,
			has_code: !code.is_empty(),
		})
	}

	async fn upgrade(&self) -> Result<TokenOutcome, OrchestratorError> {
		let session = self.session;
		session.wallet()?;

		let artifact = session.compile(&session.sources().implementation).await?;
		let (implementation, _) = session.transactions().deploy(&artifact.bytecode, &[]).await?;
		session.remember(RoleTag::Implementation, implementation).await?;
		tracing::info!(implementation = %implementation, "New implementation deployed");

		let receipt = session
			.transactions()
			.call(
				self.proxy,
				&artifact.abi,
				"upgradeToAndCall",
				&[
					DynSolValue::Address(implementation),
					DynSolValue::Bytes(Vec::new()),
				],
			)
			.await?;

		session
			.record(&format!("Upgraded {} to {}", self.proxy, implementation))
			.await;
		Ok(TokenOutcome::Upgraded {
			implementation,
			tx_hash: receipt.hash,
		})
	}

	async fn factory_withdraw(
		&self,
		to: Option<Address>,
		amount: U256,
	) -> Result<TokenOutcome, OrchestratorError> {
		let session = self.session;
		let wallet = session.wallet()?;
		let factory = session.latest_factory().await?;
		let to = to.unwrap_or(wallet);
		let abi = session.factory_abi().await?;

		let receipt = session
			.transactions()
			.call(
				factory,
				&abi,
				"sendNative",
				&[DynSolValue::Address(to), uint(amount)],
			)
			.await?;

		let message = format!(
			"Withdrew {} from Factory {} to {}",
			format_amount(amount),
			factory,
			to
		);
		session.record(&message).await;
		Ok(TokenOutcome::Confirmed {
			tx_hash: receipt.hash,
			message,
		})
	}
}

fn uint(value: U256) -> DynSolValue {
	DynSolValue::Uint(value, 256)
}

fn unexpected(function: &str, value: &DynSolValue) -> OrchestratorError {
	OrchestratorError::UnexpectedOutput {
		function: function.to_string(),
		value: format!("{:?}", value),
	}
}
