//! Subcommand argument structures and their orchestrator commands.
//!
//! Addresses and amounts are validated while parsing, so a malformed value
//! never reaches the network.

use alloy_primitives::{Address, U256};
use clap::{Args, Subcommand};
use var_core::{Command, EcosystemParams, TokenAction};
use var_types::utils::{parse_address, parse_amount};

fn address_arg(input: &str) -> Result<Address, String> {
	parse_address(input).map_err(|e| e.to_string())
}

/// Whole-token amount with up to 18 decimals, e.g. `1.5`.
fn amount_arg(input: &str) -> Result<U256, String> {
	parse_amount(input).map_err(|e| e.to_string())
}

/// Factory owner operations
#[derive(Args, Debug)]
pub struct OwnerCommand {
	#[command(subcommand)]
	pub command: OwnerSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum OwnerSubcommand {
	/// Deploy and initialize a new factory, then authorize a deployer bot
	Deploy {
		/// Deployer bot address
		#[arg(long, value_parser = address_arg)]
		bot: Address,
	},

	/// Authorize a deployer bot on an existing factory
	AssignBot {
		/// Deployer bot address
		#[arg(long, value_parser = address_arg)]
		bot: Address,

		/// Factory address (defaults to the latest recorded factory)
		#[arg(long, value_parser = address_arg)]
		factory: Option<Address>,

		/// Initialize the factory first (finishes an interrupted `owner deploy`)
		#[arg(long)]
		initialize: bool,
	},
}

/// Deployer bot operations
#[derive(Args, Debug)]
pub struct BotCommand {
	#[command(subcommand)]
	pub command: BotSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum BotSubcommand {
	/// Deploy an implementation and a token ecosystem through the latest factory
	Deploy {
		/// Token name
		#[arg(long)]
		name: String,

		/// Token symbol
		#[arg(long)]
		symbol: String,

		/// Initial supply in whole tokens (defaults to the configured supply)
		#[arg(long, value_parser = amount_arg)]
		supply: Option<U256>,
	},
}

/// Token operations
#[derive(Args, Debug)]
pub struct TokenCommand {
	/// Token proxy address (defaults to the latest recorded proxy)
	#[arg(long, global = true, value_parser = address_arg)]
	pub proxy: Option<Address>,

	#[command(subcommand)]
	pub command: TokenSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenSubcommand {
	/// Mint tokens to an address
	Mint {
		#[arg(long, value_parser = address_arg)]
		to: Address,
		#[arg(long, value_parser = amount_arg)]
		amount: U256,
	},

	/// Transfer tokens from the wallet
	Transfer {
		#[arg(long, value_parser = address_arg)]
		to: Address,
		#[arg(long, value_parser = amount_arg)]
		amount: U256,
	},

	/// Move tokens between two accounts as the token admin
	AdminTransfer {
		#[arg(long, value_parser = address_arg)]
		from: Address,
		#[arg(long, value_parser = address_arg)]
		to: Address,
		#[arg(long, value_parser = amount_arg)]
		amount: U256,
	},

	/// Burn tokens held by the wallet
	Burn {
		#[arg(long, value_parser = amount_arg)]
		amount: U256,
	},

	/// Show the total supply
	TotalSupply,

	/// Show the token balance of an account
	Balance {
		#[arg(long, value_parser = address_arg)]
		account: Address,
	},

	/// Show the burn tax
	Tax,

	/// Set the burn tax in basis points
	SetTax {
		#[arg(long, value_parser = clap::value_parser!(u16).range(0..=10_000))]
		bps: u16,
	},

	/// Show the native balance held by the proxy
	ProxyBalance,

	/// Withdraw native coin held by the proxy
	Withdraw {
		/// Recipient (defaults to the wallet)
		#[arg(long, value_parser = address_arg)]
		to: Option<Address>,
		#[arg(long, value_parser = amount_arg)]
		amount: U256,
	},

	/// Check whether the wallet administers the token
	Access,

	/// Deploy a new implementation and upgrade the proxy to it
	Upgrade,

	/// Show the native balance held by the latest factory
	FactoryBalance,

	/// Withdraw native coin held by the latest factory
	FactoryWithdraw {
		/// Recipient (defaults to the wallet)
		#[arg(long, value_parser = address_arg)]
		to: Option<Address>,
		#[arg(long, value_parser = amount_arg)]
		amount: U256,
	},
}

/// Recorded contract management
#[derive(Args, Debug)]
pub struct ProxyCommand {
	#[command(subcommand)]
	pub command: ProxySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ProxySubcommand {
	/// List every recorded contract on the network
	List,

	/// Record a proxy deployed elsewhere
	Add {
		#[arg(value_parser = address_arg)]
		address: Address,
	},

	/// Forget a recorded proxy
	Remove {
		#[arg(value_parser = address_arg)]
		address: Address,
	},
}

impl From<OwnerCommand> for Command {
	fn from(cmd: OwnerCommand) -> Self {
		match cmd.command {
			OwnerSubcommand::Deploy { bot } => Command::DeployFactory { bot },
			OwnerSubcommand::AssignBot {
				bot,
				factory,
				initialize,
			} => Command::AssignBot {
				bot,
				factory,
				initialize,
			},
		}
	}
}

impl From<BotCommand> for Command {
	fn from(cmd: BotCommand) -> Self {
		match cmd.command {
			BotSubcommand::Deploy {
				name,
				symbol,
				supply,
			} => Command::DeployEcosystem(EcosystemParams {
				name,
				symbol,
				initial_supply: supply,
			}),
		}
	}
}

impl From<TokenCommand> for Command {
	fn from(cmd: TokenCommand) -> Self {
		let action = match cmd.command {
			TokenSubcommand::Mint { to, amount } => TokenAction::Mint { to, amount },
			TokenSubcommand::Transfer { to, amount } => TokenAction::Transfer { to, amount },
			TokenSubcommand::AdminTransfer { from, to, amount } => {
				TokenAction::AdminTransfer { from, to, amount }
			},
			TokenSubcommand::Burn { amount } => TokenAction::Burn { amount },
			TokenSubcommand::TotalSupply => TokenAction::TotalSupply,
			TokenSubcommand::Balance { account } => TokenAction::BalanceOf { account },
			TokenSubcommand::Tax => TokenAction::TaxConfig,
			TokenSubcommand::SetTax { bps } => TokenAction::SetTax { bps },
			TokenSubcommand::ProxyBalance => TokenAction::ProxyBalance,
			TokenSubcommand::Withdraw { to, amount } => TokenAction::WithdrawNative { to, amount },
			TokenSubcommand::Access => TokenAction::AccessCheck,
			TokenSubcommand::Upgrade => TokenAction::Upgrade,
			TokenSubcommand::FactoryBalance => TokenAction::FactoryBalance,
			TokenSubcommand::FactoryWithdraw { to, amount } => {
				TokenAction::FactoryWithdraw { to, amount }
			},
		};
		Command::Token {
			proxy: cmd.proxy,
			action,
		}
	}
}

impl From<ProxyCommand> for Command {
	fn from(cmd: ProxyCommand) -> Self {
		match cmd.command {
			ProxySubcommand::List => Command::ListContracts,
			ProxySubcommand::Add { address } => Command::AddProxy { address },
			ProxySubcommand::Remove { address } => Command::RemoveProxy { address },
		}
	}
}
