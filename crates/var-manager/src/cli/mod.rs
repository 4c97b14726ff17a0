//! Command-line interface definitions and parsing
//!
//! Defines the clap structure of the operator tool and the conversion of
//! parsed arguments into orchestrator commands.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "var-manager.toml";

/// Main CLI application structure for the VAR deployment manager
#[derive(Parser, Debug)]
#[command(name = "var-manager")]
#[command(about = "VAR Manager - Deploy and manage VAR token ecosystems")]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,

	/// Configuration file path
	#[arg(global = true, long, env = "VAR_MANAGER_CONFIG")]
	pub config: Option<PathBuf>,

	/// Network id to operate on (defaults to the configured default network)
	#[arg(global = true, long, env = "VAR_MANAGER_NETWORK")]
	pub network: Option<String>,

	/// Enable debug logging
	#[arg(global = true, short, long)]
	pub verbose: bool,
}

impl Cli {
	pub fn config_path(&self) -> PathBuf {
		self.config
			.clone()
			.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
	}
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Factory owner operations
	Owner(commands::OwnerCommand),

	/// Deployer bot operations
	Bot(commands::BotCommand),

	/// Token operations against a deployed proxy
	Token(commands::TokenCommand),

	/// Recorded contract management
	Proxy(commands::ProxyCommand),

	/// Show the wallet address and native balance
	Wallet,

	/// Show recent activity log entries
	Logs {
		/// Number of lines to show
		#[arg(long, default_value_t = var_core::command::DEFAULT_LOG_LINES)]
		lines: usize,
	},

	/// List configured networks
	Networks,
}
