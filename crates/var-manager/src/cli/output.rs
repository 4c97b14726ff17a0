//! Terminal output utilities and formatting
//!
//! Colored status messages and the rendering of orchestrator outcomes.

use alloy_primitives::{Address, Bytes, U256};
use colored::Colorize;
use var_core::{AccessReport, Outcome, TokenOutcome};
use var_types::utils::amount::format_amount_with_decimals;
use var_types::utils::format_amount;
use var_types::{NetworkProfile, RoleTag, TransactionHash};

/// Terminal display utilities for formatted CLI output
pub struct Display;

impl Display {
	/// Displays a formatted section header with underline
	pub fn header(text: &str) {
		println!("\n{}", text.bold().cyan());
		println!("{}", "─".repeat(text.chars().count()).cyan());
	}

	/// Displays a success message with green checkmark
	pub fn success(message: &str) {
		println!("{} {}", "✓".green().bold(), message);
	}

	/// Displays an error message with red X symbol to stderr
	pub fn error(message: &str) {
		eprintln!("{} {}", "✗".red().bold(), message.red());
	}

	/// Displays a warning message with yellow warning symbol
	pub fn warning(message: &str) {
		println!("{} {}", "⚠".yellow().bold(), message.yellow());
	}

	/// Displays an informational message with blue info symbol
	pub fn info(message: &str) {
		println!("{} {}", "ℹ".blue().bold(), message);
	}

	/// Displays a key-value pair with formatted labels
	pub fn kv(key: &str, value: &str) {
		println!("  {} {}", format!("{}:", key).bold(), value);
	}

	/// Displays a formatted section title with arrow prefix
	pub fn section(title: &str) {
		println!("\n{}", format!("▸ {}", title).bold());
	}

	/// Displays a numbered list of next steps
	pub fn next_steps(steps: &[&str]) {
		Self::section("Next Steps");
		for (i, step) in steps.iter().enumerate() {
			println!("  {}. {}", i + 1, step);
		}
	}
}

/// Address with its explorer link.
fn linked_address(network: &NetworkProfile, address: Address) -> String {
	format!(
		"{} {}",
		address,
		network.address_url(&address.to_string()).dimmed()
	)
}

fn linked_tx(network: &NetworkProfile, hash: &TransactionHash) -> String {
	format!("{} {}", hash, network.tx_url(&hash.to_string()).dimmed())
}

/// Basis points as a percentage, e.g. `250` as `2.5%`.
fn bps_percent(bps: U256) -> String {
	format!("{}%", format_amount_with_decimals(bps, 2))
}

/// Prints the result of a dispatched command.
pub fn render(network: &NetworkProfile, outcome: &Outcome) {
	match outcome {
		Outcome::Owner(report) => {
			Display::header("Factory Ready");
			Display::kv("Network", &report.network);
			Display::kv("Factory", &linked_address(network, report.factory));
			Display::kv("Bot", &report.bot.to_string());
			Display::success("Deployer bot authorized");
			Display::next_steps(&[
				"Switch to the bot key",
				"Run `var-manager bot deploy --name <NAME> --symbol <SYMBOL>`",
			]);
		},
		Outcome::Ecosystem(deployment) => {
			Display::header("Ecosystem Deployed");
			Display::kv("Network", &deployment.network);
			Display::kv("Factory", &linked_address(network, deployment.factory));
			Display::kv(
				"Implementation",
				&linked_address(network, deployment.implementation),
			);
			Display::kv("Proxy", &linked_address(network, deployment.proxy));
			Display::kv(
				"Token",
				&format!("{} ({})", deployment.name, deployment.symbol),
			);
			Display::kv("Initial supply", &format_amount(deployment.initial_supply));
			Display::kv("Transaction", &linked_tx(network, &deployment.tx_hash));
			Display::success("Token ecosystem is live");
		},
		Outcome::Token { proxy, outcome } => render_token(network, *proxy, outcome),
		Outcome::ProxyAdded { address, added } => {
			if *added {
				Display::success(&format!("Recorded proxy {} on {}", address, network.id));
			} else {
				Display::warning(&format!("Proxy {} is already recorded", address));
			}
		},
		Outcome::ProxyRemoved { address, removed } => {
			if *removed {
				Display::success(&format!("Removed proxy {} from {}", address, network.id));
			} else {
				Display::warning(&format!("Proxy {} is not recorded", address));
			}
		},
		Outcome::Contracts(buckets) => {
			Display::header(&format!("Contracts on {}", network.name));
			if buckets.is_empty() {
				Display::info("Nothing recorded yet");
				return;
			}
			for (key, addresses) in buckets {
				let title = match key.role {
					RoleTag::Proxy => "Token proxies".to_string(),
					RoleTag::Factory => "Factories".to_string(),
					RoleTag::Implementation => "Implementations".to_string(),
				};
				Display::section(&format!("{} ({})", title, key.storage_key()));
				let last = addresses.len().saturating_sub(1);
				for (i, address) in addresses.iter().enumerate() {
					let marker = if i == last { " (latest)".green().to_string() } else { String::new() };
					println!("  {}. {}{}", i + 1, address, marker);
				}
			}
		},
		Outcome::Wallet { address, balance } => {
			Display::header("Wallet");
			Display::kv("Network", &network.name);
			Display::kv("Address", &linked_address(network, *address));
			Display::kv("Balance", &format_amount(*balance));
		},
		Outcome::ActivityLog(lines) => {
			Display::header("Activity");
			if lines.is_empty() {
				Display::info("No activity recorded");
			}
			for line in lines {
				println!("  {}", line);
			}
		},
	}
}

fn render_token(network: &NetworkProfile, proxy: Address, outcome: &TokenOutcome) {
	match outcome {
		TokenOutcome::Confirmed { tx_hash, message } => {
			Display::success(message);
			Display::kv("Transaction", &linked_tx(network, tx_hash));
		},
		TokenOutcome::TotalSupply(supply) => {
			Display::kv("Proxy", &proxy.to_string());
			Display::kv("Total supply", &format_amount(*supply));
		},
		TokenOutcome::Balance { account, amount } => {
			Display::kv("Account", &account.to_string());
			Display::kv("Balance", &format_amount(*amount));
		},
		TokenOutcome::Tax { bps } => {
			Display::kv("Proxy", &proxy.to_string());
			Display::kv("Tax", &format!("{} BPS ({})", bps, bps_percent(*bps)));
		},
		TokenOutcome::NativeBalance { holder, amount } => {
			Display::kv("Holder", &linked_address(network, *holder));
			Display::kv("Native balance", &format_amount(*amount));
		},
		TokenOutcome::Access(report) => render_access(proxy, report),
		TokenOutcome::Upgraded {
			implementation,
			tx_hash,
		} => {
			Display::success(&format!("Upgraded {}", proxy));
			Display::kv("Implementation", &linked_address(network, *implementation));
			Display::kv("Transaction", &linked_tx(network, tx_hash));
		},
	}
}

fn render_access(proxy: Address, report: &AccessReport) {
	Display::header("Access Check");
	Display::kv("Proxy", &proxy.to_string());
	Display::kv("Authority (factory)", &report.authority.to_string());
	Display::kv("Token owner", &report.token_owner.to_string());
	Display::kv("Factory owner", &report.factory_owner.to_string());
	Display::kv("Wallet", &report.wallet.to_string());
	if !report.has_code {
		Display::warning("No contract code at the proxy address");
	}
	if report.is_admin {
		Display::success("Wallet is the factory owner and administers this token");
	} else {
		Display::warning("Wallet is not the factory owner; admin actions will revert");
	}
}

/// Prints configured networks, marking the active one.
pub fn render_networks(networks: &[NetworkProfile], active: &str) {
	Display::header("Networks");
	for network in networks {
		let marker = if network.id == active { " (active)".green().to_string() } else { String::new() };
		Display::section(&format!("{}{}", network.id, marker));
		Display::kv("Name", &network.name);
		Display::kv("Chain id", &network.chain_id.to_string());
		Display::kv("RPC", network.endpoint());
		Display::kv("Explorer", &network.explorer_url);
	}
}

/// Prints the raw revert payload of a failed transaction.
pub fn render_revert_data(data: &Bytes) {
	Display::kv("Revert data", &data.to_string());
}
