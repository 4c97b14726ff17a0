//! Main binary entry point for the VAR Manager CLI
//!
//! Loads `.env` and the configuration, binds a session to the selected
//! network and dispatches one operator command against it.

mod cli;
mod context;

use anyhow::Result;
use clap::Parser;
use cli::output::{self, Display};
use cli::{Cli, Commands};
use tracing::instrument;
use tracing_subscriber::EnvFilter;
use var_config::Config;
use var_core::{dispatch, Command, DispatchError, OwnerState};

#[tokio::main]
async fn main() -> Result<()> {
	// Load environment variables from .env file if it exists
	let _ = dotenvy::dotenv();

	let cli = Cli::parse();
	init_logging(cli.verbose);

	let config = Config::from_file(cli.config_path()).await?;
	let network = cli.network.clone();

	let command = match cli.command {
		Commands::Networks => {
			let active = network.as_deref().unwrap_or(&config.deployment.default_network);
			output::render_networks(&config.network_profiles(), active);
			return Ok(());
		},
		Commands::Owner(cmd) => cmd.into(),
		Commands::Bot(cmd) => cmd.into(),
		Commands::Token(cmd) => cmd.into(),
		Commands::Proxy(cmd) => cmd.into(),
		Commands::Wallet => Command::Wallet,
		Commands::Logs { lines } => Command::ActivityLog { lines },
	};

	let session = context::build_session(&config, network.as_deref())?;
	run(&session, command).await
}

/// Dispatches `command` and renders its outcome or failure.
#[instrument(skip_all, fields(command = command.name()))]
async fn run(session: &var_core::Session, command: Command) -> Result<()> {
	let name = command.name();
	match dispatch(session, command).await {
		Ok(outcome) => {
			output::render(session.network(), &outcome);
			Ok(())
		},
		Err(e) => {
			Display::error(&format!("{} failed: {}", name, e));
			if let Some(data) = e.revert_data() {
				output::render_revert_data(data);
			}
			if matches!(&e, DispatchError::Owner(flow) if flow.reached == OwnerState::FactoryDeployed) {
				Display::next_steps(&[
					"Run `var-manager owner assign-bot --bot <BOT> --initialize` to finish the recorded factory",
				]);
			}
			tracing::error!(command = name, error = %e, "Command failed");
			Err(e.into())
		},
	}
}

/// Initialize structured logging
///
/// `RUST_LOG` takes precedence; otherwise the manager crates log at info
/// (debug with `--verbose`) and everything else at warn.
fn init_logging(verbose: bool) {
	use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

	let default = if verbose {
		"var_manager=debug,var_core=debug,var_delivery=debug,var_compiler=debug,var_storage=debug,warn"
	} else {
		"var_manager=info,var_core=info,warn"
	};
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

	tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_target(true)
				.with_thread_ids(false)
				.with_file(false)
				.with_line_number(false)
				.compact(),
		)
		.with(env_filter)
		.init();
}
