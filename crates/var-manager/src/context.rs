//! Builds an orchestrator session from the loaded configuration.

use anyhow::{Context as _, Result};
use std::sync::Arc;
use std::time::Duration;
use var_compiler::implementations::solc::SolcBackend;
use var_compiler::{resolver_for, Compiler, ResolverRoots, SourceReference};
use var_config::Config;
use var_core::{ContractSources, Session};
use var_delivery::implementations::evm::alloy::{signer_from_key, AlloyDelivery};
use var_delivery::TransactionManager;
use var_storage::implementations::file::FileRegistryBackend;
use var_storage::{ActivityLog, ContractRegistry};
use var_types::utils::parse_amount;

/// Binds a session to `network_id`, or to the configured default network.
pub fn build_session(config: &Config, network_id: Option<&str>) -> Result<Session> {
	let network_id = network_id.unwrap_or(&config.deployment.default_network);
	let network = config.network(network_id)?;

	let signer = config
		.private_key()
		.map(signer_from_key)
		.transpose()
		.context("Failed to load the wallet key")?;
	if signer.is_none() {
		tracing::info!("No private key configured; only read commands are available");
	}
	let delivery = AlloyDelivery::new(
		&network,
		signer,
		Duration::from_secs(config.deployment.confirmation_timeout_seconds),
	)?;
	let transactions = TransactionManager::new(Arc::new(delivery), config.deployment.confirmations);

	let registry = ContractRegistry::new(Arc::new(FileRegistryBackend::new(
		config.project_path(&config.paths.registry_file),
	)));
	let activity = ActivityLog::new(config.project_path(&config.paths.activity_log));

	let resolver_config = &config.compiler.resolver;
	let resolver = resolver_for(
		&config.paths.project_root,
		ResolverRoots {
			source_root: resolver_config.source_root.clone(),
			upgradeable_root: resolver_config.upgradeable_root.clone(),
			library_roots: resolver_config.library_roots.clone(),
		},
	);
	let compiler = Compiler::new(
		Arc::new(SolcBackend::new(&config.compiler.solc)),
		resolver,
		config.compiler.optimizer_runs,
	);

	let contracts = &config.contracts;
	let sources = ContractSources {
		factory: SourceReference::new(
			config.project_path(&contracts.factory_source),
			&contracts.factory_name,
		),
		implementation: SourceReference::new(
			config.project_path(&contracts.implementation_source),
			&contracts.implementation_name,
		),
	};

	let default_supply = parse_amount(&config.deployment.default_supply)
		.context("Invalid default supply")?;

	tracing::debug!(
		network = %network.id,
		endpoint = %network.endpoint(),
		project_root = %config.paths.project_root.display(),
		"Session ready"
	);

	Ok(Session::new(
		network,
		transactions,
		registry,
		activity,
		Arc::new(compiler),
		sources,
	)
	.with_default_supply(default_supply))
}
