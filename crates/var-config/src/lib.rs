//! Configuration for the VAR deployment manager.
//!
//! Configuration is assembled from two layers: a built-in TOML document that
//! describes the supported networks and project layout, and an optional
//! operator file whose tables are merged on top of it. Both layers may refer
//! to environment variables as `${NAME}` or `${NAME:-default}`.

mod defaults;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use var_types::utils::parse_amount;
use var_types::NetworkProfile;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub wallet: WalletConfig,
	pub paths: PathsConfig,
	pub compiler: CompilerConfig,
	pub contracts: ContractsConfig,
	pub deployment: DeploymentConfig,
	/// Networks keyed by their short identifier.
	pub networks: BTreeMap<String, NetworkConfig>,
}

/// Signing key settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletConfig {
	/// Hex private key. Empty means no wallet: read-only commands still work.
	#[serde(default)]
	pub private_key: Option<String>,
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
	/// Root that contract sources and resolver roots are relative to.
	pub project_root: PathBuf,
	/// Deployment registry snapshot.
	pub registry_file: PathBuf,
	/// Append-only activity log.
	pub activity_log: PathBuf,
}

/// Compiler backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompilerConfig {
	/// Path or name of the `solc` binary.
	pub solc: String,
	pub optimizer_runs: u32,
	pub resolver: ResolverConfig,
}

/// Import search roots, relative to the project root.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
	/// Root for project-relative imports.
	pub source_root: PathBuf,
	/// Root for the upgradeable library.
	pub upgradeable_root: PathBuf,
	/// Candidate roots for the plain library, in priority order.
	pub library_roots: Vec<PathBuf>,
}

/// Source references for the two deployable contracts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractsConfig {
	pub factory_source: PathBuf,
	pub factory_name: String,
	pub implementation_source: PathBuf,
	pub implementation_name: String,
}

/// Deployment defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeploymentConfig {
	/// Network used when none is given on the command line.
	pub default_network: String,
	/// Initial token supply, as a decimal amount, used when none is given.
	pub default_supply: String,
	/// Confirmations to wait for on every transaction.
	pub confirmations: u64,
	pub confirmation_timeout_seconds: u64,
}

/// A network entry as written in TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	pub name: String,
	#[serde(default)]
	pub rpc_url: Option<String>,
	pub fallback_rpc_url: String,
	pub chain_id: u64,
	pub explorer_url: String,
}

impl Config {
	/// Loads the built-in configuration overlaid with the file at `path`.
	///
	/// A missing file is not an error: the built-in configuration is used as
	/// is. Environment variables are resolved in both layers.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		match tokio::fs::read_to_string(path).await {
			Ok(contents) => {
				tracing::debug!(path = %path.display(), "Loaded configuration file");
				contents.parse()
			},
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "No configuration file, using built-in defaults");
				Self::builtin()
			},
			Err(e) => Err(ConfigError::Io(e)),
		}
	}

	/// The built-in configuration alone.
	pub fn builtin() -> Result<Self, ConfigError> {
		"".parse()
	}

	/// Returns the profile for a network id.
	pub fn network(&self, id: &str) -> Result<NetworkProfile, ConfigError> {
		let network = self.networks.get(id).ok_or_else(|| {
			ConfigError::Validation(format!(
				"Unknown network '{}'. Available: {}",
				id,
				self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
			))
		})?;

		Ok(NetworkProfile {
			id: id.to_string(),
			name: network.name.clone(),
			rpc_url: network.rpc_url.clone().filter(|url| !url.trim().is_empty()),
			fallback_rpc_url: network.fallback_rpc_url.clone(),
			chain_id: network.chain_id,
			explorer_url: network.explorer_url.clone(),
		})
	}

	/// All configured network profiles, ordered by id.
	pub fn network_profiles(&self) -> Vec<NetworkProfile> {
		self.networks
			.keys()
			.filter_map(|id| self.network(id).ok())
			.collect()
	}

	/// The configured private key, if any non-empty value was supplied.
	pub fn private_key(&self) -> Option<&str> {
		self.wallet
			.private_key
			.as_deref()
			.map(str::trim)
			.filter(|key| !key.is_empty())
	}

	/// Resolves a path from the configuration against the project root.
	pub fn project_path(&self, relative: &Path) -> PathBuf {
		if relative.is_absolute() {
			relative.to_path_buf()
		} else {
			self.paths.project_root.join(relative)
		}
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"At least one network must be configured".into(),
			));
		}
		for (id, network) in &self.networks {
			if network.chain_id == 0 {
				return Err(ConfigError::Validation(format!(
					"Network {id} must have a non-zero chain_id"
				)));
			}
			if network.fallback_rpc_url.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {id} must have a fallback_rpc_url"
				)));
			}
		}
		if !self
			.networks
			.contains_key(&self.deployment.default_network)
		{
			return Err(ConfigError::Validation(format!(
				"Default network '{}' not found in networks",
				self.deployment.default_network
			)));
		}
		if self.compiler.optimizer_runs == 0 {
			return Err(ConfigError::Validation(
				"compiler.optimizer_runs must be greater than 0".into(),
			));
		}
		if self.compiler.resolver.library_roots.is_empty() {
			return Err(ConfigError::Validation(
				"compiler.resolver.library_roots cannot be empty".into(),
			));
		}
		if self.deployment.confirmation_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"deployment.confirmation_timeout_seconds must be greater than 0".into(),
			));
		}
		parse_amount(&self.deployment.default_supply).map_err(|e| {
			ConfigError::Validation(format!("deployment.default_supply: {e}"))
		})?;

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	/// Parses an operator document and overlays it on the built-in one.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut base: toml::Value = toml::from_str(&resolve_env_vars(defaults::DEFAULT_CONFIG)?)?;
		let overlay: toml::Value = toml::from_str(&resolve_env_vars(s)?)?;
		merge(&mut base, overlay);

		let config: Config = base.try_into()?;
		config.validate()?;
		Ok(config)
	}
}

/// Merges `overlay` into `base`, recursing into tables and replacing
/// everything else.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
	match (base, overlay) {
		(toml::Value::Table(base), toml::Value::Table(overlay)) => {
			for (key, value) in overlay {
				match base.get_mut(&key) {
					Some(existing) => merge(existing, value),
					None => {
						base.insert(key, value);
					},
				}
			}
		},
		(base, overlay) => *base = overlay,
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {e}")))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("VAR_CFG_TEST_HOST", "localhost");
		std::env::set_var("VAR_CFG_TEST_PORT", "8545");

		let input = "url = \"http://${VAR_CFG_TEST_HOST}:${VAR_CFG_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("VAR_CFG_TEST_HOST");
		std::env::remove_var("VAR_CFG_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${VAR_CFG_MISSING:-fallback}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "value = \"fallback\"");

		let input = "value = \"${VAR_CFG_MISSING:-}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "value = \"\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${VAR_CFG_MISSING}\"");
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("VAR_CFG_MISSING"));
	}

	#[test]
	fn test_builtin_config() {
		let config = Config::builtin().unwrap();

		assert_eq!(config.deployment.default_network, "sepolia");
		assert_eq!(config.deployment.default_supply, "1000000");
		assert_eq!(config.compiler.optimizer_runs, 200);
		assert_eq!(config.paths.registry_file, PathBuf::from("deployed_contracts.json"));
		assert_eq!(config.compiler.resolver.library_roots.len(), 4);

		let ids: Vec<_> = config.networks.keys().cloned().collect();
		assert_eq!(ids, vec!["bsc_mainnet", "bsc_testnet", "sepolia"]);

		let bsc = config.network("bsc_testnet").unwrap();
		assert_eq!(bsc.chain_id, 97);
		assert_eq!(bsc.explorer_url, "https://testnet.bscscan.com/");
	}

	#[test]
	fn test_unknown_network_lists_available() {
		let config = Config::builtin().unwrap();
		let err = config.network("mainnet").unwrap_err().to_string();
		assert!(err.contains("mainnet"));
		assert!(err.contains("sepolia"));
	}

	#[test]
	fn test_overlay_merges_tables() {
		let config: Config = r#"
[deployment]
default_network = "local"

[networks.local]
name = "Local"
rpc_url = "http://127.0.0.1:8545"
fallback_rpc_url = "http://127.0.0.1:8545"
chain_id = 31337
explorer_url = "http://localhost/"
"#
		.parse()
		.unwrap();

		// Built-in networks survive next to the new one.
		assert_eq!(config.networks.len(), 4);
		assert_eq!(config.deployment.default_network, "local");
		// Untouched keys in a merged table keep their built-in value.
		assert_eq!(config.deployment.default_supply, "1000000");
		assert_eq!(
			config.network("local").unwrap().endpoint(),
			"http://127.0.0.1:8545"
		);
	}

	#[test]
	fn test_blank_rpc_url_uses_fallback() {
		let config: Config = r#"
[networks.sepolia]
rpc_url = ""
"#
		.parse()
		.unwrap();

		let sepolia = config.network("sepolia").unwrap();
		assert_eq!(sepolia.rpc_url, None);
		assert_eq!(sepolia.endpoint(), "https://rpc2.sepolia.org");
	}

	#[test]
	fn test_private_key_from_file_and_blank() {
		let config: Config = "[wallet]\nprivate_key = \"  \"\n".parse().unwrap();
		assert_eq!(config.private_key(), None);

		let config: Config = "[wallet]\nprivate_key = \"0xabc\"\n".parse().unwrap();
		assert_eq!(config.private_key(), Some("0xabc"));
	}

	#[test]
	fn test_validation_errors() {
		let err = "[deployment]\ndefault_network = \"nowhere\"\n"
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("nowhere"));

		let err = "[deployment]\ndefault_supply = \"1.5.0\"\n"
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("default_supply"));

		let err = "[compiler]\noptimizer_runs = 0\n".parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("optimizer_runs"));

		let err = "[networks.sepolia]\nchain_id = 0\n"
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("chain_id"));
	}

	#[test]
	fn test_project_path() {
		let config: Config = "[paths]\nproject_root = \"/srv/var\"\n".parse().unwrap();
		assert_eq!(
			config.project_path(Path::new("VAR (implementation)/src/VAR.sol")),
			PathBuf::from("/srv/var/VAR (implementation)/src/VAR.sol")
		);
		assert_eq!(
			config.project_path(Path::new("/abs/VAR.sol")),
			PathBuf::from("/abs/VAR.sol")
		);
	}

	#[tokio::test]
	async fn test_from_file() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[deployment]\nconfirmations = 3").unwrap();

		let config = Config::from_file(file.path()).await.unwrap();
		assert_eq!(config.deployment.confirmations, 3);
	}

	#[tokio::test]
	async fn test_missing_file_uses_builtin() {
		let dir = tempfile::tempdir().unwrap();
		let config = Config::from_file(dir.path().join("absent.toml"))
			.await
			.unwrap();
		assert_eq!(config.deployment.confirmations, 1);
	}
}
