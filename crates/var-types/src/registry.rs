//! Registry keys.
//!
//! The persisted registry is keyed by plain strings: `"<network>"` for token
//! proxies and `"<network>_<role>"` for everything else.

use std::fmt;

/// Distinguishes registry buckets that belong to the same network.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleTag {
	/// Token proxies, stored under the bare network id.
	Proxy,
	/// Deployer factories.
	Factory,
	/// Token implementations.
	Implementation,
}

impl RoleTag {
	/// Suffix appended to the network id, `None` for the bare-network bucket.
	pub fn suffix(&self) -> Option<&str> {
		match self {
			RoleTag::Proxy => None,
			RoleTag::Factory => Some("factory"),
			RoleTag::Implementation => Some("implementation"),
		}
	}
}

impl fmt::Display for RoleTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.suffix().unwrap_or("proxy"))
	}
}

/// A (network, role) bucket address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
	pub network: String,
	pub role: RoleTag,
}

impl RegistryKey {
	pub fn new(network: impl Into<String>, role: RoleTag) -> Self {
		Self {
			network: network.into(),
			role,
		}
	}

	/// The string key used in the persisted snapshot.
	pub fn storage_key(&self) -> String {
		match self.role.suffix() {
			Some(suffix) => format!("{}_{}", self.network, suffix),
			None => self.network.clone(),
		}
	}

	/// Recovers a key from its persisted form given the network it belongs to.
	///
	/// Returns `None` when the string key belongs to another network or to
	/// no known role. Network ids may share a prefix (`bsc`, `bsc_testnet`),
	/// so only exact role suffixes match.
	pub fn from_storage_key(network: &str, key: &str) -> Option<Self> {
		if key == network {
			return Some(Self::new(network, RoleTag::Proxy));
		}
		let role = match key.strip_prefix(network)?.strip_prefix('_')? {
			"factory" => RoleTag::Factory,
			"implementation" => RoleTag::Implementation,
			_ => return None,
		};
		Some(Self::new(network, role))
	}
}

impl fmt::Display for RegistryKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.storage_key())
	}
}
