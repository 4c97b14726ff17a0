//! Network profiles.

use serde::{Deserialize, Serialize};

/// Everything needed to bind a session to one EVM network.
///
/// A profile is immutable once a session is built from it. Switching
/// networks builds a new session rather than editing this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
	/// Short identifier, also used as the registry key prefix (e.g. `sepolia`).
	pub id: String,
	/// Human-readable name.
	pub name: String,
	/// Primary RPC endpoint, usually supplied through the environment.
	pub rpc_url: Option<String>,
	/// Public endpoint used when no primary endpoint is configured.
	pub fallback_rpc_url: String,
	/// EIP-155 chain id.
	pub chain_id: u64,
	/// Block explorer base URL, with trailing slash.
	pub explorer_url: String,
}

impl NetworkProfile {
	/// Returns the endpoint to connect to: the primary one when set and non-empty,
	/// the fallback otherwise.
	pub fn endpoint(&self) -> &str {
		match self.rpc_url.as_deref().map(str::trim) {
			Some(url) if !url.is_empty() => url,
			_ => &self.fallback_rpc_url,
		}
	}

	/// Explorer link for an address.
	pub fn address_url(&self, address: &str) -> String {
		format!("{}address/{}", self.explorer_base(), address)
	}

	/// Explorer link for a transaction hash.
	pub fn tx_url(&self, hash: &str) -> String {
		format!("{}tx/{}", self.explorer_base(), hash)
	}

	fn explorer_base(&self) -> String {
		if self.explorer_url.ends_with('/') {
			self.explorer_url.clone()
		} else {
			format!("{}/", self.explorer_url)
		}
	}
}
