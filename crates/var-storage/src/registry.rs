//! Contract registry.
//!
//! Maps `"<network>"` / `"<network>_<role>"` keys to ordered lists of address
//! strings, latest last. Every query reads the full snapshot and every
//! mutation rewrites it, so the stored file is always a complete document.
//!
//! A snapshot that cannot be parsed is treated as empty and logged. The chain
//! is the source of truth; a lost registry must never block a deployment.

use crate::{RegistryBackend, RegistryError};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use var_types::{RegistryKey, RoleTag};

/// The full persisted registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrySnapshot(pub BTreeMap<String, Vec<String>>);

impl RegistrySnapshot {
	fn bucket(&self, key: &RegistryKey) -> &[String] {
		self.0
			.get(&key.storage_key())
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}
}

/// Compares a stored entry to an address without caring about hex case.
fn same_address(entry: &str, address: &Address) -> bool {
	match entry.parse::<Address>() {
		Ok(parsed) => parsed == *address,
		Err(_) => entry.eq_ignore_ascii_case(&address.to_string()),
	}
}

/// Registry of deployed contract addresses.
#[derive(Clone)]
pub struct ContractRegistry {
	backend: Arc<dyn RegistryBackend>,
}

impl ContractRegistry {
	pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
		Self { backend }
	}

	/// Reads the whole registry, recovering from corrupt contents as empty.
	pub async fn load(&self) -> Result<RegistrySnapshot, RegistryError> {
		let Some(bytes) = self.backend.read_snapshot().await? else {
			return Ok(RegistrySnapshot::default());
		};
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(RegistrySnapshot::default());
		}

		match serde_json::from_slice::<RegistrySnapshot>(&bytes) {
			Ok(snapshot) => Ok(snapshot),
			Err(e) => {
				tracing::warn!(
					error = %e,
					"Registry snapshot is corrupt, continuing with an empty registry"
				);
				Ok(RegistrySnapshot::default())
			},
		}
	}

	async fn store(&self, snapshot: &RegistrySnapshot) -> Result<(), RegistryError> {
		let bytes = serde_json::to_vec_pretty(snapshot)
			.map_err(|e| RegistryError::Serialization(e.to_string()))?;
		self.backend.write_snapshot(bytes).await
	}

	/// Adds `address` to the end of the bucket unless it is already there.
	///
	/// Returns `true` if the registry changed. Appending an existing address is
	/// a no-op and leaves its original position untouched.
	pub async fn append(&self, key: &RegistryKey, address: Address) -> Result<bool, RegistryError> {
		let mut snapshot = self.load().await?;
		let bucket = snapshot.0.entry(key.storage_key()).or_default();
		if bucket.iter().any(|entry| same_address(entry, &address)) {
			tracing::debug!(key = %key, address = %address, "Address already registered");
			return Ok(false);
		}

		bucket.push(address.to_checksum(None));
		self.store(&snapshot).await?;
		tracing::info!(key = %key, address = %address, "Registered address");
		Ok(true)
	}

	/// Removes `address` from the bucket. Returns `true` if it was present.
	pub async fn remove(&self, key: &RegistryKey, address: Address) -> Result<bool, RegistryError> {
		let mut snapshot = self.load().await?;
		let storage_key = key.storage_key();
		let Some(bucket) = snapshot.0.get_mut(&storage_key) else {
			return Ok(false);
		};

		let before = bucket.len();
		bucket.retain(|entry| !same_address(entry, &address));
		if bucket.len() == before {
			return Ok(false);
		}
		if bucket.is_empty() {
			snapshot.0.remove(&storage_key);
		}

		self.store(&snapshot).await?;
		tracing::info!(key = %key, address = %address, "Removed address");
		Ok(true)
	}

	/// Addresses in the bucket, oldest first. Entries that are not valid
	/// addresses are skipped with a warning.
	pub async fn list(&self, key: &RegistryKey) -> Result<Vec<Address>, RegistryError> {
		let snapshot = self.load().await?;
		Ok(parse_bucket(key, snapshot.bucket(key)))
	}

	/// The most recently added address in the bucket.
	pub async fn latest(&self, key: &RegistryKey) -> Result<Option<Address>, RegistryError> {
		Ok(self.list(key).await?.pop())
	}

	/// Every non-empty bucket that belongs to `network`.
	pub async fn buckets(
		&self,
		network: &str,
	) -> Result<Vec<(RegistryKey, Vec<Address>)>, RegistryError> {
		let snapshot = self.load().await?;
		let mut buckets: Vec<_> = snapshot
			.0
			.iter()
			.filter_map(|(storage_key, entries)| {
				let key = RegistryKey::from_storage_key(network, storage_key)?;
				let addresses = parse_bucket(&key, entries);
				(!addresses.is_empty()).then_some((key, addresses))
			})
			.collect();
		// Proxies first, then the remaining roles by name.
		buckets.sort_by_key(|(key, _)| (key.role != RoleTag::Proxy, key.role.to_string()));
		Ok(buckets)
	}
}

fn parse_bucket(key: &RegistryKey, entries: &[String]) -> Vec<Address> {
	entries
		.iter()
		.filter_map(|entry| match entry.parse::<Address>() {
			Ok(address) => Some(address),
			Err(_) => {
				tracing::warn!(key = %key, entry = %entry, "Skipping invalid registry entry");
				None
			},
		})
		.collect()
}
