//! Persistence for the VAR deployment manager.
//!
//! Two stores live here. The contract registry keeps deployed addresses per
//! network and role as a single JSON snapshot that is rewritten in full on
//! every change. The activity log is a plain text file that only grows.
//!
//! Neither store locks its file. Running two manager processes against the
//! same files at once can lose the earlier writer's changes.

use async_trait::async_trait;
use thiserror::Error;

pub mod activity;
pub mod registry;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use activity::ActivityLog;
pub use registry::{ContractRegistry, RegistrySnapshot};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum RegistryError {
	/// Error that occurs during serialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Where the registry snapshot is kept.
///
/// Backends move whole snapshots only. Parsing, merging and recovery from
/// corrupt contents are handled by [`ContractRegistry`].
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait RegistryBackend: Send + Sync {
	/// Returns the stored snapshot, or `None` if nothing was ever written.
	async fn read_snapshot(&self) -> Result<Option<Vec<u8>>, RegistryError>;

	/// Replaces the stored snapshot. Readers never observe a partial write.
	async fn write_snapshot(&self, snapshot: Vec<u8>) -> Result<(), RegistryError>;
}
