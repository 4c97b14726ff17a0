//! In-memory registry backend.
//!
//! Holds the snapshot in a `RwLock`. Nothing survives the process, which makes
//! it the backend of choice for tests and dry runs.

use crate::{RegistryBackend, RegistryError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry backend that keeps the snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistryBackend {
	snapshot: Arc<RwLock<Option<Vec<u8>>>>,
}

impl MemoryRegistryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts from the given raw contents, which need not be valid JSON.
	pub fn with_contents(contents: Vec<u8>) -> Self {
		Self {
			snapshot: Arc::new(RwLock::new(Some(contents))),
		}
	}

	/// The raw bytes last written.
	pub async fn contents(&self) -> Option<Vec<u8>> {
		self.snapshot.read().await.clone()
	}
}

#[async_trait]
impl RegistryBackend for MemoryRegistryBackend {
	async fn read_snapshot(&self) -> Result<Option<Vec<u8>>, RegistryError> {
		Ok(self.snapshot.read().await.clone())
	}

	async fn write_snapshot(&self, snapshot: Vec<u8>) -> Result<(), RegistryError> {
		*self.snapshot.write().await = Some(snapshot);
		Ok(())
	}
}
