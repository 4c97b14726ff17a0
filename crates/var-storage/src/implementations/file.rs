//! File-based registry backend.
//!
//! The snapshot lives in one JSON file. Writes go to a sibling `.tmp` file
//! that is then renamed over the original, so a crash mid-write leaves the
//! previous snapshot in place.

use crate::{RegistryBackend, RegistryError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Registry backend that stores the snapshot in a single file.
#[derive(Debug, Clone)]
pub struct FileRegistryBackend {
	path: PathBuf,
}

impl FileRegistryBackend {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn temp_path(&self) -> PathBuf {
		let mut name = self
			.path
			.file_name()
			.map(|n| n.to_os_string())
			.unwrap_or_default();
		name.push(".tmp");
		self.path.with_file_name(name)
	}
}

#[async_trait]
impl RegistryBackend for FileRegistryBackend {
	async fn read_snapshot(&self) -> Result<Option<Vec<u8>>, RegistryError> {
		match fs::read(&self.path).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(RegistryError::Backend(format!(
				"Failed to read {}: {}",
				self.path.display(),
				e
			))),
		}
	}

	async fn write_snapshot(&self, snapshot: Vec<u8>) -> Result<(), RegistryError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| RegistryError::Backend(e.to_string()))?;
		}

		let temp_path = self.temp_path();
		fs::write(&temp_path, snapshot)
			.await
			.map_err(|e| RegistryError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| RegistryError::Backend(e.to_string()))?;

		Ok(())
	}
}
