//! Append-only activity log.
//!
//! One human-readable line per event, prefixed with an RFC 3339 UTC
//! timestamp in brackets. The file is only ever appended to and read back as
//! raw lines for display.

use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// The activity log file.
#[derive(Debug, Clone)]
pub struct ActivityLog {
	path: PathBuf,
}

impl ActivityLog {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Appends `message` as a single timestamped line.
	///
	/// Newlines inside `message` are flattened so one call is one line.
	pub async fn append(&self, message: &str) -> std::io::Result<()> {
		let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
		let line = format!("[{}] {}\n", timestamp, message.replace(['\r', '\n'], " "));

		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)
			.await?;
		file.write_all(line.as_bytes()).await?;
		file.flush().await
	}

	/// Appends `message` and mirrors it to tracing. A failed write is logged
	/// and otherwise ignored.
	pub async fn record(&self, message: &str) {
		tracing::info!(target: "var_storage::activity", "{}", message);
		if let Err(e) = self.append(message).await {
			tracing::warn!(path = %self.path.display(), error = %e, "Failed to write activity log");
		}
	}

	/// The last `n` lines, oldest first. A missing file has no lines.
	pub async fn tail(&self, n: usize) -> std::io::Result<Vec<String>> {
		let contents = match tokio::fs::read_to_string(&self.path).await {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(e),
		};

		let lines: Vec<&str> = contents.lines().filter(|line| !line.is_empty()).collect();
		let start = lines.len().saturating_sub(n);
		Ok(lines[start..].iter().map(|line| line.to_string()).collect())
	}
}
