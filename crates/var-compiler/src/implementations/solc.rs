//! `solc --standard-json` backend.
//!
//! Runs the native compiler as a child process, writing the input document to
//! its stdin and parsing the output document from its stdout. The source map
//! is complete before the process starts, so the compiler never needs
//! filesystem access of its own.

use crate::{CompilationError, CompilerBackend, StandardJsonInput, StandardJsonOutput};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Compiler backend that shells out to a `solc` binary.
#[derive(Debug, Clone)]
pub struct SolcBackend {
	binary: PathBuf,
}

impl SolcBackend {
	/// Creates a backend for the given binary path or name on `PATH`.
	pub fn new(binary: impl Into<PathBuf>) -> Self {
		Self {
			binary: binary.into(),
		}
	}
}

#[async_trait]
impl CompilerBackend for SolcBackend {
	async fn compile(
		&self,
		input: StandardJsonInput,
	) -> Result<StandardJsonOutput, CompilationError> {
		let payload = serde_json::to_vec(&input)
			.map_err(|e| CompilationError::Backend(format!("Failed to encode input: {}", e)))?;

		tracing::debug!(
			solc = %self.binary.display(),
			sources = input.sources.len(),
			"Invoking compiler"
		);

		let mut child = Command::new(&self.binary)
			.arg("--standard-json")
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| {
				CompilationError::Backend(format!(
					"Failed to start {}: {}",
					self.binary.display(),
					e
				))
			})?;

		let mut stdin = child
			.stdin
			.take()
			.ok_or_else(|| CompilationError::Backend("Compiler stdin unavailable".to_string()))?;
		stdin
			.write_all(&payload)
			.await
			.map_err(|e| CompilationError::Backend(format!("Failed to write input: {}", e)))?;
		// Closing stdin lets the compiler start.
		drop(stdin);

		let output = child
			.wait_with_output()
			.await
			.map_err(|e| CompilationError::Backend(format!("Compiler did not finish: {}", e)))?;

		if output.stdout.is_empty() {
			return Err(CompilationError::Backend(format!(
				"Compiler exited with {} and no output: {}",
				output.status,
				String::from_utf8_lossy(&output.stderr).trim()
			)));
		}

		serde_json::from_slice(&output.stdout)
			.map_err(|e| CompilationError::Backend(format!("Invalid compiler output: {}", e)))
	}
}
