//! Compilation pipeline for the VAR deployment manager.
//!
//! Turns a Solidity source file into a deployable artifact: the entry file and
//! its transitive imports (located through [`ImportResolver`]) are packed into
//! a standard JSON input, handed to a [`CompilerBackend`], and the ABI and
//! bytecode of one named contract are pulled out of the result.
//!
//! Artifacts are never cached. Every request compiles the current sources.

use alloy_json_abi::JsonAbi;
use alloy_primitives::{hex, Bytes};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub mod resolver;
pub mod sources;
pub mod standard_json;

/// Re-export implementations
pub mod implementations {
	pub mod solc;
}

pub use resolver::{ImportKind, ImportResolver, ResolverRoots};
pub use standard_json::{Diagnostic, Severity, StandardJsonInput, StandardJsonOutput};

/// Errors raised while resolving an import.
#[derive(Debug, Error)]
pub enum ImportError {
	/// No candidate file exists. `path` is the first candidate tried.
	#[error("File not found: {}", .path.display())]
	NotFound { import: String, path: PathBuf },
	/// The import uses a prefix that is never resolvable.
	#[error("File not found: {import} (unsupported import prefix)")]
	Unsupported { import: String },
	/// A candidate exists but could not be read.
	#[error("Failed to read {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl ImportError {
	/// True for both not-found flavours.
	pub fn is_not_found(&self) -> bool {
		matches!(self, ImportError::NotFound { .. } | ImportError::Unsupported { .. })
	}
}

/// Errors raised by the compilation pipeline.
#[derive(Debug, Error)]
pub enum CompilationError {
	/// The entry source could not be read.
	#[error("Failed to read source {}: {source}", .path.display())]
	Source {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	/// The compiler reported at least one error. Carries every diagnostic,
	/// warnings included, in the order reported.
	#[error("Compilation failed with {} error(s):\n{}", count_errors(.0), join_diagnostics(.0))]
	Diagnostics(Vec<Diagnostic>),
	/// Compilation succeeded but the requested contract is not in the output.
	#[error("Contract {contract} not found in compiler output for {file}")]
	ArtifactMissing { file: String, contract: String },
	/// The contract has no bytecode, e.g. it is abstract or an interface.
	#[error("Contract {contract} has no deployable bytecode")]
	EmptyBytecode { contract: String },
	/// The bytecode is not plain hex, e.g. it has unlinked library references.
	#[error("Invalid bytecode for {contract}: {reason}")]
	InvalidBytecode { contract: String, reason: String },
	/// The backend itself failed (binary missing, malformed output).
	#[error("Compiler backend error: {0}")]
	Backend(String),
}

fn count_errors(diagnostics: &[Diagnostic]) -> usize {
	diagnostics.iter().filter(|d| d.is_error()).count()
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
	diagnostics
		.iter()
		.map(|d| d.to_string())
		.collect::<Vec<_>>()
		.join("\n")
}

/// A compiler that accepts standard JSON input.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CompilerBackend: Send + Sync {
	/// Compiles a fully assembled source map.
	///
	/// Implementations report source errors through the output's diagnostics
	/// and reserve `Err` for failures of the backend itself.
	async fn compile(
		&self,
		input: StandardJsonInput,
	) -> Result<StandardJsonOutput, CompilationError>;
}

/// A contract to compile: a source file and the contract name inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
	pub path: PathBuf,
	pub contract: String,
}

impl SourceReference {
	pub fn new(path: impl Into<PathBuf>, contract: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			contract: contract.into(),
		}
	}

	/// The unit name the entry file is compiled under: its base name.
	pub fn unit_name(&self) -> String {
		self.path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_else(|| self.path.to_string_lossy().into_owned())
	}
}

/// ABI and creation bytecode of one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
	pub name: String,
	pub abi: JsonAbi,
	pub bytecode: Bytes,
}

/// Result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompileOutput {
	pub artifact: CompiledArtifact,
	/// Non-error diagnostics reported along the way.
	pub warnings: Vec<Diagnostic>,
}

/// Compiles contracts using a backend and an import resolver.
pub struct Compiler {
	backend: Arc<dyn CompilerBackend>,
	resolver: ImportResolver,
	optimizer_runs: u32,
}

impl Compiler {
	pub fn new(
		backend: Arc<dyn CompilerBackend>,
		resolver: ImportResolver,
		optimizer_runs: u32,
	) -> Self {
		Self {
			backend,
			resolver,
			optimizer_runs,
		}
	}

	/// Compiles `source` and returns the artifact of its named contract.
	///
	/// # Errors
	///
	/// Fails with `CompilationError::Diagnostics` if any diagnostic has error
	/// severity. Every diagnostic is logged before that happens.
	pub async fn compile(
		&self,
		source: &SourceReference,
	) -> Result<CompileOutput, CompilationError> {
		let entry = tokio::fs::read_to_string(&source.path)
			.await
			.map_err(|e| CompilationError::Source {
				path: source.path.clone(),
				source: e,
			})?;
		let unit = source.unit_name();

		let set = sources::collect_sources(&unit, entry, &self.resolver).await;
		tracing::debug!(
			unit = %unit,
			sources = set.sources.len(),
			unresolved = set.unresolved.len(),
			"Assembled compiler input"
		);

		let input = StandardJsonInput::new(set.sources, self.optimizer_runs);
		let output = self.backend.compile(input).await?;

		extract_artifact(output, &unit, &source.contract)
	}

	pub fn resolver(&self) -> &ImportResolver {
		&self.resolver
	}
}

/// Surfaces diagnostics and extracts `contract` from `unit` in `output`.
pub fn extract_artifact(
	mut output: StandardJsonOutput,
	unit: &str,
	contract: &str,
) -> Result<CompileOutput, CompilationError> {
	for diagnostic in &output.errors {
		if diagnostic.is_error() {
			tracing::error!(unit, "{}", diagnostic);
		} else {
			tracing::warn!(unit, "{}", diagnostic);
		}
	}

	if output.errors.iter().any(Diagnostic::is_error) {
		return Err(CompilationError::Diagnostics(output.errors));
	}

	let missing = || CompilationError::ArtifactMissing {
		file: unit.to_string(),
		contract: contract.to_string(),
	};
	let compiled = output
		.contracts
		.get_mut(unit)
		.and_then(|contracts| contracts.remove(contract))
		.ok_or_else(missing)?;

	let abi = compiled.abi.ok_or_else(missing)?;
	let object = compiled
		.evm
		.and_then(|evm| evm.bytecode)
		.map(|bytecode| bytecode.object)
		.unwrap_or_default();
	if object.is_empty() {
		return Err(CompilationError::EmptyBytecode {
			contract: contract.to_string(),
		});
	}
	let bytecode = hex::decode(&object).map_err(|e| CompilationError::InvalidBytecode {
		contract: contract.to_string(),
		reason: e.to_string(),
	})?;

	tracing::info!(
		contract,
		bytecode_size = bytecode.len(),
		warnings = output.errors.len(),
		"Compiled contract"
	);

	Ok(CompileOutput {
		artifact: CompiledArtifact {
			name: contract.to_string(),
			abi,
			bytecode: Bytes::from(bytecode),
		},
		warnings: output.errors,
	})
}

/// Builds a resolver whose roots are relative to `project_root`.
pub fn resolver_for(project_root: &Path, roots: ResolverRoots) -> ImportResolver {
	ImportResolver::new(roots.relative_to(project_root))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::standard_json::{BytecodeOutput, ContractOutput, EvmOutput};
	use std::collections::BTreeMap;
	use tempfile::TempDir;

	const VAR_ABI: &str = r#"[
		{"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
		{"type":"function","name":"add","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}
	]"#;

	fn diagnostic(severity: Severity, message: &str) -> Diagnostic {
		Diagnostic {
			severity,
			kind: None,
			message: message.to_string(),
			formatted_message: Some(format!("{message}\n")),
		}
	}

	fn output_with(unit: &str, contract: &str, bytecode: &str) -> StandardJsonOutput {
		let mut contracts = BTreeMap::new();
		contracts.insert(
			contract.to_string(),
			ContractOutput {
				abi: Some(serde_json::from_str(VAR_ABI).unwrap()),
				evm: Some(EvmOutput {
					bytecode: Some(BytecodeOutput {
						object: bytecode.to_string(),
					}),
				}),
			},
		);
		let mut output = StandardJsonOutput::default();
		output.contracts.insert(unit.to_string(), contracts);
		output
	}

	fn setup() -> (TempDir, SourceReference, ImportResolver) {
		let dir = TempDir::new().unwrap();
		let src = dir.path().join("src");
		std::fs::create_dir_all(&src).unwrap();
		std::fs::write(src.join("VAR.sol"), "contract VAR {}").unwrap();
		let resolver = ImportResolver::new(ResolverRoots {
			source_root: src.clone(),
			upgradeable_root: dir.path().join("ozu"),
			library_roots: vec![dir.path().join("oz")],
		});
		(dir, SourceReference::new(src.join("VAR.sol"), "VAR"), resolver)
	}

	#[tokio::test]
	async fn test_compile_passes_expected_input_and_extracts_artifact() {
		let (_dir, source, resolver) = setup();

		let mut backend = MockCompilerBackend::new();
		backend
			.expect_compile()
			.withf(|input| {
				input.sources.keys().collect::<Vec<_>>() == vec!["VAR.sol"]
					&& input.settings.optimizer.enabled
					&& input.settings.optimizer.runs == 200
			})
			.times(1)
			.returning(|_| {
				let mut output = output_with("VAR.sol", "VAR", "6080604052");
				output
					.errors
					.push(diagnostic(Severity::Warning, "Warning: unused variable"));
				Box::pin(async move { Ok(output) })
			});

		let compiler = Compiler::new(Arc::new(backend), resolver, 200);
		let output = compiler.compile(&source).await.unwrap();

		assert_eq!(output.artifact.name, "VAR");
		assert_eq!(output.artifact.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
		let names: Vec<_> = output.artifact.abi.functions().map(|f| f.name.clone()).collect();
		assert_eq!(names, vec!["add", "totalSupply"]);
		assert_eq!(output.warnings.len(), 1);
	}

	#[tokio::test]
	async fn test_compile_errors_keep_every_diagnostic() {
		let (_dir, source, resolver) = setup();

		let mut backend = MockCompilerBackend::new();
		backend.expect_compile().times(1).returning(|_| {
			let output = StandardJsonOutput {
				errors: vec![
					diagnostic(Severity::Warning, "Warning: shadowed"),
					diagnostic(Severity::Error, "ParserError: Expected ';'"),
					diagnostic(Severity::Error, "DeclarationError: Undeclared identifier"),
				],
				contracts: BTreeMap::new(),
			};
			Box::pin(async move { Ok(output) })
		});

		let compiler = Compiler::new(Arc::new(backend), resolver, 200);
		let err = compiler.compile(&source).await.unwrap_err();

		match &err {
			CompilationError::Diagnostics(diagnostics) => assert_eq!(diagnostics.len(), 3),
			other => panic!("unexpected error: {other:?}"),
		}
		let message = err.to_string();
		assert!(message.starts_with("Compilation failed with 2 error(s)"));
		assert!(message.contains("Expected ';'"));
		assert!(message.contains("Undeclared identifier"));
		assert!(message.contains("shadowed"));
	}

	#[tokio::test]
	async fn test_missing_source_file() {
		let (dir, _source, resolver) = setup();
		let compiler = Compiler::new(Arc::new(MockCompilerBackend::new()), resolver, 200);

		let err = compiler
			.compile(&SourceReference::new(dir.path().join("Nope.sol"), "Nope"))
			.await
			.unwrap_err();
		assert!(matches!(err, CompilationError::Source { .. }));
	}

	#[test]
	fn test_missing_contract_fails_loudly() {
		let output = output_with("VAR.sol", "VAR", "6080");
		let err = extract_artifact(output, "VAR.sol", "VARDeployer").unwrap_err();
		assert!(matches!(err, CompilationError::ArtifactMissing { .. }));
		assert_eq!(
			err.to_string(),
			"Contract VARDeployer not found in compiler output for VAR.sol"
		);
	}

	#[test]
	fn test_empty_and_unlinked_bytecode() {
		let err = extract_artifact(output_with("I.sol", "I", ""), "I.sol", "I").unwrap_err();
		assert!(matches!(err, CompilationError::EmptyBytecode { .. }));

		let err = extract_artifact(
			output_with("L.sol", "L", "6080__$53aea86b7d70b31448b230b20ae141a537$__"),
			"L.sol",
			"L",
		)
		.unwrap_err();
		assert!(matches!(err, CompilationError::InvalidBytecode { .. }));
	}

	#[test]
	fn test_source_reference_unit_name() {
		let source = SourceReference::new("VAR (implementation)/src/VARDeployer.sol", "VARDeployer");
		assert_eq!(source.unit_name(), "VARDeployer.sol");
	}
}
