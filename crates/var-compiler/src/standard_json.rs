//! Compiler standard JSON input and output.
//!
//! Only the fields the pipeline reads or writes are modelled. Unknown output
//! fields are ignored.

use alloy_json_abi::JsonAbi;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Output requested for every contract in every file.
pub const OUTPUT_SELECTION: [&str; 2] = ["abi", "evm.bytecode"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardJsonInput {
	pub language: String,
	pub sources: BTreeMap<String, SourceContent>,
	pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContent {
	pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	pub optimizer: Optimizer,
	pub output_selection: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optimizer {
	pub enabled: bool,
	pub runs: u32,
}

impl StandardJsonInput {
	/// Builds an input with the optimizer enabled at `runs` and ABI plus
	/// bytecode selected for every contract.
	pub fn new(sources: BTreeMap<String, String>, runs: u32) -> Self {
		let selection = OUTPUT_SELECTION.iter().map(|s| s.to_string()).collect();
		let mut per_contract = BTreeMap::new();
		per_contract.insert("*".to_string(), selection);
		let mut output_selection = BTreeMap::new();
		output_selection.insert("*".to_string(), per_contract);

		Self {
			language: "Solidity".to_string(),
			sources: sources
				.into_iter()
				.map(|(name, content)| (name, SourceContent { content }))
				.collect(),
			settings: Settings {
				optimizer: Optimizer {
					enabled: true,
					runs,
				},
				output_selection,
			},
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandardJsonOutput {
	#[serde(default)]
	pub errors: Vec<Diagnostic>,
	/// Contracts keyed by source unit name, then contract name.
	#[serde(default)]
	pub contracts: BTreeMap<String, BTreeMap<String, ContractOutput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractOutput {
	#[serde(default)]
	pub abi: Option<JsonAbi>,
	#[serde(default)]
	pub evm: Option<EvmOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvmOutput {
	#[serde(default)]
	pub bytecode: Option<BytecodeOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BytecodeOutput {
	/// Hex without `0x`; may contain link placeholders for unlinked libraries.
	#[serde(default)]
	pub object: String,
}

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Error,
	Warning,
	Info,
}

/// A message reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
	pub severity: Severity,
	/// Error class such as `ParserError` or `Warning`.
	#[serde(rename = "type", default)]
	pub kind: Option<String>,
	pub message: String,
	/// Message with source location, when the compiler supplies one.
	#[serde(default)]
	pub formatted_message: Option<String>,
}

impl Diagnostic {
	pub fn is_error(&self) -> bool {
		self.severity == Severity::Error
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.formatted_message {
			Some(formatted) => f.write_str(formatted.trim_end()),
			None => write!(
				f,
				"{}: {}",
				self.kind.as_deref().unwrap_or("Diagnostic"),
				self.message
			),
		}
	}
}
