//! Source map assembly.
//!
//! `solc --standard-json` has no import callback, so the source map handed to
//! it must already contain every unit the entry file imports transitively.
//! Units are named the way the compiler names them before it would call back:
//! relative imports are joined onto the importing unit's directory, all other
//! imports are used verbatim.

use crate::resolver::ImportResolver;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// The assembled source map plus the imports that could not be resolved.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
	pub sources: BTreeMap<String, String>,
	/// Unit names that failed to resolve. The compiler reports these itself.
	pub unresolved: BTreeSet<String>,
}

static COMMENTS: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").expect("valid comment pattern"));

static IMPORTS: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"\bimport\s+(?:[^;"']*?\bfrom\s+)?["']([^"']+)["']"#)
		.expect("valid import pattern")
});

/// Extracts import paths from Solidity source, ignoring comments.
pub fn scan_imports(source: &str) -> Vec<String> {
	let stripped = COMMENTS.replace_all(source, "");
	IMPORTS
		.captures_iter(&stripped)
		.filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
		.collect()
}

/// Returns the unit name the compiler uses for `import` seen in `importer`.
pub fn unit_name(importer: &str, import: &str) -> String {
	if !(import.starts_with("./") || import.starts_with("../")) {
		return import.to_string();
	}

	let mut parts: Vec<&str> = importer.split('/').collect();
	// drop the importer's file name
	parts.pop();
	for segment in import.split('/') {
		match segment {
			"." | "" => {},
			".." => {
				parts.pop();
			},
			other => parts.push(other),
		}
	}
	parts.retain(|part| !part.is_empty());
	parts.join("/")
}

/// Collects the entry unit and everything it imports, transitively.
pub async fn collect_sources(
	entry_name: &str,
	entry_source: String,
	resolver: &ImportResolver,
) -> SourceSet {
	let mut set = SourceSet::default();
	let mut queue = VecDeque::new();
	queue.push_back(entry_name.to_string());
	set.sources.insert(entry_name.to_string(), entry_source);

	while let Some(unit) = queue.pop_front() {
		let imports = match set.sources.get(&unit) {
			Some(source) => scan_imports(source),
			None => continue,
		};

		for import in imports {
			let name = unit_name(&unit, &import);
			if set.sources.contains_key(&name) || set.unresolved.contains(&name) {
				continue;
			}
			match resolver.resolve(&name).await {
				Ok(contents) => {
					set.sources.insert(name.clone(), contents);
					queue.push_back(name);
				},
				Err(e) => {
					tracing::debug!(unit = %unit, import = %name, error = %e, "Import not resolved");
					set.unresolved.insert(name);
				},
			}
		}
	}

	set
}
