//! Import resolution for Solidity sources.
//!
//! Maps import paths as they appear in source to files on disk. Imports are
//! classified by prefix: the upgradeable OpenZeppelin tree has a single root,
//! the plain OpenZeppelin tree is searched across several vendored copies,
//! `forge-std` is never resolvable, and everything else is project-relative.
//!
//! Nothing is cached. Every call goes back to the filesystem.

use crate::ImportError;
use std::path::{Path, PathBuf};

/// Prefix of the upgradeable OpenZeppelin library.
pub const UPGRADEABLE_PREFIX: &str = "@openzeppelin/contracts-upgradeable/";
/// Prefix of the plain OpenZeppelin library.
pub const LIBRARY_PREFIX: &str = "@openzeppelin/contracts/";
/// Prefix that has no local fixtures and always resolves as not found.
pub const UNSUPPORTED_PREFIX: &str = "forge-std/";

/// How an import path will be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind<'a> {
	/// Path below the upgradeable library root.
	Upgradeable(&'a str),
	/// Path below one of the plain library roots.
	Library(&'a str),
	/// Never resolvable.
	Unsupported,
	/// Path relative to the project source root.
	Local(&'a str),
}

impl<'a> ImportKind<'a> {
	/// Classifies an import path, checking prefixes in priority order.
	pub fn classify(import: &'a str) -> Self {
		if let Some(rest) = import.strip_prefix(UPGRADEABLE_PREFIX) {
			ImportKind::Upgradeable(rest)
		} else if let Some(rest) = import.strip_prefix(LIBRARY_PREFIX) {
			ImportKind::Library(rest)
		} else if import.starts_with(UNSUPPORTED_PREFIX) {
			ImportKind::Unsupported
		} else {
			ImportKind::Local(import)
		}
	}
}

/// Search roots used by [`ImportResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverRoots {
	/// Root for project-relative imports.
	pub source_root: PathBuf,
	/// Root for the upgradeable library.
	pub upgradeable_root: PathBuf,
	/// Candidate roots for the plain library, highest priority first.
	pub library_roots: Vec<PathBuf>,
}

impl ResolverRoots {
	/// Joins every root onto `base`. Absolute roots are kept as they are.
	pub fn relative_to(self, base: &Path) -> Self {
		Self {
			source_root: base.join(self.source_root),
			upgradeable_root: base.join(self.upgradeable_root),
			library_roots: self
				.library_roots
				.into_iter()
				.map(|root| base.join(root))
				.collect(),
		}
	}
}

/// Resolves import paths to file contents.
#[derive(Debug, Clone)]
pub struct ImportResolver {
	roots: ResolverRoots,
}

impl ImportResolver {
	pub fn new(roots: ResolverRoots) -> Self {
		Self { roots }
	}

	pub fn roots(&self) -> &ResolverRoots {
		&self.roots
	}

	/// Returns the files that would be tried for `import`, in order.
	///
	/// Empty for the unsupported prefix.
	pub fn candidates(&self, import: &str) -> Vec<PathBuf> {
		match ImportKind::classify(import) {
			ImportKind::Upgradeable(rest) => vec![self.roots.upgradeable_root.join(rest)],
			ImportKind::Library(rest) => self
				.roots
				.library_roots
				.iter()
				.map(|root| root.join(rest))
				.collect(),
			ImportKind::Unsupported => Vec::new(),
			ImportKind::Local(path) => vec![self.roots.source_root.join(path)],
		}
	}

	/// Reads the source for `import`.
	///
	/// # Errors
	///
	/// Returns `ImportError::Unsupported` for `forge-std/` imports without
	/// touching the filesystem, and `ImportError::NotFound` naming the first
	/// candidate when no candidate exists.
	pub async fn resolve(&self, import: &str) -> Result<String, ImportError> {
		let candidates = self.candidates(import);
		let Some(first) = candidates.first().cloned() else {
			return Err(ImportError::Unsupported {
				import: import.to_string(),
			});
		};

		for candidate in candidates {
			match tokio::fs::read_to_string(&candidate).await {
				Ok(contents) => {
					tracing::debug!(import, path = %candidate.display(), "Resolved import");
					return Ok(contents);
				},
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
				Err(source) => {
					return Err(ImportError::Io {
						path: candidate,
						source,
					})
				},
			}
		}

		Err(ImportError::NotFound {
			import: import.to_string(),
			path: first,
		})
	}
}
