//! Package metadata sources.
//!
//! The dependency resolver never reads source code itself. It asks a
//! [`PackageResolver`] to turn an import name plus a source directory into
//! [`PackageMetadata`], and works purely on that.
//!
//! Two implementations ship with the crate:
//!
//! - [`GoSourceResolver`]: reads Go-layout trees from disk
//! - [`MemoryResolver`]: serves metadata registered up front

mod go;
mod go_parser;
mod memory;

pub use go::{GoEnv, GoSourceResolver};
pub use memory::MemoryResolver;

use std::path::{Component, Path, PathBuf};

use crate::error::LookupError;
use crate::types::ImportMode;

/// Resolver's classification of a located package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageClass {
    /// Standard distribution package
    Builtin,
    /// Implementation detail of its importer
    Internal,
    /// Anything else
    External,
}

impl PackageClass {
    /// Classify a non-standard package by its canonical path.
    ///
    /// A path is internal when any element after the first is `internal`.
    #[must_use]
    pub fn for_path(canonical_path: &str) -> Self {
        if is_internal_path(canonical_path) {
            Self::Internal
        } else {
            Self::External
        }
    }
}

/// Whether a canonical path names an internal package.
#[must_use]
pub fn is_internal_path(canonical_path: &str) -> bool {
    canonical_path
        .split('/')
        .skip(1)
        .any(|element| element == "internal")
}

/// Everything the dependency resolver needs to know about one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Fully qualified import path
    pub canonical_path: String,
    /// Directory holding the package sources
    pub dir: PathBuf,
    /// Builtin / internal / external
    pub class: PackageClass,
    /// Imports of the package's own sources, sorted and unique
    pub imports: Vec<String>,
    /// Imports of in-package test sources
    pub test_imports: Vec<String>,
    /// Imports of external test package sources
    pub xtest_imports: Vec<String>,
}

impl PackageMetadata {
    /// Metadata with no imports.
    #[must_use]
    pub fn new(
        canonical_path: impl Into<String>,
        dir: impl Into<PathBuf>,
        class: PackageClass,
    ) -> Self {
        Self {
            canonical_path: canonical_path.into(),
            dir: dir.into(),
            class,
            imports: Vec::new(),
            test_imports: Vec::new(),
            xtest_imports: Vec::new(),
        }
    }

    /// Import list to expand, optionally including test imports.
    #[must_use]
    pub fn imports_for(&self, include_tests: bool) -> Vec<String> {
        let mut imports = self.imports.clone();
        if include_tests {
            imports.extend(self.test_imports.iter().cloned());
            imports.extend(self.xtest_imports.iter().cloned());
        }
        imports
    }

    /// Copy without import lists, as returned in locate-only mode.
    #[must_use]
    pub fn located(&self) -> Self {
        Self::new(self.canonical_path.clone(), self.dir.clone(), self.class)
    }
}

/// Turns an import name into package metadata.
///
/// Implementations are toolchain specific. Failures are per package: the
/// caller records them and carries on with other imports.
pub trait PackageResolver {
    /// Look up `name` as imported from `from_dir`.
    ///
    /// In [`ImportMode::LocateOnly`] implementations should skip reading
    /// imports and return empty import lists.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the package cannot be located or read.
    fn resolve(
        &self,
        name: &str,
        from_dir: &Path,
        mode: ImportMode,
    ) -> Result<PackageMetadata, LookupError>;
}

impl<T: PackageResolver + ?Sized> PackageResolver for &T {
    fn resolve(
        &self,
        name: &str,
        from_dir: &Path,
        mode: ImportMode,
    ) -> Result<PackageMetadata, LookupError> {
        (**self).resolve(name, from_dir, mode)
    }
}

/// Whether an import name is relative to the importing directory.
#[must_use]
pub fn is_relative_import(name: &str) -> bool {
    name == "." || name == ".." || name.starts_with("./") || name.starts_with("../")
}

/// Lexically clean a path, folding `.` and `..` components.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
