//! In-memory package resolver.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{PackageClass, PackageMetadata, PackageResolver, clean_path, is_relative_import};
use crate::error::LookupError;
use crate::types::ImportMode;

/// Root under which registered packages get their default directories.
const MEMORY_ROOT: &str = "/memory";

/// A [`PackageResolver`] backed by metadata registered up front.
///
/// Canonical names resolve from anywhere. Relative names (`.`, `./x`) resolve
/// against the directory each package was registered with. Every lookup is
/// recorded so callers can inspect what was asked and in which mode.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    packages: HashMap<String, PackageMetadata>,
    by_dir: HashMap<PathBuf, String>,
    lookups: RefCell<Vec<(String, ImportMode)>>,
}

impl MemoryResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default directory for a registered package.
    #[must_use]
    pub fn dir_for(canonical_path: &str) -> PathBuf {
        Path::new(MEMORY_ROOT).join(canonical_path)
    }

    /// Register metadata, replacing anything already registered under its path.
    pub fn insert(&mut self, meta: PackageMetadata) {
        self.by_dir
            .insert(meta.dir.clone(), meta.canonical_path.clone());
        self.packages.insert(meta.canonical_path.clone(), meta);
    }

    /// Register a package with the given imports, classified by its path.
    #[must_use]
    pub fn with_package(mut self, canonical_path: &str, imports: &[&str]) -> Self {
        let mut meta = PackageMetadata::new(
            canonical_path,
            Self::dir_for(canonical_path),
            PackageClass::for_path(canonical_path),
        );
        meta.imports = imports.iter().map(ToString::to_string).collect();
        self.insert(meta);
        self
    }

    /// Register a standard package.
    #[must_use]
    pub fn with_builtin(mut self, canonical_path: &str) -> Self {
        self.insert(PackageMetadata::new(
            canonical_path,
            Self::dir_for(canonical_path),
            PackageClass::Builtin,
        ));
        self
    }

    /// Register fully specified metadata.
    #[must_use]
    pub fn with_metadata(mut self, meta: PackageMetadata) -> Self {
        self.insert(meta);
        self
    }

    /// Every lookup made so far, in order.
    #[must_use]
    pub fn lookups(&self) -> Vec<(String, ImportMode)> {
        self.lookups.borrow().clone()
    }

    fn find(&self, name: &str, from_dir: &Path) -> Option<&PackageMetadata> {
        if is_relative_import(name) {
            let dir = clean_path(&from_dir.join(name));
            let path = self.by_dir.get(&dir)?;
            return self.packages.get(path);
        }
        self.packages.get(name)
    }
}

impl PackageResolver for MemoryResolver {
    fn resolve(
        &self,
        name: &str,
        from_dir: &Path,
        mode: ImportMode,
    ) -> Result<PackageMetadata, LookupError> {
        self.lookups.borrow_mut().push((name.to_string(), mode));

        let meta = self
            .find(name, from_dir)
            .ok_or_else(|| LookupError::NotFound {
                name: name.to_string(),
                from_dir: from_dir.to_path_buf(),
            })?;

        Ok(match mode {
            ImportMode::Full => meta.clone(),
            ImportMode::LocateOnly => meta.located(),
        })
    }
}
