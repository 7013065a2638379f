//! Recursive dependency resolution.
//!
//! [`DependencyResolver`] turns a root import into a tree of [`Package`]s.
//! Each import name is resolved at most once per [`ResolutionContext`]; later
//! encounters reuse the cached result under a new parent.
//!
//! ## Cycles
//!
//! A package that is re-entered through its own ancestor chain is looked up
//! in [`ImportMode::LocateOnly`]: it gets a name and location but no imports.
//! Its children come from the full resolution already in progress higher up
//! the chain, so the graph still carries both edges of the cycle.
//!
//! ## Failures
//!
//! A dependency that fails to resolve stays in its importer's child list as
//! an unresolved leaf and is recorded in the context. Only the root failing
//! is fatal.

use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::context::ResolutionContext;
use crate::error::{Error, LookupError, Result};
use crate::source::{PackageClass, PackageResolver, is_relative_import};
use crate::types::{FOREIGN_IMPORT, ImportMode, Package, PackageId, PackageKind, SELF_IMPORT};

/// Reserved namespace whose packages are vendored inside the standard tree.
const RESERVED_NAMESPACE: &str = "golang_org";

/// Where packages from the reserved namespace actually live.
const RESERVED_NAMESPACE_VENDOR: &str = "vendor";

/// An import name after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// The foreign-function pseudo-import; never resolved
    Foreign,
    /// A path to hand to the package resolver
    Path(String),
}

/// Normalize an import name as written into the name to look up.
///
/// Redundant slashes are dropped and the reserved `golang_org` namespace is
/// mapped to its vendored location.
#[must_use]
pub fn normalize_import(name: &str) -> ImportName {
    let name = name.trim();
    if name == FOREIGN_IMPORT {
        return ImportName::Foreign;
    }

    let cleaned = if is_relative_import(name) {
        name.trim_end_matches('/').to_string()
    } else {
        name.split('/')
            .filter(|element| !element.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    };

    let is_reserved = cleaned == RESERVED_NAMESPACE
        || cleaned.starts_with(&format!("{RESERVED_NAMESPACE}/"));
    if is_reserved {
        return ImportName::Path(format!("{RESERVED_NAMESPACE_VENDOR}/{cleaned}"));
    }
    ImportName::Path(cleaned)
}

/// Resolves packages and their transitive imports.
#[derive(Debug)]
pub struct DependencyResolver<R> {
    source: R,
}

impl<R: PackageResolver> DependencyResolver<R> {
    /// Create a resolver that reads metadata from `source`.
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// The metadata source in use.
    pub fn source(&self) -> &R {
        &self.source
    }

    /// Resolve the designated root of a scan.
    ///
    /// On success the root is renamed to its canonical path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootUnresolved`] if the root itself cannot be
    /// resolved. Failures further down are recorded in `ctx` instead.
    pub fn resolve_root(
        &self,
        ctx: &mut ResolutionContext,
        name: &str,
        dir: &Path,
    ) -> Result<PackageId> {
        let id = ctx.alloc(Package::new(name, dir));
        self.resolve(ctx, id).map_err(|source| Error::RootUnresolved {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            source,
        })?;
        rename_to_canonical(ctx, id);
        Ok(id)
    }

    /// Resolve one package as the root of its own tree.
    ///
    /// Failures are never fatal: check [`Package::is_resolved`] on the result.
    /// A resolved package is renamed to its canonical path.
    pub fn resolve_package(
        &self,
        ctx: &mut ResolutionContext,
        name: &str,
        dir: &Path,
    ) -> PackageId {
        let id = ctx.alloc(Package::new(name, dir));
        // Recorded in the context with its reason; the caller inspects the package.
        let _ = self.resolve(ctx, id);
        if ctx.package(id).is_resolved() {
            rename_to_canonical(ctx, id);
        }
        id
    }

    fn resolve(
        &self,
        ctx: &mut ResolutionContext,
        id: PackageId,
    ) -> std::result::Result<(), LookupError> {
        let (name, source_dir) = {
            let pkg = ctx.package_mut(id);
            // Only a failed lookup or an ignored root clears this again.
            pkg.resolved = true;
            (pkg.name.clone(), pkg.source_dir.clone())
        };

        let lookup_name = match normalize_import(&name) {
            ImportName::Foreign => {
                ctx.package_mut(id).kind = PackageKind::Foreign;
                return Ok(());
            }
            ImportName::Path(path) => path,
        };

        let mode = if ctx.has_seen_import(&lookup_name) && ctx.is_ancestor(id, &name) {
            debug!(
                package = %name,
                depth = ctx.depth(id),
                "Import cycle detected, locating without expanding imports"
            );
            ImportMode::LocateOnly
        } else {
            ImportMode::Full
        };
        ctx.package_mut(id).located_only = mode == ImportMode::LocateOnly;

        let meta = match self.source.resolve(&lookup_name, &source_dir, mode) {
            Ok(meta) => meta,
            Err(e) => {
                debug!(
                    package = %name,
                    from = %source_dir.display(),
                    error = %e,
                    "Failed to resolve package"
                );
                let pkg = ctx.package_mut(id);
                pkg.resolved = false;
                pkg.kind = PackageKind::Unresolved;
                // The self sentinel is a directory probe, not a real import.
                if name != SELF_IMPORT {
                    ctx.mark_unresolved(&name, &e.to_string());
                }
                return Err(e);
            }
        };

        if name == SELF_IMPORT && ctx.should_ignore(&meta.canonical_path) {
            debug!(
                package = %meta.canonical_path,
                "Root package matches ignore list, skipping"
            );
            let pkg = ctx.package_mut(id);
            pkg.resolved = false;
            pkg.canonical_path = Some(meta.canonical_path);
            return Ok(());
        }

        {
            let pkg = ctx.package_mut(id);
            pkg.canonical_path = Some(meta.canonical_path.clone());
            pkg.dir = (!meta.dir.as_os_str().is_empty()).then(|| meta.dir.clone());
            pkg.kind = match meta.class {
                PackageClass::Builtin => PackageKind::Builtin,
                PackageClass::Internal => PackageKind::Internal,
                PackageClass::External => PackageKind::External,
            };
        }

        if meta.class == PackageClass::Builtin {
            return Ok(());
        }

        let imports = meta.imports_for(ctx.include_tests());
        self.set_deps(ctx, id, &imports, &meta.dir);
        Ok(())
    }

    /// Resolve each distinct import and install the sorted child list.
    fn set_deps(
        &self,
        ctx: &mut ResolutionContext,
        id: PackageId,
        imports: &[String],
        dir: &Path,
    ) {
        let (own_name, own_path) = {
            let pkg = ctx.package(id);
            (pkg.name.clone(), pkg.canonical_path.clone())
        };

        let mut unique = HashSet::new();
        let mut children = Vec::new();
        for import in imports {
            // Test sources may import their own package.
            if *import == own_name || own_path.as_deref() == Some(import.as_str()) {
                continue;
            }
            if !unique.insert(import.as_str()) {
                continue;
            }
            self.add_dep(ctx, id, import, dir, &mut children);
        }

        children.sort_by(|a, b| ctx.package(*a).dependency_order(ctx.package(*b)));
        ctx.package_mut(id).children = Rc::from(children);
    }

    fn add_dep(
        &self,
        ctx: &mut ResolutionContext,
        parent: PackageId,
        name: &str,
        dir: &Path,
        children: &mut Vec<PackageId>,
    ) {
        let Some(name) = self.dependency_name(ctx, parent, name, dir) else {
            return;
        };

        let dep = if let Some(cached) = ctx.cached(&name) {
            trace!(package = %name, "Reusing cached package");
            ctx.relink(cached, parent, dir)
        } else {
            let mut pkg = Package::new(name, dir);
            pkg.parent = Some(parent);
            let dep = ctx.alloc(pkg);
            // Recorded in the context with its reason; siblings carry on.
            let _ = self.resolve(ctx, dep);
            // Only a full resolution is authoritative for its name.
            if !ctx.package(dep).is_located_only() {
                ctx.cache_package(dep);
            }
            dep
        };

        let pkg = ctx.package(dep);
        match pkg.kind {
            PackageKind::Foreign => {}
            PackageKind::Internal => {
                let spliced = Rc::clone(&pkg.children);
                for child in spliced.iter() {
                    push_unique(ctx, children, *child);
                }
            }
            _ => push_unique(ctx, children, dep),
        }
    }

    /// Name under which an import is cached and shown.
    ///
    /// Relative imports are located first and go by their canonical path, so
    /// the same relative spelling from two directories stays two packages.
    /// Returns `None` for a relative import of the importer itself.
    fn dependency_name(
        &self,
        ctx: &ResolutionContext,
        parent: PackageId,
        name: &str,
        dir: &Path,
    ) -> Option<String> {
        if !is_relative_import(name) {
            return Some(name.to_string());
        }
        match self.source.resolve(name, dir, ImportMode::LocateOnly) {
            Ok(meta) => {
                if ctx.package(parent).canonical_path() == Some(meta.canonical_path.as_str()) {
                    return None;
                }
                trace!(
                    import = name,
                    package = %meta.canonical_path,
                    "Located relative import"
                );
                Some(meta.canonical_path)
            }
            // The full lookup fails the same way and records it.
            Err(_) => Some(name.to_string()),
        }
    }
}

fn push_unique(ctx: &ResolutionContext, children: &mut Vec<PackageId>, id: PackageId) {
    let name = ctx.package(id).name();
    if children.iter().any(|c| ctx.package(*c).name() == name) {
        return;
    }
    children.push(id);
}

fn rename_to_canonical(ctx: &mut ResolutionContext, id: PackageId) {
    let pkg = ctx.package_mut(id);
    if let Some(path) = pkg.canonical_path.clone() {
        pkg.name = path;
    }
}
