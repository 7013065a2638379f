//! Scan-scoped resolution state.
//!
//! A [`ResolutionContext`] owns every [`Package`] created during one scan in
//! an arena, plus the dependency cache, the seen-import set used by the cycle
//! guard, the unresolved set, and the ignore list. Create one per scan; a
//! context carried over from another scan would serve stale cache entries.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use tracing::trace;

use crate::ignore::IgnoreMatcher;
use crate::types::{Package, PackageId};

/// Cache, cycle tracking and package arena for one scan.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    packages: Vec<Package>,
    cache: HashMap<String, PackageId>,
    seen_imports: HashSet<String>,
    unresolved: BTreeMap<String, String>,
    ignore: IgnoreMatcher,
    include_tests: bool,
}

impl ResolutionContext {
    /// Create an empty context with no ignore patterns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `ignore` to filter workspace roots.
    #[must_use]
    pub fn with_ignore(mut self, ignore: IgnoreMatcher) -> Self {
        self.ignore = ignore;
        self
    }

    /// Also expand test imports.
    #[must_use]
    pub fn with_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    /// Whether test imports are expanded.
    #[must_use]
    pub fn include_tests(&self) -> bool {
        self.include_tests
    }

    /// Look up a package by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different context.
    #[must_use]
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    pub(crate) fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id.0]
    }

    /// Number of package appearances created so far, relinked copies included.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Add a package to the arena.
    pub(crate) fn alloc(&mut self, package: Package) -> PackageId {
        let id = PackageId(self.packages.len());
        self.packages.push(package);
        id
    }

    /// Create a new appearance of an already resolved package under `parent`.
    ///
    /// The copy shares the cached package's children; only its parent and source
    /// directory differ.
    pub(crate) fn relink(
        &mut self,
        cached: PackageId,
        parent: PackageId,
        source_dir: &Path,
    ) -> PackageId {
        let mut copy = self.package(cached).clone();
        copy.parent = Some(parent);
        copy.source_dir = source_dir.to_path_buf();
        self.alloc(copy)
    }

    /// Cached package for an import name, if one has been resolved.
    #[must_use]
    pub fn cached(&self, name: &str) -> Option<PackageId> {
        self.cache.get(name).copied()
    }

    /// Make `id` the authoritative package for its name.
    pub(crate) fn cache_package(&mut self, id: PackageId) {
        let name = self.package(id).name.clone();
        self.cache.insert(name, id);
    }

    /// Whether `name` was seen before in this context; marks it seen either way.
    pub fn has_seen_import(&mut self, name: &str) -> bool {
        !self.seen_imports.insert(name.to_string())
    }

    /// Record a name that failed to resolve. The first reason given is kept.
    pub(crate) fn mark_unresolved(&mut self, name: &str, reason: &str) {
        trace!(package = name, reason, "Marking package unresolved");
        self.unresolved
            .entry(name.to_string())
            .or_insert_with(|| reason.to_string());
    }

    /// Names that failed to resolve, sorted.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.unresolved.keys().map(String::as_str)
    }

    /// Names that failed to resolve with the lookup failure behind each, sorted by name.
    pub fn unresolved_reasons(&self) -> impl Iterator<Item = (&str, &str)> {
        self.unresolved
            .iter()
            .map(|(name, reason)| (name.as_str(), reason.as_str()))
    }

    /// Number of names that failed to resolve.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    /// Whether a canonical root name is excluded by the ignore list.
    #[must_use]
    pub fn should_ignore(&self, canonical_name: &str) -> bool {
        self.ignore.should_ignore(canonical_name)
    }

    /// Distance from the package's tree root, derived from the parent chain.
    #[must_use]
    pub fn depth(&self, id: PackageId) -> usize {
        let mut depth = 0;
        let mut current = self.package(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.package(parent).parent;
        }
        depth
    }

    /// Whether any ancestor of `id` (not `id` itself) is named `name`.
    #[must_use]
    pub fn is_ancestor(&self, id: PackageId, name: &str) -> bool {
        let mut current = self.package(id).parent;
        while let Some(parent) = current {
            let pkg = self.package(parent);
            if pkg.name == name {
                return true;
            }
            current = pkg.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(ctx: &mut ResolutionContext, names: &[&str]) -> Vec<PackageId> {
        let mut ids: Vec<PackageId> = Vec::new();
        for name in names {
            let mut pkg = Package::new(*name, "/src");
            pkg.parent = ids.last().copied();
            ids.push(ctx.alloc(pkg));
        }
        ids
    }

    #[test]
    fn has_seen_import_is_false_only_once() {
        let mut ctx = ResolutionContext::new();
        assert!(!ctx.has_seen_import("a"));
        assert!(ctx.has_seen_import("a"));
        assert!(ctx.has_seen_import("a"));
        assert!(!ctx.has_seen_import("b"));
    }

    #[test]
    fn depth_follows_parent_chain() {
        let mut ctx = ResolutionContext::new();
        let ids = chain(&mut ctx, &["root", "a", "b"]);

        assert_eq!(ctx.depth(ids[0]), 0);
        assert_eq!(ctx.depth(ids[1]), 1);
        assert_eq!(ctx.depth(ids[2]), 2);
    }

    #[test]
    fn ancestor_lookup_excludes_self() {
        let mut ctx = ResolutionContext::new();
        let ids = chain(&mut ctx, &["root", "a", "b"]);

        assert!(ctx.is_ancestor(ids[2], "a"));
        assert!(ctx.is_ancestor(ids[2], "root"));
        assert!(!ctx.is_ancestor(ids[2], "b"));
        assert!(!ctx.is_ancestor(ids[0], "root"));
    }

    #[test]
    fn relink_rebinds_parent_and_shares_children() {
        let mut ctx = ResolutionContext::new();
        let ids = chain(&mut ctx, &["root", "a", "b"]);
        let leaf = ctx.alloc(Package::new("leaf", "/src"));
        ctx.package_mut(ids[2]).children = std::rc::Rc::from(vec![leaf]);
        ctx.cache_package(ids[2]);

        let other_parent = ctx.alloc(Package::new("other", "/elsewhere"));
        let cached = ctx.cached("b").unwrap();
        let copy = ctx.relink(cached, other_parent, Path::new("/elsewhere"));

        assert_eq!(ctx.package(copy).parent(), Some(other_parent));
        assert_eq!(ctx.depth(copy), 1);
        assert_eq!(ctx.depth(ids[2]), 2);
        assert!(std::rc::Rc::ptr_eq(
            &ctx.package(copy).children,
            &ctx.package(ids[2]).children
        ));
    }

    #[test]
    fn unresolved_names_are_sorted() {
        let mut ctx = ResolutionContext::new();
        ctx.mark_unresolved("zeta", "not found");
        ctx.mark_unresolved("alpha", "no Go source files");
        ctx.mark_unresolved("zeta", "second failure");

        assert_eq!(ctx.unresolved().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
        assert_eq!(ctx.unresolved_count(), 2);
        assert_eq!(
            ctx.unresolved_reasons().collect::<Vec<_>>(),
            vec![("alpha", "no Go source files"), ("zeta", "not found")]
        );
    }
}
