//! Scan entry points.
//!
//! - [`resolve_tree`]: one root package and everything it imports
//! - [`scan_workspace`]: every source directory under a root, resolved with
//!   one shared context so common dependencies are resolved once
//!
//! Each call builds a fresh [`ResolutionContext`].

use std::path::Path;

use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::context::ResolutionContext;
use crate::discovery::RootDiscovery;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::ignore::IgnoreMatcher;
use crate::resolver::DependencyResolver;
use crate::source::PackageResolver;
use crate::types::{ImportMode, Package, PackageId, PackageKind, SELF_IMPORT};

/// Knobs for a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Workspace roots to leave out
    pub ignore: IgnoreMatcher,
    /// Expand test imports as well
    pub include_tests: bool,
    /// How candidate roots are found
    pub discovery: RootDiscovery,
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            ignore: config.ignore_matcher(),
            include_tests: config.include_tests,
            discovery: RootDiscovery::new().with_skip_dirs(config.skip_dirs.iter().cloned()),
        }
    }
}

/// Result of a scan: the resolved forest and its context.
#[derive(Debug)]
pub struct Scan {
    context: ResolutionContext,
    roots: Vec<PackageId>,
}

impl Scan {
    /// Context holding every package of the scan.
    #[must_use]
    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// Root packages, in discovery order.
    #[must_use]
    pub fn roots(&self) -> &[PackageId] {
        &self.roots
    }

    /// Root packages as values.
    pub fn root_packages(&self) -> impl Iterator<Item = &Package> {
        self.roots.iter().map(|id| self.context.package(*id))
    }

    /// Flatten the scan into a graph.
    #[must_use]
    pub fn graph(&self) -> Graph {
        Graph::build(&self.context, &self.roots)
    }

    /// Names that failed to resolve, sorted.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.context.unresolved()
    }

    /// Names that failed to resolve with the lookup failure behind each.
    pub fn unresolved_reasons(&self) -> impl Iterator<Item = (&str, &str)> {
        self.context.unresolved_reasons()
    }

    /// Whether every import resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.context.unresolved_count() == 0
    }
}

/// Resolve `name` (as imported from `dir`) and its transitive imports.
///
/// # Errors
///
/// Returns [`Error::RootUnresolved`] if `name` itself cannot be resolved.
pub fn resolve_tree<R: PackageResolver>(
    source: R,
    name: &str,
    dir: &Path,
    options: &ScanOptions,
) -> Result<Scan> {
    let mut context = ResolutionContext::new().with_tests(options.include_tests);
    let deps = DependencyResolver::new(source);

    let root = deps.resolve_root(&mut context, name, dir)?;
    info!(
        root = %context.package(root).name(),
        packages = context.package_count(),
        unresolved = context.unresolved_count(),
        "Resolved dependency tree"
    );

    Ok(Scan {
        context,
        roots: vec![root],
    })
}

/// Resolve every source directory under `root` as its own root package.
///
/// The first root is an umbrella package named `.` standing for the whole
/// workspace. Directories that fail to resolve or match the ignore list are
/// left out without counting as failures.
///
/// # Errors
///
/// Returns [`Error::Discovery`] if the walk fails and
/// [`Error::RootUnresolved`] if `root` has no import path.
pub fn scan_workspace<R: PackageResolver>(
    source: R,
    root: &Path,
    options: &ScanOptions,
) -> Result<Scan> {
    let root = root.canonicalize().map_err(|source| Error::Discovery {
        path: root.to_path_buf(),
        source,
    })?;

    let mut context = ResolutionContext::new()
        .with_ignore(options.ignore.clone())
        .with_tests(options.include_tests);
    let deps = DependencyResolver::new(source);

    let located = deps
        .source()
        .resolve(SELF_IMPORT, &root, ImportMode::LocateOnly)
        .map_err(|source| Error::RootUnresolved {
            name: SELF_IMPORT.to_string(),
            dir: root.clone(),
            source,
        })?;

    let mut umbrella = Package::new(SELF_IMPORT, &root);
    umbrella.canonical_path = Some(located.canonical_path);
    umbrella.dir = Some(located.dir);
    umbrella.kind = PackageKind::External;
    umbrella.resolved = true;
    let mut roots = vec![context.alloc(umbrella)];

    for dir in options.discovery.walk(&root)? {
        let id = deps.resolve_package(&mut context, SELF_IMPORT, &dir);
        let pkg = context.package(id);
        if pkg.is_resolved() {
            roots.push(id);
        } else {
            debug!(
                dir = %dir.display(),
                canonical_path = pkg.canonical_path().unwrap_or_default(),
                "Leaving directory out of workspace roots"
            );
        }
    }

    info!(
        root = %root.display(),
        roots = roots.len() - 1,
        packages = context.package_count(),
        unresolved = context.unresolved_count(),
        "Scanned workspace"
    );

    Ok(Scan { context, roots })
}
