//! Domain types for import graph resolution.
//!
//! - **Arena handles**: `PackageId` indexes a package inside its
//!   [`ResolutionContext`](crate::ResolutionContext)
//! - **Packages**: `Package` is one appearance of an import in a resolved tree
//! - **Export**: `PackageSummary` is the value attached to each graph node
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Parent link | Arena index, not a pointer | Reused subtrees never own their parents |
//! | Children | `Rc<[PackageId]>` | Frozen once set; relinked copies share the slice |
//! | depth | Computed on read | Walks the parent chain, never stored |
//! | Foreign import | Enum variant | No magic string checks past normalization |

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Import name that stands for "the package in the source directory".
///
/// Roots are resolved under this name and renamed to their canonical path once
/// the resolver has identified them.
pub const SELF_IMPORT: &str = ".";

/// Pseudo-import for foreign (cgo) code units.
pub const FOREIGN_IMPORT: &str = "C";

/// A strongly-typed index into a context's package arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub(crate) usize);

impl PackageId {
    /// Extract the raw arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Classification of a package after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Not resolved yet, or resolution failed
    Unresolved,
    /// Part of the toolchain's standard distribution; always a leaf
    Builtin,
    /// Implementation detail of its importer; flattened out of the graph
    Internal,
    /// Ordinary package that appears in the graph
    External,
    /// Foreign-function pseudo-import; dropped from the graph entirely
    Foreign,
}

impl PackageKind {
    /// Lowercase name, as used in exported node values.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Builtin => "builtin",
            Self::Internal => "internal",
            Self::External => "external",
            Self::Foreign => "foreign",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much work a [`PackageResolver`](crate::PackageResolver) should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Locate the package and read its imports
    #[default]
    Full,
    /// Locate the package only; imports are left empty.
    ///
    /// Used when a package is re-entered through its own ancestor chain.
    LocateOnly,
}

/// One appearance of a package in a resolved tree.
///
/// The same import may appear many times under different parents. The first
/// appearance is resolved; later ones are relinked copies that share its
/// children.
#[derive(Debug, Clone)]
pub struct Package {
    pub(crate) name: String,
    pub(crate) canonical_path: Option<String>,
    pub(crate) dir: Option<PathBuf>,
    pub(crate) source_dir: PathBuf,
    pub(crate) kind: PackageKind,
    pub(crate) resolved: bool,
    pub(crate) located_only: bool,
    pub(crate) parent: Option<PackageId>,
    pub(crate) children: Rc<[PackageId]>,
}

impl Package {
    /// A package that has been referenced but not resolved.
    pub(crate) fn new(name: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            canonical_path: None,
            dir: None,
            source_dir: source_dir.into(),
            kind: PackageKind::Unresolved,
            resolved: false,
            located_only: false,
            parent: None,
            children: Rc::from([]),
        }
    }

    /// Import identifier as written by the importer.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolver-assigned identifier, once resolved.
    #[must_use]
    pub fn canonical_path(&self) -> Option<&str> {
        self.canonical_path.as_deref()
    }

    /// Directory holding the package's sources, once located.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Directory the name was interpreted relative to.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Resolution outcome.
    #[must_use]
    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// Whether resolution succeeded.
    ///
    /// Foreign pseudo-imports count as resolved. Ignored workspace roots do not.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Whether this appearance was only located, as an import cycle re-entry.
    ///
    /// Its children are empty; the full resolution of the same name holds them.
    #[must_use]
    pub fn is_located_only(&self) -> bool {
        self.located_only
    }

    /// Whether this package is a standard package.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.kind == PackageKind::Builtin
    }

    /// Non-owning link to the importer, `None` for roots.
    #[must_use]
    pub fn parent(&self) -> Option<PackageId> {
        self.parent
    }

    /// Sorted, duplicate-free dependencies.
    #[must_use]
    pub fn children(&self) -> &[PackageId] {
        &self.children
    }

    /// Ordering used for dependency lists: builtins first, then by name.
    pub(crate) fn dependency_order(&self, other: &Self) -> Ordering {
        other
            .is_builtin()
            .cmp(&self.is_builtin())
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Value attached to every exported graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSummary {
    /// Import name as written
    pub name: String,
    /// Fully qualified import path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_path: Option<String>,
    /// Source directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Resolution outcome
    pub kind: PackageKind,
}

impl From<&Package> for PackageSummary {
    fn from(pkg: &Package) -> Self {
        Self {
            name: pkg.name.clone(),
            canonical_path: pkg.canonical_path.clone(),
            dir: pkg.dir.clone(),
            kind: pkg.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, kind: PackageKind) -> Package {
        let mut p = Package::new(name, "/src");
        p.kind = kind;
        p
    }

    #[test]
    fn builtins_sort_before_everything_else() {
        let mut list = vec![
            pkg("github.com/a/z", PackageKind::External),
            pkg("strings", PackageKind::Builtin),
            pkg("example.com/b", PackageKind::Unresolved),
            pkg("fmt", PackageKind::Builtin),
        ];
        list.sort_by(Package::dependency_order);

        let names: Vec<_> = list.iter().map(Package::name).collect();
        assert_eq!(
            names,
            vec!["fmt", "strings", "example.com/b", "github.com/a/z"]
        );
    }

    #[test]
    fn summary_omits_unknown_location() {
        let summary = PackageSummary::from(&pkg("example.com/missing", PackageKind::Unresolved));
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["name"], "example.com/missing");
        assert_eq!(json["kind"], "unresolved");
        assert!(json.get("canonical_path").is_none());
        assert!(json.get("dir").is_none());
    }
}
