//! # Importgraph: Go Import Graph Resolver
//!
//! Importgraph resolves the transitive imports of Go packages into a tree,
//! flattens that tree into a deduplicated directed graph, and renders the
//! graph as JSON, Graphviz DOT, or a sorted list of package names.
//!
//! ## Design
//!
//! - **Source agnostic** - resolution works on [`PackageMetadata`] from any
//!   [`PackageResolver`]; [`GoSourceResolver`] reads trees from disk
//! - **Partial results** - a dependency that fails to resolve becomes an
//!   unresolved leaf; only a failing root aborts a scan
//! - **Cycle safe** - packages re-entered through their own ancestors are
//!   located without expanding their imports again
//!
//! ## Quick Start
//!
//! ```no_run
//! use importgraph::{GoEnv, GoSourceResolver, ScanOptions, export, resolve_tree};
//! use std::path::Path;
//!
//! let resolver = GoSourceResolver::new(GoEnv::from_env())?;
//! let scan = resolve_tree(&resolver, ".", Path::new("/path/to/pkg"), &ScanOptions::default())?;
//!
//! println!("{}", export::to_dot(&scan.graph()));
//! for name in scan.unresolved() {
//!     eprintln!("unresolved: {name}");
//! }
//! # Ok::<(), importgraph::Error>(())
//! ```

pub mod config;
mod context;
mod discovery;
mod error;
pub mod export;
mod graph;
mod ignore;
mod resolver;
mod scan;
mod source;
mod types;

pub use config::{CONFIG_FILE_NAME, ScanConfig};
pub use context::ResolutionContext;
pub use discovery::{DEFAULT_SKIP_DIRS, RootDiscovery};
pub use error::{Error, LookupError, Result};
pub use export::Format;
pub use graph::{Graph, Node};
pub use ignore::IgnoreMatcher;
pub use resolver::{DependencyResolver, ImportName, normalize_import};
pub use scan::{Scan, ScanOptions, resolve_tree, scan_workspace};
pub use source::{
    GoEnv, GoSourceResolver, MemoryResolver, PackageClass, PackageMetadata, PackageResolver,
    is_internal_path, is_relative_import,
};
pub use types::{
    FOREIGN_IMPORT, ImportMode, Package, PackageId, PackageKind, PackageSummary, SELF_IMPORT,
};
