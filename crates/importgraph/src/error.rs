//! Error types for importgraph operations.
//!
//! Errors are split along the same line as the scan's failure policy:
//!
//! - **`Error`**: fatal failures that abort a scan (root package cannot be
//!   resolved, the directory walk fails, configuration is invalid)
//! - **`LookupError`**: a single import could not be located or parsed. These
//!   are recorded in the scan's unresolved set and the branch ends there.
//!
//! ## Error Philosophy
//!
//! Resolution is best effort:
//! - One broken import shouldn't prevent resolving its siblings
//! - Unresolved names are collected and reported, not thrown
//! - Only the root package and filesystem discovery cause early termination

use std::path::PathBuf;
use thiserror::Error;

/// Result type for importgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for importgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The designated root package could not be resolved
    #[error("unable to resolve root package `{name}` in {}", dir.display())]
    RootUnresolved {
        /// Import name of the root as given
        name: String,
        /// Directory the root was resolved from
        dir: PathBuf,
        /// Why the resolver rejected it
        #[source]
        source: LookupError,
    },

    /// Walking the workspace for candidate roots failed
    #[error("failed to walk {}", path.display())]
    Discovery {
        /// Directory that could not be read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source parser infrastructure failed
    #[error("parser error: {0}")]
    Parser(String),

    /// Graph serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("invalid configuration file {}: {source}", path.display())]
    Yaml {
        /// Path of the configuration file
        path: PathBuf,
        /// Parser failure
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure to look up a single package.
///
/// Returned by [`PackageResolver`](crate::PackageResolver) implementations.
/// The dependency resolver records these and keeps going.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No directory provides the import
    #[error("cannot find package `{name}` from {}", from_dir.display())]
    NotFound {
        /// Import name that was looked up
        name: String,
        /// Directory the lookup was relative to
        from_dir: PathBuf,
    },

    /// The package directory exists but holds no buildable source files
    #[error("no source files in {}", dir.display())]
    NoSourceFiles {
        /// Package directory
        dir: PathBuf,
    },

    /// The directory lies outside every module and GOPATH, so it has no import path
    #[error("cannot determine import path for {}", dir.display())]
    UnknownImportPath {
        /// Package directory
        dir: PathBuf,
    },

    /// A source file could not be parsed
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Reading the package directory or one of its files failed
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },
}

impl LookupError {
    /// Returns `true` if the package simply does not exist.
    ///
    /// Everything else means the package was found but could not be read.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnknownImportPath { .. })
    }
}
