//! `importgraph tree` command implementation.

use std::path::Path;
use std::process::ExitCode;

use importgraph::{Format, GoSourceResolver, ScanOptions, resolve_tree};
use tracing::debug;

use super::{load_config, output};

/// Run the tree command.
pub fn run(
    config: Option<&Path>,
    package: &str,
    dir: &Path,
    tests: bool,
    format: Format,
) -> importgraph::Result<ExitCode> {
    let config = load_config(config, dir)?;
    let resolver = GoSourceResolver::new(config.go_env())?;
    debug!(env = ?resolver.env(), "Using Go environment");

    let mut options = ScanOptions::from(&config);
    options.include_tests |= tests;

    let scan = resolve_tree(&resolver, package, dir, &options)?;
    output::report(&scan, format)
}
