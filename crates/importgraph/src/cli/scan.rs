//! `importgraph scan` command implementation.

use std::path::Path;
use std::process::ExitCode;

use importgraph::{Format, GoSourceResolver, IgnoreMatcher, ScanOptions, scan_workspace};
use tracing::debug;

use super::{load_config, output};

/// Run the scan command.
pub fn run(
    config: Option<&Path>,
    root: &Path,
    ignored_pkgs: Option<&str>,
    tests: bool,
    format: Format,
) -> importgraph::Result<ExitCode> {
    let config = load_config(config, root)?;
    let resolver = GoSourceResolver::new(config.go_env())?;
    debug!(env = ?resolver.env(), "Using Go environment");

    let mut options = ScanOptions::from(&config);
    options.include_tests |= tests;
    if let Some(list) = ignored_pkgs {
        options.ignore.extend(IgnoreMatcher::from_comma_list(list));
    }

    let scan = scan_workspace(&resolver, root, &options)?;
    output::report(&scan, format)
}
