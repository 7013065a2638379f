//! CLI command implementations.

mod output;

pub mod scan;
pub mod tree;

use std::path::Path;

use importgraph::ScanConfig;

/// Load the configuration named on the command line, or the one found in `dir`.
fn load_config(explicit: Option<&Path>, dir: &Path) -> importgraph::Result<ScanConfig> {
    match explicit {
        Some(path) => ScanConfig::load(path),
        None => ScanConfig::discover(dir),
    }
}
