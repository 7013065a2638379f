//! Scan configuration.
//!
//! Settings come from an optional `.importgraph.yaml` at the scan root (or a
//! file named with `--config`), with command-line flags merged on top:
//!
//! ```yaml
//! ignored-packages:
//!   - example.com/app/tools*
//! skip-dirs:
//!   - scripts
//! include-tests: false
//! goroot: /usr/local/go
//! gopath:
//!   - /home/me/go
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ignore::IgnoreMatcher;
use crate::source::GoEnv;

/// Name of the configuration file looked up at the scan root.
pub const CONFIG_FILE_NAME: &str = ".importgraph.yaml";

/// Settings for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Canonical names or `prefix*` patterns excluded as workspace roots
    pub ignored_packages: Vec<String>,

    /// Extra directory names skipped during root discovery
    pub skip_dirs: Vec<String>,

    /// Expand test imports as well
    pub include_tests: bool,

    /// Go toolchain root; falls back to `GOROOT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goroot: Option<PathBuf>,

    /// Go workspaces; falls back to `GOPATH`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gopath: Vec<PathBuf>,
}

impl ScanConfig {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, [`Error::Yaml`] if
    /// it does not parse and [`Error::Config`] if a value is out of range.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the schema alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a `skip-dirs` entry is not a plain
    /// directory name.
    pub fn validate(&self) -> Result<()> {
        for name in &self.skip_dirs {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(Error::Config(format!(
                    "skip-dirs entry `{name}` must be a single directory name"
                )));
            }
        }
        Ok(())
    }

    /// Load `.importgraph.yaml` from `root`, or defaults if there is none.
    ///
    /// # Errors
    ///
    /// Same as [`ScanConfig::load`] when the file exists.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            debug!(root = %root.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        debug!(path = %path.display(), "Loading configuration");
        Self::load(&path)
    }

    /// Ignore matcher built from `ignored_packages`.
    #[must_use]
    pub fn ignore_matcher(&self) -> IgnoreMatcher {
        IgnoreMatcher::new(&self.ignored_packages)
    }

    /// Toolchain locations: configured values first, the environment for the rest.
    #[must_use]
    pub fn go_env(&self) -> GoEnv {
        let from_env = GoEnv::from_env();
        GoEnv {
            goroot: self.goroot.clone().or(from_env.goroot),
            gopath: if self.gopath.is_empty() {
                from_env.gopath
            } else {
                self.gopath.clone()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let yaml = r"
ignored-packages:
  - example.com/app/tools*
  - example.com/app/gen
skip-dirs: [scripts]
include-tests: true
goroot: /usr/local/go
gopath:
  - /home/me/go
";
        let config: ScanConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.ignored_packages.len(), 2);
        assert_eq!(config.skip_dirs, vec!["scripts"]);
        assert!(config.include_tests);
        assert_eq!(config.goroot, Some(PathBuf::from("/usr/local/go")));
        assert_eq!(config.go_env().gopath, vec![PathBuf::from("/home/me/go")]);

        let matcher = config.ignore_matcher();
        assert!(matcher.should_ignore("example.com/app/toolshed"));
        assert!(matcher.should_ignore("example.com/app/gen"));
        assert!(!matcher.should_ignore("example.com/app"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ScanConfig = serde_yaml::from_str("include-tests: true\n").unwrap();
        assert!(config.ignored_packages.is_empty());
        assert!(config.include_tests);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "ignore: [a]\n").unwrap();

        let err = ScanConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Yaml { .. }));
    }

    #[test]
    fn skip_dirs_must_be_plain_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "skip-dirs: [tools/gen]\n").unwrap();

        let err = ScanConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ScanConfig::discover(dir.path()).unwrap(), ScanConfig::default());

        fs::write(dir.path().join(CONFIG_FILE_NAME), "skip-dirs: [tools]\n").unwrap();
        let config = ScanConfig::discover(dir.path()).unwrap();
        assert_eq!(config.skip_dirs, vec!["tools"]);
    }
}
