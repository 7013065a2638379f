//! Discovery of candidate root directories for workspace scans.
//!
//! Walks a tree in lexical order and yields every directory holding at least
//! one `*.go` file. Skipped, along with everything below them:
//!
//! - vendored and fixture directories (`vendor`, `Godeps`, `node_modules`,
//!   `testdata`, `internal`) plus any configured extras
//! - hidden directories and directories starting with `_`
//! - test-only directories (names ending in `_test`)
//!
//! Symlinked directories are not followed.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Directory names never scanned for roots.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    "vendor",
    "Godeps",
    "node_modules",
    "testdata",
    "internal",
];

/// Finds directories that can be resolved as workspace roots.
#[derive(Debug, Clone)]
pub struct RootDiscovery {
    skip_dirs: Vec<String>,
}

impl Default for RootDiscovery {
    fn default() -> Self {
        Self {
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl RootDiscovery {
    /// Discovery with the default skip list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also skip directories with these names.
    #[must_use]
    pub fn with_skip_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Directories under `root` (inclusive) that contain Go sources.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if any directory in the walk cannot be read.
    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        self.walk_dir(root, &mut found)?;
        debug!(
            root = %root.display(),
            directories = found.len(),
            "Discovered source directories"
        );
        Ok(found)
    }

    fn walk_dir(&self, dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
        let discovery_error = |source| Error::Discovery {
            path: dir.to_path_buf(),
            source,
        };

        let mut subdirs = Vec::new();
        let mut has_sources = false;
        for entry in fs::read_dir(dir).map_err(discovery_error)? {
            let entry = entry.map_err(discovery_error)?;
            let file_type = entry.file_type().map_err(discovery_error)?;
            let path = entry.path();

            if file_type.is_dir() {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    trace!(path = %path.display(), "Skipping non-UTF-8 directory name");
                    continue;
                };
                if self.is_skipped(name) {
                    trace!(path = %path.display(), "Skipping directory");
                    continue;
                }
                subdirs.push(path);
            } else if file_type.is_file() && path.extension().is_some_and(|ext| ext == "go") {
                has_sources = true;
            }
        }

        if has_sources {
            found.push(dir.to_path_buf());
        }

        subdirs.sort();
        for subdir in subdirs {
            self.walk_dir(&subdir, found)?;
        }
        Ok(())
    }

    fn is_skipped(&self, name: &str) -> bool {
        name.starts_with('.')
            || name.starts_with('_')
            || name.ends_with("_test")
            || self.skip_dirs.iter().any(|skip| skip == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    #[rstest]
    #[case::vendor("vendor", true)]
    #[case::godeps("Godeps", true)]
    #[case::node_modules("node_modules", true)]
    #[case::testdata("testdata", true)]
    #[case::internal("internal", true)]
    #[case::hidden(".git", true)]
    #[case::underscore("_attic", true)]
    #[case::test_dir("integration_test", true)]
    #[case::regular("cmd", false)]
    #[case::contains_test("tester", false)]
    fn skip_rules(#[case] name: &str, #[case] skipped: bool) {
        assert_eq!(RootDiscovery::new().is_skipped(name), skipped);
    }

    #[test]
    fn yields_source_directories_in_lexical_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "main.go");
        touch(root, "pkg/b/b.go");
        touch(root, "pkg/a/a.go");
        touch(root, "pkg/a/internal/x/x.go");
        touch(root, "vendor/github.com/dep/dep.go");
        touch(root, ".hidden/h.go");
        touch(root, "e2e_test/t.go");
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/notes.md"), "notes").unwrap();

        let found = RootDiscovery::new().walk(root).unwrap();

        assert_eq!(
            found,
            vec![
                root.to_path_buf(),
                root.join("pkg/a"),
                root.join("pkg/b"),
            ]
        );
    }

    #[test]
    fn configured_skip_dirs_are_honored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "tools/gen/gen.go");
        touch(dir.path(), "lib/lib.go");

        let found = RootDiscovery::new()
            .with_skip_dirs(["tools"])
            .walk(dir.path())
            .unwrap();

        assert_eq!(found, vec![dir.path().join("lib")]);
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RootDiscovery::new()
            .walk(&dir.path().join("absent"))
            .unwrap_err();

        assert!(matches!(err, Error::Discovery { .. }));
    }
}
