//! Filesystem resolver for Go-layout source trees.
//!
//! Packages are located in this order:
//!
//! | Import | Location |
//! |--------|----------|
//! | `.`, `./x`, `../x` | Relative to the importing directory |
//! | standard | `$GOROOT/src/<name>` |
//! | module-local | Under the nearest `go.mod` whose `module` path prefixes the name |
//! | vendored | `vendor/<name>` in the importer's directory or any parent up to the module root |
//! | GOPATH | `<gopath>/src/<name>` |
//!
//! Without a configured GOROOT, a name whose first element has no `.` is
//! taken to be a standard package.

use std::cell::RefCell;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use super::go_parser::GoParser;
use super::{PackageClass, PackageMetadata, PackageResolver, clean_path, is_relative_import};
use crate::error::{Error, LookupError, Result};
use crate::types::ImportMode;

const GO_MOD: &str = "go.mod";
const VENDOR_DIR: &str = "vendor";
const GO_EXTENSION: &str = ".go";
const TEST_FILE_SUFFIX: &str = "_test.go";
const EXTERNAL_TEST_PACKAGE_SUFFIX: &str = "_test";

/// Locations of the Go toolchain and workspaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoEnv {
    /// Toolchain root; standard packages live under `src/`
    pub goroot: Option<PathBuf>,
    /// Workspace roots; packages live under `src/`
    pub gopath: Vec<PathBuf>,
}

impl GoEnv {
    /// Read `GOROOT` and `GOPATH` from the environment.
    ///
    /// `GOPATH` defaults to `$HOME/go` when unset.
    #[must_use]
    pub fn from_env() -> Self {
        let goroot = std::env::var_os("GOROOT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let gopath = match std::env::var_os("GOPATH").filter(|v| !v.is_empty()) {
            Some(value) => std::env::split_paths(&value).collect(),
            None => std::env::var_os("HOME")
                .map(|home| vec![PathBuf::from(home).join("go")])
                .unwrap_or_default(),
        };

        Self { goroot, gopath }
    }

    fn goroot_src(&self) -> Option<PathBuf> {
        self.goroot.as_ref().map(|root| root.join("src"))
    }
}

/// A module declared by a `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GoModule {
    root: PathBuf,
    path: String,
}

/// Resolves Go packages by reading source trees on disk.
pub struct GoSourceResolver {
    env: GoEnv,
    parser: RefCell<GoParser>,
}

impl std::fmt::Debug for GoSourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoSourceResolver")
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl GoSourceResolver {
    /// Create a resolver for the given toolchain locations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parser`] if the Go grammar cannot be loaded.
    pub fn new(env: GoEnv) -> Result<Self> {
        let parser = GoParser::new().map_err(Error::Parser)?;
        Ok(Self {
            env,
            parser: RefCell::new(parser),
        })
    }

    /// Toolchain locations in use.
    #[must_use]
    pub fn env(&self) -> &GoEnv {
        &self.env
    }

    fn locate(
        &self,
        name: &str,
        from_dir: &Path,
    ) -> std::result::Result<(PathBuf, String, PackageClass), LookupError> {
        let not_found = || LookupError::NotFound {
            name: name.to_string(),
            from_dir: from_dir.to_path_buf(),
        };

        if is_relative_import(name) {
            let dir = clean_path(&from_dir.join(name));
            if !dir.is_dir() {
                return Err(not_found());
            }
            let canonical = self
                .import_path_for(&dir)
                .ok_or_else(|| LookupError::UnknownImportPath { dir: dir.clone() })?;
            let class = if self.is_goroot_dir(&dir) {
                PackageClass::Builtin
            } else {
                PackageClass::for_path(&canonical)
            };
            return Ok((dir, canonical, class));
        }

        if !is_valid_import_path(name) {
            return Err(not_found());
        }

        if let Some(src) = self.env.goroot_src() {
            let dir = src.join(name);
            if dir.is_dir() {
                return Ok((dir, name.to_string(), PackageClass::Builtin));
            }
        }

        let module = find_module(from_dir);
        if let Some(module) = &module {
            if let Some(rest) = module_relative(name, &module.path) {
                let dir = module.root.join(rest);
                if dir.is_dir() {
                    return Ok((dir, name.to_string(), PackageClass::for_path(name)));
                }
            }
        }

        for ancestor in from_dir.ancestors() {
            let dir = ancestor.join(VENDOR_DIR).join(name);
            if dir.is_dir() {
                trace!(import = name, dir = %dir.display(), "Found vendored package");
                return Ok((dir, name.to_string(), PackageClass::for_path(name)));
            }
            if module.as_ref().is_some_and(|m| m.root == ancestor) {
                break;
            }
        }

        for gopath in &self.env.gopath {
            let dir = gopath.join("src").join(name);
            if dir.is_dir() {
                return Ok((dir, name.to_string(), PackageClass::for_path(name)));
            }
        }

        if self.env.goroot.is_none() && looks_standard(name) {
            return Ok((PathBuf::new(), name.to_string(), PackageClass::Builtin));
        }

        Err(not_found())
    }

    /// Import path of a directory, from GOROOT, the enclosing module, or GOPATH.
    fn import_path_for(&self, dir: &Path) -> Option<String> {
        if let Some(src) = self.env.goroot_src() {
            if let Ok(rel) = dir.strip_prefix(&src) {
                return slash_path(rel).filter(|p| !p.is_empty());
            }
        }

        if let Some(module) = find_module(dir) {
            let rel = dir.strip_prefix(&module.root).ok()?;
            let rel = slash_path(rel)?;
            return Some(if rel.is_empty() {
                module.path
            } else {
                format!("{}/{rel}", module.path)
            });
        }

        self.env.gopath.iter().find_map(|gopath| {
            let rel = dir.strip_prefix(gopath.join("src")).ok()?;
            slash_path(rel).filter(|p| !p.is_empty())
        })
    }

    fn is_goroot_dir(&self, dir: &Path) -> bool {
        self.env
            .goroot_src()
            .is_some_and(|src| dir.starts_with(src))
    }

    fn read_imports(
        &self,
        dir: &Path,
        meta: &mut PackageMetadata,
    ) -> std::result::Result<(), LookupError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| LookupError::Io { path, source }
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error(dir))? {
            let entry = entry.map_err(io_error(dir))?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(GO_EXTENSION)
                || file_name.starts_with('_')
                || file_name.starts_with('.')
                || !path.is_file()
            {
                continue;
            }
            files.push(path);
        }
        files.sort();

        let mut has_sources = false;
        let mut parser = self.parser.borrow_mut();
        for path in files {
            let content = fs::read_to_string(&path).map_err(io_error(&path))?;
            let header = parser
                .parse_header(&content)
                .ok_or_else(|| LookupError::Parse {
                    path: path.clone(),
                    message: "missing package clause".to_string(),
                })?;

            let is_test = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(TEST_FILE_SUFFIX));

            let target = if !is_test {
                has_sources = true;
                &mut meta.imports
            } else if header.package.ends_with(EXTERNAL_TEST_PACKAGE_SUFFIX) {
                &mut meta.xtest_imports
            } else {
                &mut meta.test_imports
            };
            target.extend(header.imports);
        }

        if !has_sources {
            return Err(LookupError::NoSourceFiles {
                dir: dir.to_path_buf(),
            });
        }

        for list in [
            &mut meta.imports,
            &mut meta.test_imports,
            &mut meta.xtest_imports,
        ] {
            list.sort();
            list.dedup();
        }
        Ok(())
    }
}

impl PackageResolver for GoSourceResolver {
    fn resolve(
        &self,
        name: &str,
        from_dir: &Path,
        mode: ImportMode,
    ) -> std::result::Result<PackageMetadata, LookupError> {
        let (dir, canonical_path, class) = self.locate(name, from_dir)?;
        let mut meta = PackageMetadata::new(canonical_path, dir, class);

        // Standard packages are leaves, so their sources are never read.
        if mode == ImportMode::LocateOnly || class == PackageClass::Builtin {
            return Ok(meta);
        }

        let dir = meta.dir.clone();
        self.read_imports(&dir, &mut meta)?;
        debug!(
            package = %meta.canonical_path,
            imports = meta.imports.len(),
            "Read package imports"
        );
        Ok(meta)
    }
}

/// Find the module enclosing `dir` by walking up to the nearest `go.mod`.
fn find_module(dir: &Path) -> Option<GoModule> {
    for ancestor in dir.ancestors() {
        let manifest = ancestor.join(GO_MOD);
        if !manifest.is_file() {
            continue;
        }
        let content = match fs::read_to_string(&manifest) {
            Ok(c) => c,
            Err(e) => {
                debug!(
                    path = %manifest.display(),
                    error = %e,
                    "Failed to read go.mod, skipping"
                );
                continue;
            }
        };
        match parse_module_path(&content) {
            Some(path) => {
                return Some(GoModule {
                    root: ancestor.to_path_buf(),
                    path,
                });
            }
            None => {
                debug!(path = %manifest.display(), "go.mod has no module directive");
            }
        }
    }
    None
}

/// Extract the `module` directive from a `go.mod` file.
fn parse_module_path(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!path.is_empty()).then(|| path.to_string())
    })
}

/// Path of `name` below the module root, if the module provides it.
fn module_relative<'a>(name: &'a str, module_path: &str) -> Option<&'a str> {
    if name == module_path {
        return Some("");
    }
    name.strip_prefix(module_path)?.strip_prefix('/')
}

/// Join path components with `/`, failing on non-UTF-8 components.
fn slash_path(rel: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

fn is_valid_import_path(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && name.split('/').all(|e| !e.is_empty() && e != "." && e != "..")
}

/// Standard package names never have a dot in their first element.
fn looks_standard(name: &str) -> bool {
    name.split('/').next().is_some_and(|first| !first.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Module `example.com/app` with a command, a library and an internal helper.
    fn module_fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "go.mod", "module example.com/app // app\n\ngo 1.22\n");
        write(
            root,
            "main.go",
            "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/lib\"\n)\n",
        );
        write(
            root,
            "lib/lib.go",
            "package lib\n\nimport (\n\t\"strings\"\n\t\"example.com/app/internal/helper\"\n\t\"strings\"\n)\n",
        );
        write(
            root,
            "lib/lib_test.go",
            "package lib\n\nimport \"testing\"\n",
        );
        write(
            root,
            "lib/ext_test.go",
            "package lib_test\n\nimport \"example.com/app/lib\"\n",
        );
        write(root, "lib/_scratch.go", "this is not go");
        write(
            root,
            "internal/helper/helper.go",
            "package helper\n\nimport \"github.com/vendored/dep\"\n",
        );
        write(
            root,
            "vendor/github.com/vendored/dep/dep.go",
            "package dep\n",
        );
        write(root, "docs/README.md", "# docs\n");
        dir
    }

    fn resolver() -> GoSourceResolver {
        GoSourceResolver::new(GoEnv::default()).unwrap()
    }

    #[rstest]
    #[case::plain("module example.com/app", Some("example.com/app"))]
    #[case::quoted("module \"example.com/app\"", Some("example.com/app"))]
    #[case::commented("module example.com/app // main module", Some("example.com/app"))]
    #[case::prefix_word("modules example.com/app", None)]
    #[case::missing("go 1.22", None)]
    fn parses_module_directive(#[case] content: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_module_path(content).as_deref(), expected);
    }

    #[test]
    fn resolves_self_import_to_module_path() {
        let dir = module_fixture();
        let meta = resolver()
            .resolve(".", dir.path(), ImportMode::Full)
            .unwrap();

        assert_eq!(meta.canonical_path, "example.com/app");
        assert_eq!(meta.class, PackageClass::External);
        assert_eq!(meta.imports, vec!["example.com/app/lib", "fmt"]);
    }

    #[test]
    fn reads_sorted_unique_imports_and_test_imports() {
        let dir = module_fixture();
        let meta = resolver()
            .resolve("example.com/app/lib", dir.path(), ImportMode::Full)
            .unwrap();

        assert_eq!(meta.imports, vec!["example.com/app/internal/helper", "strings"]);
        assert_eq!(meta.test_imports, vec!["testing"]);
        assert_eq!(meta.xtest_imports, vec!["example.com/app/lib"]);
    }

    #[test]
    fn classifies_internal_packages() {
        let dir = module_fixture();
        let meta = resolver()
            .resolve(
                "example.com/app/internal/helper",
                &dir.path().join("lib"),
                ImportMode::Full,
            )
            .unwrap();

        assert_eq!(meta.class, PackageClass::Internal);
    }

    #[test]
    fn finds_vendored_package_from_nested_importer() {
        let dir = module_fixture();
        let helper_dir = dir.path().join("internal/helper");
        let meta = resolver()
            .resolve("github.com/vendored/dep", &helper_dir, ImportMode::Full)
            .unwrap();

        assert_eq!(meta.canonical_path, "github.com/vendored/dep");
        assert!(meta.dir.ends_with("vendor/github.com/vendored/dep"));
        assert!(meta.imports.is_empty());
    }

    #[test]
    fn standard_names_are_builtin_without_goroot() {
        let dir = module_fixture();
        let meta = resolver()
            .resolve("net/http", dir.path(), ImportMode::Full)
            .unwrap();

        assert_eq!(meta.class, PackageClass::Builtin);
    }

    #[test]
    fn goroot_packages_are_builtin() {
        let goroot = tempfile::tempdir().unwrap();
        write(goroot.path(), "src/strings/strings.go", "package strings\n");
        let dir = module_fixture();

        let resolver = GoSourceResolver::new(GoEnv {
            goroot: Some(goroot.path().to_path_buf()),
            gopath: Vec::new(),
        })
        .unwrap();

        let meta = resolver
            .resolve("strings", dir.path(), ImportMode::Full)
            .unwrap();
        assert_eq!(meta.class, PackageClass::Builtin);
        assert!(meta.dir.ends_with("src/strings"));

        // With a GOROOT configured, the name heuristic no longer applies.
        let err = resolver
            .resolve("notstd", dir.path(), ImportMode::Full)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn gopath_packages_resolve_by_path() {
        let gopath = tempfile::tempdir().unwrap();
        write(
            gopath.path(),
            "src/github.com/user/tool/tool.go",
            "package tool\n\nimport \"os\"\n",
        );

        let resolver = GoSourceResolver::new(GoEnv {
            goroot: None,
            gopath: vec![gopath.path().to_path_buf()],
        })
        .unwrap();

        let meta = resolver
            .resolve(".", &gopath.path().join("src/github.com/user/tool"), ImportMode::Full)
            .unwrap();
        assert_eq!(meta.canonical_path, "github.com/user/tool");
        assert_eq!(meta.imports, vec!["os"]);
    }

    #[test]
    fn locate_only_skips_parsing() {
        let dir = module_fixture();
        write(dir.path(), "broken/broken.go", "no package clause here");

        let meta = resolver()
            .resolve("example.com/app/broken", dir.path(), ImportMode::LocateOnly)
            .unwrap();
        assert_eq!(meta.canonical_path, "example.com/app/broken");
        assert!(meta.imports.is_empty());

        let err = resolver()
            .resolve("example.com/app/broken", dir.path(), ImportMode::Full)
            .unwrap_err();
        assert!(matches!(err, LookupError::Parse { .. }));
    }

    #[test]
    fn directory_without_sources_is_rejected() {
        let dir = module_fixture();
        let err = resolver()
            .resolve("./docs", dir.path(), ImportMode::Full)
            .unwrap_err();

        assert!(matches!(err, LookupError::NoSourceFiles { .. }));
    }

    #[test]
    fn unknown_remote_package_is_not_found() {
        let dir = module_fixture();
        let err = resolver()
            .resolve("github.com/nobody/nothing", dir.path(), ImportMode::Full)
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn relative_dir_outside_any_module_has_no_import_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "loose/loose.go", "package loose\n");

        let err = resolver()
            .resolve("./loose", dir.path(), ImportMode::Full)
            .unwrap_err();
        assert!(matches!(err, LookupError::UnknownImportPath { .. }));
    }
}
