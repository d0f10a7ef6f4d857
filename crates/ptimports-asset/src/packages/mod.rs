//! Project import-path resolution through a package metadata query.
//!
//! When project imports are grouped separately, ptimports needs the import
//! path of the project root so it can tell local imports from third-party
//! ones. The path comes from the Go toolchain's package metadata: `go list`
//! run inside the project directory, asking for the package at `.`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use format_asset::Invocation;
use serde::Deserialize;
use tracing::debug;

use crate::error::{FormatError, LoadError};

const PACKAGES_TARGET: &str = "ptimports_asset::packages";
const DEFAULT_GO_BINARY: &str = "go";
const GO_LIST_ARGS: [&str; 4] = ["list", "-e", "-json", "."];

/// Metadata the Go toolchain reports for one package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageMetadata {
    import_path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    dir: PathBuf,
    #[serde(default)]
    module: Option<ModuleMetadata>,
}

/// Module information attached to a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleMetadata {
    path: String,
}

impl PackageMetadata {
    /// Creates metadata for a package with the given import path.
    #[must_use]
    pub fn new(import_path: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            name: String::new(),
            dir: PathBuf::new(),
            module: None,
        }
    }

    /// Returns the package's import path.
    #[must_use]
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// Returns the package name, empty when the directory has no Go files.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the package directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the enclosing module, if any.
    #[must_use]
    pub fn module_path(&self) -> Option<&str> {
        self.module.as_ref().map(|module| module.path.as_str())
    }
}

/// Queries package metadata for a directory.
pub trait PackageLoader {
    /// Returns metadata for the package(s) located in `dir`, in the order
    /// the metadata source reports them.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the query cannot be run or fails.
    fn load(&self, dir: &Path) -> Result<Vec<PackageMetadata>, LoadError>;
}

/// Loads package metadata with `go list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoListLoader {
    binary: PathBuf,
}

impl Default for GoListLoader {
    fn default() -> Self {
        Self::with_binary(DEFAULT_GO_BINARY)
    }
}

impl GoListLoader {
    /// Creates a loader that runs `go` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader that runs the given `go` binary.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the `go` binary this loader runs.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl PackageLoader for GoListLoader {
    fn load(&self, dir: &Path) -> Result<Vec<PackageMetadata>, LoadError> {
        let invocation = Invocation::new(&self.binary).args(GO_LIST_ARGS);
        let command_line = invocation.to_string();
        let mut command: Command = invocation.to_command();
        command.current_dir(dir);

        debug!(
            target: PACKAGES_TARGET,
            command = %command_line,
            dir = %dir.display(),
            "loading package metadata"
        );

        let output = command.output().map_err(|source| LoadError::Spawn {
            command: command_line.clone(),
            source: Arc::new(source),
        })?;

        if !output.status.success() {
            return Err(LoadError::Failed {
                command: command_line,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        parse_packages(&output.stdout)
    }
}

/// Parses the concatenated JSON objects `go list -json` writes.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] if the stream holds anything other than
/// package objects.
pub fn parse_packages(stream: &[u8]) -> Result<Vec<PackageMetadata>, LoadError> {
    serde_json::Deserializer::from_slice(stream)
        .into_iter::<PackageMetadata>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Parse {
            source: Arc::new(source),
        })
}

/// Returns the import path of the package in `project_dir`.
///
/// Only the first package reported by `loader` is consulted; ties are not
/// broken beyond the order the metadata source returned.
///
/// # Errors
///
/// Returns [`FormatError::PackageLoad`] if the query fails and
/// [`FormatError::NoPackages`] if it reports nothing.
pub fn resolve_import_path(
    loader: &(impl PackageLoader + ?Sized),
    project_dir: &Path,
) -> Result<String, FormatError> {
    let packages = loader
        .load(project_dir)
        .map_err(|source| FormatError::PackageLoad {
            dir: project_dir.to_path_buf(),
            source,
        })?;

    let package_count = packages.len();
    let first = packages
        .into_iter()
        .next()
        .ok_or_else(|| FormatError::NoPackages {
            dir: project_dir.to_path_buf(),
        })?;

    debug!(
        target: PACKAGES_TARGET,
        dir = %project_dir.display(),
        import_path = first.import_path(),
        package = first.name(),
        package_dir = %first.dir().display(),
        module = first.module_path().unwrap_or_default(),
        package_count,
        "resolved project import path"
    );

    Ok(first.import_path)
}
