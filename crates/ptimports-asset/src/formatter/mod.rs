//! ptimports invocation construction and execution.
//!
//! The argument vector is the compatibility contract with ptimports and is
//! always built in this order:
//!
//! 1. the proxy marker `__ptimports` (self-proxy location only);
//! 2. `-l` to list or `-w` to write;
//! 3. `-s` unless simplification is skipped;
//! 4. `-r` unless refactoring is skipped;
//! 5. `--local <import path>/` when project imports are separated;
//! 6. the files, unmodified and in order.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use format_asset::{FormatEngine, Invocation, ProcessEngine, RunOutcome, proxy_marker};
use tracing::debug;

use crate::TYPE_NAME;
use crate::config::FormatterConfig;
use crate::error::FormatError;
use crate::packages::{GoListLoader, PackageLoader, resolve_import_path};

const FORMATTER_TARGET: &str = "ptimports_asset::formatter";

/// Whether ptimports reports or rewrites non-conforming files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the paths of non-conforming files without touching them.
    List,
    /// Rewrite files in place.
    Write,
}

impl Mode {
    /// Maps the host's list flag onto a mode.
    #[must_use]
    pub const fn from_list_flag(list: bool) -> Self {
        if list { Self::List } else { Self::Write }
    }

    /// Returns the ptimports flag for this mode.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::List => "-l",
            Self::Write => "-w",
        }
    }
}

/// Where the ptimports program lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolLocator {
    /// The running asset binary, selected through the `__ptimports` marker.
    #[default]
    SelfProxy,
    /// A separately installed ptimports executable. No marker is passed.
    Executable(PathBuf),
}

/// One formatting request from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    files: Vec<PathBuf>,
    mode: Mode,
    project_dir: PathBuf,
}

impl FormatRequest {
    /// Creates a request. An empty file list is allowed and still runs the
    /// formatter.
    #[must_use]
    pub fn new(files: Vec<PathBuf>, mode: Mode, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            files,
            mode,
            project_dir: project_dir.into(),
        }
    }

    /// Returns the target files.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Returns the mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the project directory used for import-path resolution.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

/// Builds and runs ptimports invocations for one configuration.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
///
/// use ptimports_asset::{FormatRequest, Formatter, FormatterConfig, GoListLoader, Mode, ToolLocator};
///
/// let formatter = Formatter::new(FormatterConfig::default().with_skip_simplify(true))
///     .with_locator(ToolLocator::Executable(PathBuf::from("/usr/bin/ptimports")));
/// let request = FormatRequest::new(vec![PathBuf::from("foo.go")], Mode::List, "/work");
/// let invocation = formatter.invocation(&request, &GoListLoader::new())?;
/// assert_eq!(invocation.to_string(), "[/usr/bin/ptimports -l -r foo.go]");
/// # Ok::<(), ptimports_asset::FormatError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatter {
    config: FormatterConfig,
    locator: ToolLocator,
}

impl Formatter {
    /// Creates a formatter that proxies through the running binary.
    #[must_use]
    pub const fn new(config: FormatterConfig) -> Self {
        Self {
            config,
            locator: ToolLocator::SelfProxy,
        }
    }

    /// Replaces the ptimports location.
    #[must_use]
    pub fn with_locator(mut self, locator: ToolLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Returns the ptimports location.
    #[must_use]
    pub const fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    /// Builds the ptimports invocation for `request`.
    ///
    /// The project import path is resolved through `loader` only when
    /// project imports are separated.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::CurrentExecutable`] if the self-proxy program
    /// cannot be located, or an import-path resolution error.
    pub fn invocation(
        &self,
        request: &FormatRequest,
        loader: &(impl PackageLoader + ?Sized),
    ) -> Result<Invocation, FormatError> {
        let mut invocation = match &self.locator {
            ToolLocator::SelfProxy => {
                let program =
                    std::env::current_exe().map_err(|source| FormatError::CurrentExecutable {
                        source: Arc::new(source),
                    })?;
                Invocation::new(program).arg(proxy_marker(TYPE_NAME))
            }
            ToolLocator::Executable(path) => Invocation::new(path),
        };

        invocation.push_arg(request.mode().flag());
        if !self.config.skip_simplify() {
            invocation.push_arg("-s");
        }
        if !self.config.skip_refactor() {
            invocation.push_arg("-r");
        }
        if self.config.separate_project_imports() {
            let import_path = resolve_import_path(loader, request.project_dir())?;
            invocation.push_arg("--local");
            invocation.push_arg(local_prefix(&import_path));
        }

        Ok(invocation.args(request.files().iter().map(OsString::from)))
    }

    /// Builds the invocation for `request` and runs it through `engine`,
    /// writing ptimports' combined output to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the invocation cannot be built or ptimports
    /// cannot be started. A non-zero ptimports exit is returned as
    /// [`RunOutcome::ReportedIssues`].
    pub fn format_with(
        &self,
        request: &FormatRequest,
        loader: &(impl PackageLoader + ?Sized),
        engine: &dyn FormatEngine,
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, FormatError> {
        let invocation = self.invocation(request, loader)?;
        debug!(
            target: FORMATTER_TARGET,
            command = %invocation,
            mode = ?request.mode(),
            file_count = request.files().len(),
            "running ptimports"
        );

        let outcome = engine.run(&invocation, sink)?;
        if let RunOutcome::ReportedIssues { code } = outcome {
            debug!(
                target: FORMATTER_TARGET,
                ?code,
                "ptimports exited non-zero; issues were reported on its output"
            );
        }
        Ok(outcome)
    }

    /// Formats `files` by running ptimports as a child process, resolving
    /// the project import path with `go list` when needed.
    ///
    /// # Errors
    ///
    /// See [`Formatter::format_with`].
    pub fn format(
        &self,
        files: &[PathBuf],
        list_only: bool,
        project_dir: &Path,
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, FormatError> {
        let request = FormatRequest::new(
            files.to_vec(),
            Mode::from_list_flag(list_only),
            project_dir,
        );
        self.format_with(
            &request,
            &GoListLoader::new(),
            &ProcessEngine::default(),
            sink,
        )
    }
}

/// ptimports matches `--local` as a prefix, so the trailing slash keeps
/// `example.com/foo` from also claiming `example.com/foobar`.
fn local_prefix(import_path: &str) -> String {
    format!("{import_path}/")
}
