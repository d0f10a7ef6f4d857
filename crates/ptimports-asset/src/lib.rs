//! ptimports format asset.
//!
//! Exposes the ptimports Go formatter to a host format plugin through the
//! [`format_asset`] command contract. The `format` command turns the host's
//! request and the YAML configuration block into a ptimports invocation:
//! list (`-l`) or write (`-w`) mode, simplification (`-s`), refactoring
//! (`-r`), and, when project imports are grouped separately, `--local` with
//! the project's import path as resolved by `go list`.
//!
//! The invocation runs the asset binary itself with the `__ptimports` proxy
//! marker, so ptimports is reached through the same executable whether the
//! host uses the in-process engine (the default) or `--engine process`. An
//! asset pointed at a separately installed ptimports spawns it directly.

mod config;
mod error;
mod formatter;
mod packages;
mod proxy;

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use format_asset::{
    AssetError, AssetRunner, FormatArgs, FormatAsset, FormatEngine, ProcessEngine, RunOutcome,
    ToolRegistry,
};

pub use self::config::FormatterConfig;
pub use self::error::{FormatError, LoadError};
pub use self::formatter::{FormatRequest, Formatter, Mode, ToolLocator};
pub use self::packages::{
    GoListLoader, ModuleMetadata, PackageLoader, PackageMetadata, parse_packages,
    resolve_import_path,
};
pub use self::proxy::{PTIMPORTS_BINARY_ENV, PtimportsHandler};

/// Formatter type name reported to the host and used as the proxy tool name.
pub const TYPE_NAME: &str = "ptimports";

/// Arguments injected into every `format` command.
const FIXED_FORMAT_ARGS: [&str; 1] = ["--refactor"];

/// The ptimports [`FormatAsset`].
#[derive(Debug, Clone, Default)]
pub struct PtimportsAsset<L = GoListLoader> {
    loader: L,
    locator: ToolLocator,
}

impl PtimportsAsset {
    /// Creates an asset that resolves import paths with `go list` and
    /// proxies ptimports through the running binary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: PackageLoader> PtimportsAsset<L> {
    /// Creates an asset that resolves import paths through `loader`.
    #[must_use]
    pub const fn with_loader(loader: L) -> Self {
        Self {
            loader,
            locator: ToolLocator::SelfProxy,
        }
    }

    /// Replaces the ptimports location.
    ///
    /// A [`ToolLocator::Executable`] is always run as a child process,
    /// whichever engine the host selects.
    #[must_use]
    pub fn with_locator(mut self, locator: ToolLocator) -> Self {
        self.locator = locator;
        self
    }

    fn formatter(&self, args: &FormatArgs) -> Result<Formatter, FormatError> {
        let config = FormatterConfig::from_yaml(&args.config)?;
        let skip_refactor = config.skip_refactor() || !args.refactor;
        Ok(Formatter::new(config.with_skip_refactor(skip_refactor))
            .with_locator(self.locator.clone()))
    }
}

impl<L: PackageLoader> FormatAsset for PtimportsAsset<L> {
    type Error = FormatError;

    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn verify_config(&self, config: &str) -> Result<(), FormatError> {
        FormatterConfig::from_yaml(config).map(|_| ())
    }

    fn format(
        &self,
        args: &FormatArgs,
        engine: &dyn FormatEngine,
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, FormatError> {
        let formatter = self.formatter(args)?;
        let request = FormatRequest::new(
            args.files.clone(),
            Mode::from_list_flag(args.list),
            args.project_dir.clone(),
        );
        match formatter.locator() {
            ToolLocator::SelfProxy => formatter.format_with(&request, &self.loader, engine, sink),
            // No proxy marker names a standalone executable.
            ToolLocator::Executable(_) => formatter.format_with(
                &request,
                &self.loader,
                &ProcessEngine::default(),
                sink,
            ),
        }
    }
}

/// Builds the registry of tools reachable through proxy markers.
///
/// # Errors
///
/// Returns [`AssetError::DuplicateTool`] if a tool name is registered twice.
pub fn tool_registry() -> Result<ToolRegistry, AssetError> {
    let mut registry = ToolRegistry::new();
    registry.register(TYPE_NAME, Box::new(PtimportsHandler::from_env()))?;
    Ok(registry)
}

/// Runs the asset command line `args` (including the binary name).
pub fn run<I>(args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
{
    let registry = match tool_registry() {
        Ok(registry) => registry,
        Err(error) => {
            writeln!(stderr, "{error}").ok();
            return ExitCode::FAILURE;
        }
    };

    AssetRunner::new(&PtimportsAsset::new(), &registry)
        .with_format_args(FIXED_FORMAT_ARGS)
        .run(args, stdout, stderr)
}
