//! Host-facing command surface of a format asset.
//!
//! The host format plugin drives every asset through the same commands:
//! `type-name` prints the formatter's name, `verify-config` validates a
//! configuration block, and `format` formats (or, with `--list`, lists) a set
//! of files. Before any parsing happens, a first argument carrying a proxy
//! marker is routed to the [`ToolRegistry`] instead.
//!
//! Exit contract: `format --list` fails when the formatter printed anything
//! or exited non-zero, because both mean non-conforming files were found.
//! `format` without `--list` succeeds whenever the formatter could be started.
//! Errors are written to stderr as a single line.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::engine::{EngineKind, FormatEngine, InProcessEngine, ProcessEngine};
use crate::invocation::RunOutcome;
use crate::registry::ToolRegistry;

const COMMAND_TARGET: &str = "format_asset::command";
const FORMAT_SUBCOMMAND: &str = "format";

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

/// Arguments of the `format` command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatArgs {
    /// Lists non-conforming files instead of rewriting them.
    #[arg(long, short = 'l')]
    pub list: bool,
    /// Root directory of the project being formatted.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,
    /// Formatter configuration block (YAML).
    #[arg(long, value_name = "YAML", default_value = "")]
    pub config: String,
    /// Enables the formatter's refactoring rewrites.
    #[arg(long)]
    pub refactor: bool,
    /// Selects how the formatter tool is executed.
    #[arg(long, value_enum, default_value_t = EngineKind::InProcess)]
    pub engine: EngineKind,
    /// Files to format, in order.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Command-line interface spoken by the host format plugin.
#[derive(Parser, Debug)]
#[command(name = "format-asset", disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: AssetCommand,
}

#[derive(Subcommand, Debug)]
enum AssetCommand {
    /// Prints the formatter type name.
    TypeName,
    /// Validates a formatter configuration block.
    VerifyConfig {
        /// Formatter configuration block (YAML).
        #[arg(long, value_name = "YAML", default_value = "")]
        config: String,
    },
    /// Formats, or lists, the given files.
    #[command(args_override_self = true)]
    Format(FormatArgs),
}

/// A formatter exposed to the host through [`AssetRunner`].
pub trait FormatAsset {
    /// Error raised by configuration checks and formatting runs.
    type Error: std::error::Error;

    /// Returns the formatter's type name.
    fn type_name(&self) -> &str;

    /// Validates a configuration block.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the configuration is invalid.
    fn verify_config(&self, config: &str) -> Result<(), Self::Error>;

    /// Formats the files named in `args` through `engine`, writing all
    /// formatter output to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the formatter could not be started or its
    /// invocation could not be built.
    fn format(
        &self,
        args: &FormatArgs,
        engine: &dyn FormatEngine,
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, Self::Error>;
}

/// Parses asset command lines and dispatches them to a [`FormatAsset`].
#[derive(Debug)]
pub struct AssetRunner<'a, A> {
    asset: &'a A,
    registry: &'a ToolRegistry,
    format_args: Vec<OsString>,
}

impl<'a, A: FormatAsset> AssetRunner<'a, A> {
    /// Creates a runner for `asset` whose proxy markers resolve against
    /// `registry`.
    #[must_use]
    pub const fn new(asset: &'a A, registry: &'a ToolRegistry) -> Self {
        Self {
            asset,
            registry,
            format_args: Vec::new(),
        }
    }

    /// Adds arguments that are always passed to the `format` command, ahead
    /// of the arguments supplied by the host.
    #[must_use]
    pub fn with_format_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.format_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs one command line (including the binary name) and returns the
    /// process exit code.
    pub fn run<I>(&self, args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        ExitCode::from(self.run_status(args, stdout, stderr))
    }

    pub(crate) fn run_status<I>(
        &self,
        args: I,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> u8
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();

        if let Some(result) = self
            .registry
            .dispatch(args.get(1..).unwrap_or_default(), stdout)
        {
            return match result {
                Ok(outcome) => exit_status(outcome.exit_code()),
                Err(error) => report(stderr, &error),
            };
        }

        let cli = match Cli::try_parse_from(self.splice_format_args(args)) {
            Ok(cli) => cli,
            Err(error) => return usage(&error, stdout, stderr),
        };

        match cli.command {
            AssetCommand::TypeName => match writeln!(stdout, "{}", self.asset.type_name()) {
                Ok(()) => EXIT_SUCCESS,
                Err(error) => report(stderr, &error),
            },
            AssetCommand::VerifyConfig { config } => match self.asset.verify_config(&config) {
                Ok(()) => EXIT_SUCCESS,
                Err(error) => report(stderr, &error),
            },
            AssetCommand::Format(format_args) => self.format(&format_args, stdout, stderr),
        }
    }

    fn splice_format_args(&self, mut args: Vec<OsString>) -> Vec<OsString> {
        let is_format = args
            .get(1)
            .is_some_and(|arg| arg.as_os_str() == FORMAT_SUBCOMMAND);
        if is_format && !self.format_args.is_empty() {
            let tail = args.split_off(2);
            args.extend(self.format_args.iter().cloned());
            args.extend(tail);
        }
        args
    }

    fn format(&self, args: &FormatArgs, stdout: &mut dyn Write, stderr: &mut dyn Write) -> u8 {
        let process_engine = ProcessEngine::default();
        let in_process_engine = InProcessEngine::new(self.registry);
        let engine: &dyn FormatEngine = match args.engine {
            EngineKind::Process => &process_engine,
            EngineKind::InProcess => &in_process_engine,
        };

        let mut observed = ObservedWriter::new(stdout);
        let outcome = match self.asset.format(args, engine, &mut observed) {
            Ok(outcome) => outcome,
            Err(error) => return report(stderr, &error),
        };

        debug!(
            target: COMMAND_TARGET,
            list = args.list,
            file_count = args.files.len(),
            ?outcome,
            wrote_output = observed.wrote_output(),
            "format command finished"
        );

        if args.list && (observed.wrote_output() || !outcome.is_success()) {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        }
    }
}

/// Tracks whether anything was written through it.
struct ObservedWriter<'a> {
    inner: &'a mut dyn Write,
    wrote: bool,
}

impl<'a> ObservedWriter<'a> {
    fn new(inner: &'a mut dyn Write) -> Self {
        Self {
            inner,
            wrote: false,
        }
    }

    const fn wrote_output(&self) -> bool {
        self.wrote
    }
}

impl Write for ObservedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.wrote |= written > 0;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(EXIT_FAILURE)
}

fn report(stderr: &mut dyn Write, error: &dyn std::fmt::Display) -> u8 {
    writeln!(stderr, "{error}").ok();
    EXIT_FAILURE
}

fn usage(error: &clap::Error, stdout: &mut dyn Write, stderr: &mut dyn Write) -> u8 {
    if error.use_stderr() {
        write!(stderr, "{error}").ok();
    } else {
        write!(stdout, "{error}").ok();
    }
    exit_status(error.exit_code())
}
