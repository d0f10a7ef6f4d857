//! Formatter engines.
//!
//! A [`FormatEngine`] turns a fully built [`Invocation`] into a
//! [`RunOutcome`]. The engine abstraction lets an asset choose between
//! spawning the invocation as a child process and calling a registered tool
//! in the current process, and lets tests substitute recording doubles.

use std::io::Write;

use clap::ValueEnum;
use tracing::debug;

use crate::error::AssetError;
use crate::invocation::{Invocation, RunOutcome};
use crate::process::{OutputPolicy, run_relayed};
use crate::registry::{ToolRegistry, proxy_target};

const ENGINE_TARGET: &str = "format_asset::engine";

/// Executes formatter invocations.
pub trait FormatEngine {
    /// Runs `invocation`, writing all formatter output to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] if the formatter cannot be started. A
    /// formatter that runs and exits non-zero yields
    /// [`RunOutcome::ReportedIssues`].
    fn run(&self, invocation: &Invocation, sink: &mut dyn Write)
    -> Result<RunOutcome, AssetError>;
}

/// Runs invocations as child processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessEngine {
    policy: OutputPolicy,
}

impl ProcessEngine {
    /// Creates an engine that relays output according to `policy`.
    #[must_use]
    pub const fn new(policy: OutputPolicy) -> Self {
        Self { policy }
    }

    /// Returns the output policy.
    #[must_use]
    pub const fn policy(&self) -> OutputPolicy {
        self.policy
    }
}

impl FormatEngine for ProcessEngine {
    fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, AssetError> {
        run_relayed(invocation, self.policy, sink)
    }
}

/// Runs invocations by calling the registered tool their proxy marker names.
///
/// The invocation's program is ignored; its first argument must be a proxy
/// marker such as `__ptimports`.
#[derive(Debug, Clone, Copy)]
pub struct InProcessEngine<'a> {
    registry: &'a ToolRegistry,
}

impl<'a> InProcessEngine<'a> {
    /// Creates an engine backed by `registry`.
    #[must_use]
    pub const fn new(registry: &'a ToolRegistry) -> Self {
        Self { registry }
    }
}

impl FormatEngine for InProcessEngine<'_> {
    fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, AssetError> {
        let Some((first, rest)) = invocation.arguments().split_first() else {
            return Err(AssetError::MissingProxyMarker {
                command: invocation.to_string(),
            });
        };
        let Some(name) = proxy_target(first) else {
            return Err(AssetError::MissingProxyMarker {
                command: invocation.to_string(),
            });
        };

        debug!(
            target: ENGINE_TARGET,
            tool = name,
            command = %invocation,
            "running tool in process"
        );
        self.registry.run(name, rest, sink)
    }
}

/// Engine selection exposed on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Call the registered tool directly.
    #[default]
    InProcess,
    /// Re-execute the invocation as a child process.
    Process,
}
