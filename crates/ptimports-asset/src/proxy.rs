//! The `__ptimports` tool handler.
//!
//! When the asset binary is re-executed with the proxy marker, or the
//! in-process engine dispatches the marker, the remaining arguments are
//! handed to the ptimports program unchanged and its combined output is
//! relayed to the caller.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use format_asset::process::run_relayed;
use format_asset::{AssetError, Invocation, OutputPolicy, RunOutcome, ToolHandler};
use tracing::debug;

/// Environment variable naming the ptimports program to run.
pub const PTIMPORTS_BINARY_ENV: &str = "PTIMPORTS_BINARY";

const DEFAULT_PTIMPORTS_BINARY: &str = "ptimports";
const PROXY_TARGET: &str = "ptimports_asset::proxy";

/// Runs ptimports with the arguments that followed the proxy marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtimportsHandler {
    binary: PathBuf,
}

impl Default for PtimportsHandler {
    fn default() -> Self {
        Self::with_binary(DEFAULT_PTIMPORTS_BINARY)
    }
}

impl PtimportsHandler {
    /// Uses the program named by `PTIMPORTS_BINARY`, or `ptimports` from
    /// `PATH` when the variable is unset or empty.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Resolves the program through `lookup` instead of the process
    /// environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        lookup(PTIMPORTS_BINARY_ENV)
            .filter(|value| !value.is_empty())
            .map_or_else(Self::default, Self::with_binary)
    }

    /// Uses the given ptimports program.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the ptimports program this handler runs.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl ToolHandler for PtimportsHandler {
    fn run(&self, args: &[OsString], sink: &mut dyn Write) -> Result<RunOutcome, AssetError> {
        let invocation = Invocation::new(&self.binary).args(args.iter().cloned());
        debug!(target: PROXY_TARGET, command = %invocation, "proxying to ptimports");
        run_relayed(&invocation, OutputPolicy::Merged, sink)
    }
}
