//! Tool registry keyed by proxy marker names.
//!
//! An asset binary can host several formatter tools. Each tool is registered
//! under a name; invoking the binary with `__<name>` as its first argument
//! selects that tool instead of the host-facing command surface. The registry
//! replaces binary self-identity checks with an explicit name-to-handler
//! lookup, and the same lookup serves the in-process engine.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Write;

use tracing::debug;

use crate::error::AssetError;
use crate::invocation::RunOutcome;

/// Prefix that turns a tool name into a proxy marker argument.
pub const PROXY_PREFIX: &str = "__";

const REGISTRY_TARGET: &str = "format_asset::registry";

/// A formatter tool that can be selected through its proxy marker.
pub trait ToolHandler {
    /// Runs the tool with `args` (the arguments after the marker), writing
    /// all of its output to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] if the tool cannot be started. A tool that
    /// runs and exits non-zero returns [`RunOutcome::ReportedIssues`].
    fn run(&self, args: &[OsString], sink: &mut dyn Write) -> Result<RunOutcome, AssetError>;
}

/// Returns the proxy marker argument for `name`.
///
/// ```
/// assert_eq!(format_asset::proxy_marker("ptimports"), "__ptimports");
/// ```
#[must_use]
pub fn proxy_marker(name: &str) -> String {
    format!("{PROXY_PREFIX}{name}")
}

/// Extracts the tool name from a proxy marker argument.
///
/// Returns `None` for ordinary arguments, for non-UTF-8 arguments, and for a
/// bare prefix with no name.
///
/// ```
/// use std::ffi::OsStr;
///
/// assert_eq!(format_asset::proxy_target(OsStr::new("__ptimports")), Some("ptimports"));
/// assert_eq!(format_asset::proxy_target(OsStr::new("format")), None);
/// ```
#[must_use]
pub fn proxy_target(arg: &OsStr) -> Option<&str> {
    arg.to_str()?
        .strip_prefix(PROXY_PREFIX)
        .filter(|name| !name.is_empty())
}

/// Registry of tool handlers keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::DuplicateTool`] if the name is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Box<dyn ToolHandler>,
    ) -> Result<(), AssetError> {
        let name = name.into();
        if self.tools.contains_key(&name) {
            return Err(AssetError::DuplicateTool { name });
        }
        self.tools.insert(name, handler);
        Ok(())
    }

    /// Returns `true` if a tool is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the registered tool names in lexicographic order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs the tool registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::UnknownTool`] if no such tool exists, or the
    /// handler's own error.
    pub fn run(
        &self,
        name: &str,
        args: &[OsString],
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, AssetError> {
        let handler = self
            .tools
            .get(name)
            .ok_or_else(|| AssetError::UnknownTool {
                name: name.to_owned(),
            })?;
        debug!(
            target: REGISTRY_TARGET,
            tool = name,
            arg_count = args.len(),
            "dispatching to registered tool"
        );
        handler.run(args, sink)
    }

    /// Dispatches a full argument vector whose first element is a proxy
    /// marker.
    ///
    /// Returns `None` when `args` does not start with a marker, so callers
    /// can fall through to their regular command handling.
    pub fn dispatch(
        &self,
        args: &[OsString],
        sink: &mut dyn Write,
    ) -> Option<Result<RunOutcome, AssetError>> {
        let (first, rest) = args.split_first()?;
        let name = proxy_target(first)?;
        Some(self.run(name, rest, sink))
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
