//! Crate-level test doubles and BDD tests.

use std::ffi::OsString;
use std::io::Write;
use std::sync::Arc;

use crate::error::AssetError;
use crate::invocation::RunOutcome;
use crate::registry::ToolHandler;

mod behaviour;

/// Writes its arguments, space separated, as one line.
pub(crate) struct EchoTool;

impl ToolHandler for EchoTool {
    fn run(&self, args: &[OsString], sink: &mut dyn Write) -> Result<RunOutcome, AssetError> {
        let line = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(sink, "{line}").map_err(|source| AssetError::Output {
            source: Arc::new(source),
        })?;
        Ok(RunOutcome::Success)
    }
}

/// Exits with a fixed non-zero code without writing anything.
pub(crate) struct ExitTool(pub(crate) i32);

impl ToolHandler for ExitTool {
    fn run(&self, _args: &[OsString], _sink: &mut dyn Write) -> Result<RunOutcome, AssetError> {
        Ok(RunOutcome::ReportedIssues { code: Some(self.0) })
    }
}

/// Fails as if its binary were missing.
pub(crate) struct MissingTool;

impl ToolHandler for MissingTool {
    fn run(&self, _args: &[OsString], _sink: &mut dyn Write) -> Result<RunOutcome, AssetError> {
        Err(AssetError::Launch {
            command: String::from("[/missing/tool]"),
            source: Arc::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
        })
    }
}
