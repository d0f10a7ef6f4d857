//! Child-process execution with relayed output.
//!
//! [`run_relayed`] spawns an [`Invocation`], copies its output into a
//! caller-provided sink, and maps the exit status onto a [`RunOutcome`].
//! Under [`OutputPolicy::Merged`] the child's stdout and stderr share one
//! pipe, so the sink sees the bytes in exactly the order the child wrote
//! them.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::error::AssetError;
use crate::invocation::{Invocation, RunOutcome};

/// Tracing target for process operations.
const PROCESS_TARGET: &str = "format_asset::process";

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Controls which child streams reach the output sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Stdout and stderr are written to one pipe and relayed in order.
    /// Callers cannot tell the two streams apart.
    #[default]
    Merged,
    /// Only stdout reaches the sink; stderr is captured and logged.
    StdoutOnly,
}

/// Runs `invocation` to completion, relaying its output into `sink`.
///
/// Standard input is closed. The call blocks until the child exits.
///
/// # Errors
///
/// Returns [`AssetError::Launch`] if the process cannot be spawned,
/// [`AssetError::Relay`] if reading the child's output or waiting for it
/// fails, and [`AssetError::Output`] if writing to `sink` fails. A non-zero
/// exit is reported as [`RunOutcome::ReportedIssues`], not as an error.
pub fn run_relayed(
    invocation: &Invocation,
    policy: OutputPolicy,
    sink: &mut dyn Write,
) -> Result<RunOutcome, AssetError> {
    let command_line = invocation.to_string();
    let mut command = invocation.to_command();
    command.stdin(Stdio::null());

    debug!(
        target: PROCESS_TARGET,
        command = %command_line,
        ?policy,
        "spawning formatter process"
    );

    let (mut child, relayed) = match policy {
        OutputPolicy::Merged => run_merged(command, sink, &command_line)?,
        OutputPolicy::StdoutOnly => run_stdout_only(command, sink, &command_line)?,
    };

    // Always reap the child, even when relaying failed part-way.
    let status = child.wait().map_err(|source| AssetError::Relay {
        command: command_line.clone(),
        source: Arc::new(source),
    })?;
    relayed?;

    debug!(
        target: PROCESS_TARGET,
        command = %command_line,
        ?status,
        "formatter process exited"
    );

    Ok(RunOutcome::from_status(status))
}

type Relayed = (Child, Result<(), AssetError>);

fn launch_error(command_line: &str, source: io::Error) -> AssetError {
    AssetError::Launch {
        command: command_line.to_owned(),
        source: Arc::new(source),
    }
}

fn run_merged(
    mut command: Command,
    sink: &mut dyn Write,
    command_line: &str,
) -> Result<Relayed, AssetError> {
    let (reader, writer) = io::pipe().map_err(|source| launch_error(command_line, source))?;
    let stderr_writer = writer
        .try_clone()
        .map_err(|source| launch_error(command_line, source))?;
    command.stdout(writer);
    command.stderr(stderr_writer);

    let child = command
        .spawn()
        .map_err(|source| launch_error(command_line, source))?;
    // The command still owns the write ends; the reader only sees EOF once
    // they are closed.
    drop(command);

    let relayed = drain(reader, sink, command_line);
    Ok((child, relayed))
}

fn run_stdout_only(
    mut command: Command,
    sink: &mut dyn Write,
    command_line: &str,
) -> Result<Relayed, AssetError> {
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|source| launch_error(command_line, source))?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let relayed = thread::scope(|scope| {
        let captured = scope.spawn(move || capture(stderr));
        let copied = match stdout {
            Some(reader) => drain(reader, sink, command_line),
            None => Ok(()),
        };
        let captured_stderr = captured.join().unwrap_or_default();
        if !captured_stderr.is_empty() {
            debug!(
                target: PROCESS_TARGET,
                command = command_line,
                stderr = %String::from_utf8_lossy(&captured_stderr).trim(),
                "formatter stderr output"
            );
        }
        copied
    });
    Ok((child, relayed))
}

fn capture(stderr: Option<ChildStderr>) -> Vec<u8> {
    let mut captured = Vec::new();
    if let Some(mut reader) = stderr {
        reader.read_to_end(&mut captured).ok();
    }
    captured
}

/// Copies `reader` into `sink` until end of file. Reading continues after a
/// sink failure so the child never blocks on a full pipe.
fn drain(
    mut reader: impl Read,
    sink: &mut dyn Write,
    command_line: &str,
) -> Result<(), AssetError> {
    let mut buffer = [0_u8; READ_BUFFER_SIZE];
    let mut written = Ok(());
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(AssetError::Relay {
                    command: command_line.to_owned(),
                    source: Arc::new(source),
                });
            }
        };
        if written.is_ok()
            && let Some(bytes) = buffer.get(..count)
        {
            written = sink.write_all(bytes);
        }
    }

    written
        .and_then(|()| sink.flush())
        .map_err(|source| AssetError::Output {
            source: Arc::new(source),
        })
}
