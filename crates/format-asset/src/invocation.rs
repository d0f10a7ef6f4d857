//! Formatter invocations and their outcomes.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// A program plus its ordered argument vector.
///
/// The argument order is part of the contract with the formatter tool, so the
/// builder only ever appends.
///
/// # Example
///
/// ```
/// use format_asset::Invocation;
///
/// let invocation = Invocation::new("ptimports").arg("-l").args(["a.go", "b.go"]);
/// assert_eq!(invocation.to_string(), "[ptimports -l a.go b.go]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.push_arg(arg);
        self
    }

    /// Appends several arguments, preserving their order.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends one argument in place.
    pub fn push_arg(&mut self, arg: impl Into<OsString>) {
        self.args.push(arg.into());
    }

    /// Returns the program path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the argument vector, excluding the program.
    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Builds a [`Command`] for this invocation with default stdio.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", OsStr::to_string_lossy(arg))?;
        }
        f.write_str("]")
    }
}

/// Result of a formatter run that was successfully started.
///
/// A non-zero exit is a normal outcome: the formatter has already described
/// the issues on its output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The formatter exited with status zero.
    Success,
    /// The formatter exited non-zero, or was terminated by a signal.
    ReportedIssues {
        /// Exit code, absent when the process was killed by a signal.
        code: Option<i32>,
    },
}

impl RunOutcome {
    /// Maps a process exit status onto an outcome.
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::ReportedIssues {
                code: status.code(),
            }
        }
    }

    /// Returns `true` for a zero exit.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns the exit code to propagate, using `1` for signal terminations.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ReportedIssues { code } => code.unwrap_or(1),
        }
    }
}
