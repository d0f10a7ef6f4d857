//! Errors raised while building and running ptimports invocations.

use std::path::PathBuf;
use std::sync::Arc;

use format_asset::AssetError;
use thiserror::Error;

/// Errors raised by [`Formatter`](crate::Formatter) and its collaborators.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The path of the running executable could not be determined.
    #[error("failed to determine executable: {source}")]
    CurrentExecutable {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Package metadata for the project directory could not be loaded.
    #[error("failed to load packages in {}: {source}", dir.display())]
    PackageLoad {
        /// Project directory that was queried.
        dir: PathBuf,
        /// Underlying load failure.
        #[source]
        source: LoadError,
    },

    /// The metadata query succeeded but reported no packages.
    #[error("no packages found in {}", dir.display())]
    NoPackages {
        /// Project directory that was queried.
        dir: PathBuf,
    },

    /// The configuration block was rejected.
    #[error("invalid ptimports configuration: {message}")]
    Config {
        /// Parser diagnostic.
        message: String,
    },

    /// The formatter could not be started.
    #[error(transparent)]
    Engine(#[from] AssetError),
}

/// Failures of the package metadata query.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The metadata tool could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The metadata tool exited non-zero.
    #[error("{command} exited with status {status}: {stderr}")]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit code, or `-1` when terminated by a signal.
        status: i32,
        /// Trimmed stderr of the tool.
        stderr: String,
    },

    /// The metadata tool wrote output that is not a package JSON stream.
    #[error("failed to parse package metadata: {source}")]
    Parse {
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}
