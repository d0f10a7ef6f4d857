//! Domain errors raised by the asset framework.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O sources are held in `Arc`.

use std::sync::Arc;

use thiserror::Error;

/// Errors arising from asset framework operations.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The formatter process could not be started.
    #[error("failed to run {command}: {source}")]
    Launch {
        /// Rendered command line that was attempted.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// An invocation routed to the in-process engine carried no proxy marker.
    #[error("failed to run {command}: invocation does not select a registered tool")]
    MissingProxyMarker {
        /// Rendered command line that was attempted.
        command: String,
    },

    /// The proxy marker named a tool that is not registered.
    #[error("tool '{name}' is not registered")]
    UnknownTool {
        /// Name that was looked up.
        name: String,
    },

    /// A tool with the same name was registered twice.
    #[error("tool '{name}' is already registered")]
    DuplicateTool {
        /// Name that was registered twice.
        name: String,
    },

    /// Reading the child's output or waiting for it failed.
    #[error("failed to relay output of {command}: {source}")]
    Relay {
        /// Rendered command line of the running process.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Writing to the caller's output stream failed.
    #[error("failed to write output: {source}")]
    Output {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl AssetError {
    /// Returns `true` when the error means no formatter process ran at all.
    #[must_use]
    pub const fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            Self::Launch { .. } | Self::MissingProxyMarker { .. } | Self::UnknownTool { .. }
        )
    }
}
