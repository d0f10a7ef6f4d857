//! Format asset framework shared by formatter assets.
//!
//! A format asset is a small executable that a host format plugin calls to
//! format or list source files. The host speaks a fixed command-line contract
//! (`type-name`, `verify-config`, `format`), and the asset translates each
//! `format` call into an invocation of an external formatter tool.
//!
//! # Architecture
//!
//! Assets implement [`FormatAsset`] and hand it to an [`AssetRunner`], which
//! owns argument parsing and the host exit contract. Formatter tools are
//! registered by name in a [`ToolRegistry`]; a first argument of the form
//! `__<name>` (the proxy marker) selects a registered tool directly. Each
//! formatting run goes through a [`FormatEngine`]: [`ProcessEngine`] spawns
//! the invocation as a child process, while [`InProcessEngine`] resolves the
//! proxy marker against the registry and calls the handler without
//! re-executing the binary.
//!
//! # Example
//!
//! ```rust,no_run
//! use format_asset::{Invocation, OutputPolicy, process::run_relayed};
//!
//! let invocation = Invocation::new("gofmt").arg("-l").arg("main.go");
//! let mut output = Vec::new();
//! let outcome = run_relayed(&invocation, OutputPolicy::Merged, &mut output)?;
//! assert!(outcome.is_success());
//! # Ok::<(), format_asset::AssetError>(())
//! ```

pub mod command;
pub mod engine;
pub mod error;
pub mod invocation;
pub mod process;
pub mod registry;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::command::{AssetRunner, FormatArgs, FormatAsset};
pub use self::engine::{EngineKind, FormatEngine, InProcessEngine, ProcessEngine};
pub use self::error::AssetError;
pub use self::invocation::{Invocation, RunOutcome};
pub use self::process::OutputPolicy;
pub use self::registry::{PROXY_PREFIX, ToolHandler, ToolRegistry, proxy_marker, proxy_target};
