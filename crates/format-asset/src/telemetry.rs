//! Structured telemetry initialisation for asset binaries.
//!
//! Logs always go to stderr: an asset's stdout carries the formatter output
//! the host parses, so nothing else may be written there.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use strum::{Display, EnumString};
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "FORMAT_ASSET_LOG";
/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "FORMAT_ASSET_LOG_FORMAT";

const DEFAULT_LOG_FILTER: &str = "warn";

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable single line output.
    #[default]
    Compact,
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    filter: String,
    format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: String::from(DEFAULT_LOG_FILTER),
            format: LogFormat::default(),
        }
    }
}

impl TelemetryConfig {
    /// Creates a configuration from explicit values.
    #[must_use]
    pub fn new(filter: impl Into<String>, format: LogFormat) -> Self {
        Self {
            filter: filter.into(),
            format,
        }
    }

    /// Reads [`LOG_FILTER_ENV`] and [`LOG_FORMAT_ENV`] from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Format`] if the format name is unknown.
    pub fn from_env() -> Result<Self, TelemetryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration through `lookup`, which maps variable
    /// names to values.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Format`] if the format name is unknown.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TelemetryError> {
        let filter = lookup(LOG_FILTER_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_LOG_FILTER));
        let format = match lookup(LOG_FORMAT_ENV) {
            Some(value) if !value.trim().is_empty() => value
                .trim()
                .parse::<LogFormat>()
                .map_err(|_| TelemetryError::Format(value))?,
            _ => LogFormat::default(),
        };
        Ok(Self { filter, format })
    }

    /// Returns the filter directive.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Returns the output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The configured log format is not recognised.
    #[error("unknown log format '{0}', expected 'compact' or 'json'")]
    Format(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first invocation installs the
/// global subscriber.
///
/// # Errors
///
/// Returns a [`TelemetryError`] if the filter is invalid or another
/// subscriber was already installed.
pub fn initialise(config: &TelemetryConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

/// Reads the configuration from the environment and initialises telemetry.
///
/// # Errors
///
/// Returns a [`TelemetryError`] if the environment holds invalid settings or
/// the subscriber cannot be installed.
pub fn initialise_from_env() -> Result<TelemetryHandle, TelemetryError> {
    initialise(&TelemetryConfig::from_env()?)
}

fn install_subscriber(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
