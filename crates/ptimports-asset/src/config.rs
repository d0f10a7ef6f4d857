//! Formatter options parsed from the host's configuration block.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// The three independent ptimports switches.
///
/// Every combination is valid. The host passes the block as YAML with
/// kebab-case keys:
///
/// ```yaml
/// skip-refactor: false
/// skip-simplify: true
/// separate-project-imports: true
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct FormatterConfig {
    skip_refactor: bool,
    skip_simplify: bool,
    separate_project_imports: bool,
}

impl FormatterConfig {
    /// Parses a YAML configuration block. Blank input yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Config`] for malformed YAML, unknown keys, or
    /// non-boolean values.
    ///
    /// # Example
    ///
    /// ```
    /// use ptimports_asset::FormatterConfig;
    ///
    /// let config = FormatterConfig::from_yaml("skip-simplify: true")?;
    /// assert!(config.skip_simplify());
    /// assert!(!config.skip_refactor());
    /// # Ok::<(), ptimports_asset::FormatError>(())
    /// ```
    pub fn from_yaml(text: &str) -> Result<Self, FormatError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(text).map_err(|error| FormatError::Config {
            message: error.to_string(),
        })
    }

    /// Sets whether the `-r` refactoring pass is skipped.
    #[must_use]
    pub const fn with_skip_refactor(mut self, skip: bool) -> Self {
        self.skip_refactor = skip;
        self
    }

    /// Sets whether the `-s` simplification pass is skipped.
    #[must_use]
    pub const fn with_skip_simplify(mut self, skip: bool) -> Self {
        self.skip_simplify = skip;
        self
    }

    /// Sets whether project imports are grouped separately.
    #[must_use]
    pub const fn with_separate_project_imports(mut self, separate: bool) -> Self {
        self.separate_project_imports = separate;
        self
    }

    /// Returns `true` when `-r` is omitted.
    #[must_use]
    pub const fn skip_refactor(&self) -> bool {
        self.skip_refactor
    }

    /// Returns `true` when `-s` is omitted.
    #[must_use]
    pub const fn skip_simplify(&self) -> bool {
        self.skip_simplify
    }

    /// Returns `true` when `--local <project>/` is passed.
    #[must_use]
    pub const fn separate_project_imports(&self) -> bool {
        self.separate_project_imports
    }
}
