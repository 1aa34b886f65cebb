//! CLI error handling with semantic exit codes.
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Document written (or plan printed) |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Missing credential, missing path, invalid setting |
//! | 3 | `NotFound` | Path does not exist or holds no spec files |
//! | 4 | `Backend` | Backend rejected a request or sent an unreadable answer |
//! | 5 | `Network` | Transport failure talking to the backend |
//! | 6 | `Timeout` | Backend did not answer in time |
//! | 7 | `Io` | Reading specs or writing the document failed |
//!
//! ```bash
//! specdoc spec/
//! case $? in
//!     0) echo "done" ;;
//!     2) echo "check OPENAI_API_KEY and arguments" ;;
//!     4|5|6) echo "backend trouble, partial output kept" ;;
//! esac
//! ```

use std::fmt;

use specdoc_core::{ConfigError, Error as CoreError};

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    Usage = 2,

    /// Input path missing or empty (exit code 3).
    NotFound = 3,

    /// Backend answered with an error status or garbage (exit code 4).
    Backend = 4,

    /// Network failure (exit code 5).
    Network = 5,

    /// Operation timed out (exit code 6).
    Timeout = 6,

    /// Local file I/O failure (exit code 7).
    Io = 7,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::Backend => "backend error",
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::Io => "i/o error",
        }
    }

    /// Category for a pre-flight failure.
    #[must_use]
    pub const fn from_config(err: &ConfigError) -> Self {
        match err {
            ConfigError::MissingCredential { .. }
            | ConfigError::MissingPath
            | ConfigError::InvalidSetting { .. } => Self::Usage,
            ConfigError::PathNotFound(_) | ConfigError::NoInputFiles { .. } => Self::NotFound,
        }
    }

    /// Category for a core error.
    #[must_use]
    pub const fn from_core(err: &CoreError) -> Self {
        match err {
            CoreError::Config(config) => Self::from_config(config),
            CoreError::Io(_) => Self::Io,
            CoreError::Network(_) => Self::Network,
            CoreError::Backend { .. } | CoreError::Parse(_) => Self::Backend,
            CoreError::Timeout(_) => Self::Timeout,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
///
/// Wraps an `anyhow::Error` with an `ErrorCategory` so the full error chain
/// is kept for display.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Internal, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::new(ErrorCategory::from_core(&err), err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorCategory::from_config(&err), err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// A `CliError` keeps its category; a bare core error is categorized by
/// variant; anything else is internal.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    if let Some(core_err) = err.downcast_ref::<CoreError>() {
        return ErrorCategory::from_core(core_err).exit_code();
    }
    if let Some(config_err) = err.downcast_ref::<ConfigError>() {
        return ErrorCategory::from_config(config_err).exit_code();
    }
    ErrorCategory::Internal.exit_code()
}
