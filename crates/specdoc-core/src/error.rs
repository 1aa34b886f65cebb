//! Error types and handling for specdoc-core operations.
//!
//! A single [`Error`] enum covers every failure the generation pipeline can
//! surface. Pre-flight failures are carried as [`ConfigError`] inside
//! [`Error::Config`] so callers can map them to usage-style exit codes before
//! any output is written.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: reading spec files, writing the output document
//! - **Network Errors**: transport failures talking to the backend
//! - **Backend Errors**: the backend answered with a non-success status
//! - **Parse Errors**: the backend answered with something that is not JSON
//! - **Configuration Errors**: pre-flight validation failures
//! - **Timeouts**: the backend did not answer in time
//!
//! ```rust
//! use specdoc_core::Error;
//!
//! let err = Error::Backend { status: 503, message: "overloaded".to_string() };
//! assert_eq!(err.category(), "backend");
//! assert!(err.is_recoverable());
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// The main error type for specdoc-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading input files and creating or appending to the output
    /// document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed before a response was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend returned a non-success HTTP status.
    #[error("Backend error (HTTP {status}): {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// A backend response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Pre-flight validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Operation timed out.
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// The generator itself never retries; this is exposed so callers can
    /// decide whether re-running is worthwhile.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Backend { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            Self::Parse(_) | Self::Config(_) => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// - `"io"` - File system operations
    /// - `"network"` - Transport failures
    /// - `"backend"` - Non-success backend responses
    /// - `"parse"` - Undecodable backend responses
    /// - `"config"` - Pre-flight validation
    /// - `"timeout"` - Operation timeouts
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Backend { .. } => "backend",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_error_display_formatting() {
        let err = Error::Backend {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error (HTTP 401): invalid api key");

        let err = Error::Parse("expected value at line 1".to_string());
        assert!(err.to_string().starts_with("Parse error"));

        let err = Error::Timeout("no answer after 300s".to_string());
        assert!(err.to_string().contains("300s"));
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: Error = ConfigError::PathNotFound(PathBuf::from("spec/missing")).into();
        assert_eq!(err.category(), "config");
        assert!(err.to_string().contains("spec/missing"));
        assert!(!err.to_string().starts_with("Configuration"));
    }

    #[test]
    fn test_backend_recoverability_by_status() {
        let throttled = Error::Backend {
            status: 429,
            message: String::new(),
        };
        let unavailable = Error::Backend {
            status: 503,
            message: String::new(),
        };
        let unauthorized = Error::Backend {
            status: 401,
            message: String::new(),
        };

        assert!(throttled.is_recoverable());
        assert!(unavailable.is_recoverable());
        assert!(!unauthorized.is_recoverable());
    }

    #[test]
    fn test_io_recoverability() {
        let timed_out = Error::Io(io::Error::new(io::ErrorKind::TimedOut, "slow disk"));
        let denied = Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));

        assert!(timed_out.is_recoverable());
        assert!(!denied.is_recoverable());
        assert_eq!(denied.category(), "io");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Parse(msg) => assert!(!msg.is_empty()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_errors_not_recoverable() {
        let err: Error = ConfigError::MissingCredential {
            var: "OPENAI_API_KEY",
        }
        .into();
        assert!(!err.is_recoverable());
    }
}
