//! Run configuration and pre-flight validation.
//!
//! Settings arrive already merged from their sources (explicit flag, then
//! environment, then default); the CLI does that merge with clap. This module
//! turns them into a [`GeneratorConfig`] in one step, [`preflight`], which
//! either yields a [`Ready`] run or a [`ConfigError`]. Nothing stateful is
//! constructed and nothing is written until preflight succeeds.
//!
//! ## Validation Order
//!
//! 1. credential present (skipped for dry runs)
//! 2. path argument present and not blank
//! 3. path exists
//! 4. numeric settings in range
//! 5. at least one input file discovered
//!
//! ```rust
//! use specdoc_core::config::{preflight, ConfigError, Settings};
//!
//! let settings = Settings {
//!     path: Some("spec".to_string()),
//!     api_key: None,
//!     ..Settings::default()
//! };
//! assert!(matches!(preflight(settings), Err(ConfigError::MissingCredential { .. })));
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::backend::openai::{API_KEY_ENV, ApiMode, BackendSettings, DEFAULT_BASE_URL};
use crate::batch::{BatchLimits, DEFAULT_MAX_CHARS};
use crate::collect::{self, DEFAULT_PATTERN, FilePattern};

/// Default output document.
pub const DEFAULT_OUTPUT: &str = "user_docs.md";

/// Default advisory token budget shown in the header.
pub const DEFAULT_MAX_TOKENS: usize = 24_000;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Default reasoning effort hint.
pub const DEFAULT_REASONING_EFFORT: &str = "low";

/// Default backend request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Pre-flight failures. Each maps to exactly one exit code in the CLI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API credential is not set.
    #[error("missing required environment variable {var}")]
    MissingCredential {
        /// Environment variable that should hold the credential.
        var: &'static str,
    },

    /// No path argument, or a blank one.
    #[error("missing required path argument (a spec file or directory)")]
    MissingPath,

    /// The path does not exist.
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Discovery found nothing to document.
    #[error("no files matching '{pattern}' found under {}", .path.display())]
    NoInputFiles {
        /// Directory that was searched.
        path: PathBuf,
        /// Pattern that was applied.
        pattern: String,
    },

    /// A setting is out of range.
    #[error("invalid value for {name}: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Raw settings, already merged from flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// File or directory to document.
    pub path: Option<String>,
    /// API credential.
    pub api_key: Option<String>,
    /// Whether a credential is needed (false for dry runs).
    pub require_credential: bool,
    /// Output document path.
    pub output: PathBuf,
    /// Maximum files per batch; `None` or `0` means unbounded.
    pub files_per_batch: Option<usize>,
    /// Character budget per batch.
    pub max_chars: usize,
    /// Advisory token budget, displayed only.
    pub max_tokens: usize,
    /// Model identifier.
    pub model: String,
    /// Reasoning effort hint for structured responses.
    pub reasoning_effort: String,
    /// Pause between backend calls in seconds; `<= 0` disables it.
    pub delay_secs: f64,
    /// Discovery pattern.
    pub pattern: String,
    /// Which remote call shape to advertise.
    pub api_mode: ApiMode,
    /// Backend base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum in-flight backend calls.
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path: None,
            api_key: None,
            require_credential: true,
            output: PathBuf::from(DEFAULT_OUTPUT),
            files_per_batch: None,
            max_chars: DEFAULT_MAX_CHARS,
            max_tokens: DEFAULT_MAX_TOKENS,
            model: DEFAULT_MODEL.to_string(),
            reasoning_effort: DEFAULT_REASONING_EFFORT.to_string(),
            delay_secs: 0.0,
            pattern: DEFAULT_PATTERN.to_string(),
            api_mode: ApiMode::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: 1,
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Path the inputs were collected from.
    pub source: PathBuf,
    /// Output document path.
    pub output: PathBuf,
    /// Batch closing limits.
    pub limits: BatchLimits,
    /// Advisory token budget, displayed only.
    pub max_tokens: usize,
    /// Model identifier.
    pub model: String,
    /// Reasoning effort hint.
    pub reasoning_effort: String,
    /// Pause between backend calls.
    pub delay: Duration,
    /// Maximum in-flight backend calls.
    pub concurrency: NonZeroUsize,
    /// Discovery pattern.
    pub pattern: FilePattern,
    /// HTTP backend settings.
    pub backend: BackendSettings,
}

/// A run whose preconditions all hold.
#[derive(Debug, Clone)]
pub struct Ready {
    /// Validated configuration.
    pub config: GeneratorConfig,
    /// Discovered input paths, in processing order.
    pub files: Vec<PathBuf>,
}

/// Validate settings and discover inputs.
pub fn preflight(settings: Settings) -> Result<Ready, ConfigError> {
    let api_key = settings
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string);
    if settings.require_credential && api_key.is_none() {
        return Err(ConfigError::MissingCredential { var: API_KEY_ENV });
    }

    let source = settings
        .path
        .as_deref()
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingPath)?;

    if !source.exists() {
        return Err(ConfigError::PathNotFound(source));
    }

    let config = build_config(&settings, source, api_key.unwrap_or_default())?;
    let files = discover(&config.source, &config.pattern)?;

    Ok(Ready { config, files })
}

fn build_config(
    settings: &Settings,
    source: PathBuf,
    api_key: String,
) -> Result<GeneratorConfig, ConfigError> {
    let max_chars =
        NonZeroUsize::new(settings.max_chars).ok_or_else(|| ConfigError::InvalidSetting {
            name: "max-chars",
            reason: "must be greater than zero".to_string(),
        })?;
    let max_files = settings.files_per_batch.and_then(NonZeroUsize::new);
    let concurrency =
        NonZeroUsize::new(settings.concurrency).ok_or_else(|| ConfigError::InvalidSetting {
            name: "concurrency",
            reason: "must be at least 1".to_string(),
        })?;
    if settings.timeout_secs == 0 {
        return Err(ConfigError::InvalidSetting {
            name: "timeout",
            reason: "must be at least 1 second".to_string(),
        });
    }

    Ok(GeneratorConfig {
        source,
        output: settings.output.clone(),
        limits: BatchLimits::new(max_files, max_chars),
        max_tokens: settings.max_tokens,
        model: non_blank("model", &settings.model)?,
        reasoning_effort: non_blank("reasoning-effort", &settings.reasoning_effort)?,
        delay: delay_from_secs(settings.delay_secs)?,
        concurrency,
        pattern: FilePattern::parse(&settings.pattern)?,
        backend: BackendSettings {
            api_key,
            base_url: non_blank("base-url", &settings.base_url)?,
            api_mode: settings.api_mode,
            timeout: Duration::from_secs(settings.timeout_secs),
        },
    })
}

fn discover(source: &Path, pattern: &FilePattern) -> Result<Vec<PathBuf>, ConfigError> {
    let files = collect::collect_paths(source, pattern);
    if files.is_empty() {
        return Err(ConfigError::NoInputFiles {
            path: source.to_path_buf(),
            pattern: pattern.as_str().to_string(),
        });
    }
    Ok(files)
}

fn non_blank(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidSetting {
            name,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Convert a delay in seconds. Non-positive values disable the pause.
pub fn delay_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() {
        return Err(ConfigError::InvalidSetting {
            name: "delay",
            reason: format!("{secs} is not a finite number of seconds"),
        });
    }
    if secs <= 0.0 {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::from_secs_f64(secs))
}
