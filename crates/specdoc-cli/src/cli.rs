//! # CLI Structure and Argument Parsing
//!
//! `specdoc` takes one positional path and a set of tuning options. Every
//! option can also be supplied through an environment variable; an explicit
//! flag wins over the environment, which wins over the built-in default.
//!
//! ```bash
//! # Document a whole suite
//! specdoc spec/
//!
//! # One file per request, two seconds apart
//! specdoc spec/ --files-per-batch 1 --delay 2
//!
//! # Preview batching without calling the backend
//! specdoc spec/ --dry-run
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use specdoc_core::ApiMode;
use specdoc_core::Settings;
use specdoc_core::backend::openai::DEFAULT_BASE_URL;
use specdoc_core::batch::DEFAULT_MAX_CHARS;
use specdoc_core::collect::DEFAULT_PATTERN;
use specdoc_core::config::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_OUTPUT, DEFAULT_REASONING_EFFORT,
    DEFAULT_TIMEOUT_SECS,
};

/// Main CLI structure for the `specdoc` command
#[derive(Parser, Clone, Debug)]
#[command(name = "specdoc")]
#[command(version)]
#[command(
    about = "specdoc - Infer end-user documentation from an RSpec suite",
    long_about = None
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Spec file or directory to document
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Output Markdown file (overwritten on each run)
    #[arg(short = 'o', long, env = "SPECDOC_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Maximum files per batch (0 or unset means no limit)
    #[arg(long, value_name = "N", env = "SPECDOC_FILES_PER_BATCH")]
    pub files_per_batch: Option<usize>,

    /// Character budget per batch
    #[arg(long, value_name = "N", env = "SPECDOC_MAX_CHARS", default_value_t = DEFAULT_MAX_CHARS)]
    pub max_chars: usize,

    /// Token budget shown in the document header
    #[arg(long, value_name = "N", env = "SPECDOC_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: usize,

    /// Model identifier
    #[arg(short = 'm', long, env = "SPECDOC_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Reasoning effort hint for structured responses
    #[arg(long, env = "SPECDOC_REASONING_EFFORT", default_value = DEFAULT_REASONING_EFFORT)]
    pub reasoning_effort: String,

    /// Seconds to wait between backend calls
    #[arg(long, value_name = "SECS", env = "SPECDOC_BATCH_DELAY", default_value_t = 0.0)]
    pub delay: f64,

    /// File name pattern for directory discovery
    #[arg(long, env = "SPECDOC_PATTERN", default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Remote call shape the backend supports
    #[arg(long, value_enum, env = "SPECDOC_API", default_value_t = ApiArg::Responses)]
    pub api: ApiArg,

    /// Backend base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", env = "SPECDOC_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Maximum backend calls in flight (sections are still written in order)
    #[arg(long, value_name = "N", env = "SPECDOC_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// Print the batch plan without calling the backend or writing output
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color")]
    pub no_color: bool,
}

/// Remote call shape selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ApiArg {
    /// Structured responses with chat-completion fallback
    Responses,
    /// Chat completion only
    Chat,
}

impl From<ApiArg> for ApiMode {
    fn from(arg: ApiArg) -> Self {
        match arg {
            ApiArg::Responses => Self::Responses,
            ApiArg::Chat => Self::Chat,
        }
    }
}

impl Cli {
    /// Merge parsed arguments and the credential into core settings.
    pub fn into_settings(self, api_key: Option<String>) -> Settings {
        Settings {
            path: self.path,
            api_key,
            require_credential: !self.dry_run,
            output: self.output,
            files_per_batch: self.files_per_batch,
            max_chars: self.max_chars,
            max_tokens: self.max_tokens,
            model: self.model,
            reasoning_effort: self.reasoning_effort,
            delay_secs: self.delay,
            pattern: self.pattern,
            api_mode: self.api.into(),
            base_url: self.base_url,
            timeout_secs: self.timeout,
            concurrency: self.concurrency,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_map_to_settings() {
        let cli = Cli::try_parse_from([
            "specdoc",
            "spec",
            "--files-per-batch",
            "3",
            "--max-chars",
            "500",
            "--delay",
            "1.5",
            "--api",
            "chat",
            "-o",
            "out/docs.md",
        ])
        .unwrap();
        let settings = cli.into_settings(Some("sk".to_string()));

        assert_eq!(settings.path.as_deref(), Some("spec"));
        assert_eq!(settings.files_per_batch, Some(3));
        assert_eq!(settings.max_chars, 500);
        assert!((settings.delay_secs - 1.5).abs() < f64::EPSILON);
        assert_eq!(settings.api_mode, ApiMode::Chat);
        assert_eq!(settings.output, PathBuf::from("out/docs.md"));
        assert!(settings.require_credential);
    }

    #[test]
    fn test_dry_run_does_not_require_credential() {
        let cli = Cli::try_parse_from(["specdoc", "spec", "--dry-run"]).unwrap();
        assert!(!cli.into_settings(None).require_credential);
    }

    #[test]
    fn test_path_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["specdoc"]).unwrap();
        assert!(cli.path.is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["specdoc", "spec", "-q", "-v"]).is_err());
    }
}
