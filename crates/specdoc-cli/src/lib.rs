//! specdoc CLI - inferred end-user documentation from RSpec suites
//!
//! Parses arguments, validates the run before touching the filesystem,
//! then either prints the batch plan (`--dry-run`) or drives the generator
//! with a progress bar and reports where the document was written.

use anyhow::Result;
use clap::Parser;
use specdoc_core::backend::openai::API_KEY_ENV;
use specdoc_core::{generate, plan, preflight};
use tracing::debug;

mod cli;
pub mod error;
mod logging;
mod output;

use crate::cli::Cli;
use crate::error::CliError;
use crate::logging::initialize_logging;

/// Execute the specdoc CLI with the current process environment.
///
/// # Errors
///
/// Returns a [`CliError`] carrying the exit-code category on any failure.
/// Backend failures after the header was written leave the partial document
/// in place.
pub async fn run() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    initialize_logging(&cli).map_err(CliError::internal)?;
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let quiet = cli.quiet;
    let dry_run = cli.dry_run;
    let api_key = std::env::var(API_KEY_ENV).ok();
    let ready = preflight(cli.into_settings(api_key)).map_err(CliError::from)?;

    if dry_run {
        let batches = plan(&ready.config, &ready.files).map_err(CliError::from)?;
        print!("{}", output::format_plan(&batches, ready.config.limits));
        return Ok(());
    }

    let pb = output::batch_progress(quiet);
    let progress = pb.clone();
    let result = generate(
        ready,
        Some(move |done: usize, total: usize| {
            progress.set_length(u64::try_from(total).unwrap_or(u64::MAX));
            progress.set_position(u64::try_from(done).unwrap_or(u64::MAX));
        }),
    )
    .await;
    pb.finish_and_clear();

    let summary = result.map_err(CliError::from)?;
    println!("{}", output::format_summary(&summary));
    Ok(())
}
