//! Terminal output: progress bar, dry-run plan, final status line.

use std::fmt::Write as _;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use specdoc_core::{BatchLimits, BatchSummary, RunSummary};

/// Progress bar over batches, drawn on stderr. Hidden when `quiet`.
pub fn batch_progress(quiet: bool) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    if quiet {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Render the dry-run plan.
pub fn format_plan(plan: &[BatchSummary], limits: BatchLimits) -> String {
    let files: usize = plan.iter().map(|b| b.files.len()).sum();
    let mut out = format!(
        "{} {} files in {} batches (budget {} chars, ~{} tokens)\n",
        "Plan:".bold(),
        files,
        plan.len(),
        limits.max_chars,
        limits.approx_tokens(),
    );

    for batch in plan {
        let heading = format!("Batch {}", batch.number);
        let _ = write!(
            out,
            "\n{} ({} files, {} chars)",
            heading.cyan(),
            batch.files.len(),
            batch.char_count
        );
        if batch.oversized {
            let _ = write!(out, " {}", "oversized".yellow());
        }
        out.push('\n');
        for file in &batch.files {
            let _ = writeln!(out, "  {file}");
        }
    }
    out
}

/// Render the completion message.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut line = format!(
        "{} Wrote {} ({} of {} batches documented",
        "✓".green(),
        summary.output.display().to_string().bold(),
        summary.recorded,
        summary.batches,
    );
    if summary.skipped > 0 {
        let _ = write!(line, ", {} empty", summary.skipped);
    }
    line.push(')');
    line
}
