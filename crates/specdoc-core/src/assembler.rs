//! Incremental assembly of the output document.
//!
//! The document is written in two kinds of steps: one header write that
//! creates or truncates the file, then one append per batch that produced
//! text. Every append is flushed before the next batch is dispatched, so a
//! failure later in the run leaves the header and every earlier section on
//! disk.
//!
//! ## Format
//!
//! ```markdown
//! # Inferred Documentation from RSpec
//!
//! > Generated: 2025-01-01T00:00:00+00:00
//! > Path: spec
//! > Model: gpt-5-mini
//! > Heuristic budget: 120000 chars (~30000 tokens) per batch, max tokens hint 24000
//!
//! ---
//!
//! ## Batch 1
//! # File: spec/models/user_spec.rb
//!
//! Generated text...
//!
//! ---
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::Result;
use crate::batch::{BatchLimits, FILE_SEPARATOR};

/// Document title.
pub const TITLE: &str = "# Inferred Documentation from RSpec";

/// Generated text for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// 0-based batch index.
    pub batch_index: usize,
    /// Files that produced the text, in batch order.
    pub source_paths: Vec<String>,
    /// Backend output; empty means nothing to record.
    pub generated_text: String,
}

impl BatchResult {
    /// Whether there is anything worth writing.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.generated_text.trim().is_empty()
    }
}

/// Values shown in the document header.
#[derive(Debug, Clone)]
pub struct HeaderMeta {
    /// When the run started.
    pub generated_at: DateTime<Utc>,
    /// Path the specs were collected from.
    pub source: PathBuf,
    /// Model identifier.
    pub model: String,
    /// Advisory token budget.
    pub max_tokens: usize,
    /// Batch limits, for the character budget.
    pub limits: BatchLimits,
}

/// Sole writer of the output document for one run.
#[derive(Debug)]
pub struct DocumentAssembler {
    path: PathBuf,
}

impl DocumentAssembler {
    /// Create an assembler for `path`. Nothing is written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create or truncate the document and write the header.
    pub fn write_header(&self, meta: &HeaderMeta) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&self.path)?;
        file.write_all(Self::format_header(meta).as_bytes())?;
        file.flush()?;
        debug!(path = %self.path.display(), "Wrote document header");
        Ok(())
    }

    /// Append one batch section.
    ///
    /// Returns `false` without touching the file when the text is empty or
    /// whitespace-only.
    pub fn append_batch(&self, result: &BatchResult) -> Result<bool> {
        if !result.has_content() {
            debug!(batch = result.batch_index + 1, "Skipping batch with no generated text");
            return Ok(false);
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(Self::format_section(result).as_bytes())?;
        file.flush()?;
        debug!(batch = result.batch_index + 1, "Appended batch section");
        Ok(true)
    }

    fn format_header(meta: &HeaderMeta) -> String {
        let max_chars = meta.limits.max_chars.get();
        format!(
            "{TITLE}\n\n\
             > Generated: {}\n\
             > Path: {}\n\
             > Model: {}\n\
             > Heuristic budget: {max_chars} chars (~{} tokens) per batch, max tokens hint {}\
             {FILE_SEPARATOR}",
            meta.generated_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            meta.source.display(),
            meta.model,
            meta.limits.approx_tokens(),
            meta.max_tokens,
        )
    }

    fn format_section(result: &BatchResult) -> String {
        let mut section = format!("## Batch {}\n", result.batch_index + 1);
        for path in &result.source_paths {
            section.push_str("# File: ");
            section.push_str(path);
            section.push('\n');
        }
        section.push('\n');
        section.push_str(&result.generated_text);
        section.push_str(FILE_SEPARATOR);
        section
    }
}
