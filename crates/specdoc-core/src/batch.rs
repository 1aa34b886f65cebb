//! Partitioning of spec files into size-bounded batches.
//!
//! Every input file is wrapped with a `# File: <path>` header before it is
//! measured. Files after the first in a batch also carry the
//! [`FILE_SEPARATOR`] prefix, so the separator cost is charged to the file
//! that needs it.
//!
//! A batch closes when it already holds `max_files` entries or when adding the
//! next wrapped file would push it over `max_chars`. The character limit only
//! decides when to close: a file that is larger than the whole budget still
//! gets a batch of its own and is never split.
//!
//! ```rust
//! use std::num::NonZeroUsize;
//! use specdoc_core::batch::{BatchBuilder, BatchLimits, InputFile};
//!
//! let files = vec![
//!     InputFile::new("spec/a_spec.rb", "it 'works'"),
//!     InputFile::new("spec/b_spec.rb", "it 'also works'"),
//! ];
//! let limits = BatchLimits::new(NonZeroUsize::new(1), NonZeroUsize::MIN.saturating_add(999));
//! let batches = BatchBuilder::build(&files, limits);
//!
//! assert_eq!(batches.len(), 2);
//! assert_eq!(batches[1].source_paths(), vec!["spec/b_spec.rb"]);
//! ```

use std::num::NonZeroUsize;

/// Separator placed between files inside one batch.
pub const FILE_SEPARATOR: &str = "\n\n---\n\n";

/// Default character budget per batch.
pub const DEFAULT_MAX_CHARS: usize = 120_000;

/// A spec file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Path as it will appear in `# File:` lines.
    pub path: String,
    /// File contents.
    pub raw_text: String,
}

impl InputFile {
    /// Create an input file from a path and its contents.
    pub fn new(path: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw_text: raw_text.into(),
        }
    }

    fn wrap(&self, with_separator: bool) -> WrappedEntry {
        let mut wrapped_text = String::with_capacity(
            self.raw_text.len() + self.path.len() + FILE_SEPARATOR.len() + 12,
        );
        if with_separator {
            wrapped_text.push_str(FILE_SEPARATOR);
        }
        wrapped_text.push_str("# File: ");
        wrapped_text.push_str(&self.path);
        wrapped_text.push_str("\n\n");
        wrapped_text.push_str(&self.raw_text);
        wrapped_text.push('\n');

        WrappedEntry {
            path: self.path.clone(),
            length: wrapped_text.len(),
            wrapped_text,
        }
    }
}

/// A file framed for inclusion in a batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedEntry {
    path: String,
    wrapped_text: String,
    length: usize,
}

impl WrappedEntry {
    /// Source path of the wrapped file.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Framed text, including the separator when one was needed.
    #[must_use]
    pub fn wrapped_text(&self) -> &str {
        &self.wrapped_text
    }

    /// Byte length of [`Self::wrapped_text`].
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }
}

/// A contiguous group of wrapped files sent as one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<WrappedEntry>,
    char_count: usize,
}

impl Batch {
    /// Entries in input order.
    #[must_use]
    pub fn entries(&self) -> &[WrappedEntry] {
        &self.entries
    }

    /// Sum of entry lengths.
    #[must_use]
    pub const fn char_count(&self) -> usize {
        self.char_count
    }

    /// Number of files in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths of the files in this batch, in order.
    #[must_use]
    pub fn source_paths(&self) -> Vec<&str> {
        self.entries.iter().map(WrappedEntry::path).collect()
    }

    /// Concatenated wrapped text of every entry, used as the user message.
    #[must_use]
    pub fn user_content(&self) -> String {
        let mut content = String::with_capacity(self.char_count);
        for entry in &self.entries {
            content.push_str(&entry.wrapped_text);
        }
        content
    }

    /// True when a lone file already exceeds the character budget.
    #[must_use]
    pub fn is_oversized(&self, limits: BatchLimits) -> bool {
        self.char_count > limits.max_chars.get()
    }

    fn push(&mut self, entry: WrappedEntry) {
        self.char_count += entry.length;
        self.entries.push(entry);
    }
}

/// The two closing constraints for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// Maximum files per batch; `None` means unbounded.
    pub max_files: Option<NonZeroUsize>,
    /// Character budget that triggers closing the current batch.
    pub max_chars: NonZeroUsize,
}

impl BatchLimits {
    /// Create limits from an optional file cap and a character budget.
    #[must_use]
    pub const fn new(max_files: Option<NonZeroUsize>, max_chars: NonZeroUsize) -> Self {
        Self {
            max_files,
            max_chars,
        }
    }

    /// Rough token estimate for the character budget (four chars per token).
    #[must_use]
    pub const fn approx_tokens(&self) -> usize {
        self.max_chars.get().div_ceil(4)
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        let max_chars = match NonZeroUsize::new(DEFAULT_MAX_CHARS) {
            Some(n) => n,
            None => NonZeroUsize::MIN,
        };
        Self::new(None, max_chars)
    }
}

/// Incremental batch partitioner.
///
/// Holds one open batch; closed batches are never touched again.
#[derive(Debug)]
pub struct BatchBuilder {
    limits: BatchLimits,
    current: Batch,
    closed: Vec<Batch>,
}

impl BatchBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            current: Batch::default(),
            closed: Vec::new(),
        }
    }

    /// Partition `files` in order.
    #[must_use]
    pub fn build(files: &[InputFile], limits: BatchLimits) -> Vec<Batch> {
        let mut builder = Self::new(limits);
        for file in files {
            builder.push(file);
        }
        builder.finish()
    }

    /// Add the next file, closing the open batch first if a limit requires it.
    pub fn push(&mut self, file: &InputFile) {
        let mut entry = file.wrap(!self.current.is_empty());
        let projected = self.current.char_count + entry.length;

        if !self.current.is_empty() && self.should_close(projected) {
            self.closed.push(std::mem::take(&mut self.current));
            entry = file.wrap(false);
        }

        self.current.push(entry);
    }

    /// Close the open batch (if it holds anything) and return all batches.
    #[must_use]
    pub fn finish(mut self) -> Vec<Batch> {
        if !self.current.is_empty() {
            self.closed.push(self.current);
        }
        self.closed
    }

    fn should_close(&self, projected: usize) -> bool {
        let files_full = self
            .limits
            .max_files
            .is_some_and(|max| self.current.len() >= max.get());
        files_full || projected > self.limits.max_chars.get()
    }
}

/// Per-batch summary used for dry runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// 1-based batch number.
    pub number: usize,
    /// Files in the batch.
    pub files: Vec<String>,
    /// Total wrapped characters.
    pub char_count: usize,
    /// A single file larger than the budget.
    pub oversized: bool,
}

/// Summarize batches for display without invoking the backend.
#[must_use]
pub fn plan(batches: &[Batch], limits: BatchLimits) -> Vec<BatchSummary> {
    batches
        .iter()
        .enumerate()
        .map(|(idx, batch)| BatchSummary {
            number: idx + 1,
            files: batch.source_paths().into_iter().map(String::from).collect(),
            char_count: batch.char_count(),
            oversized: batch.is_oversized(limits),
        })
        .collect()
}
