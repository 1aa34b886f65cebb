//! Locating and reading spec files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::batch::InputFile;
use crate::config::ConfigError;
use crate::Result;

/// Default discovery pattern.
pub const DEFAULT_PATTERN: &str = "*_spec.rb";

/// File-name pattern of the form `*<suffix>` or an exact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    raw: String,
}

impl FilePattern {
    /// Parse a pattern. Only a single leading `*` wildcard is supported.
    pub fn parse(raw: &str) -> std::result::Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let rest = trimmed.strip_prefix('*').unwrap_or(trimmed);
        if rest.is_empty() || rest.contains(['*', '/', '\\']) {
            return Err(ConfigError::InvalidSetting {
                name: "pattern",
                reason: format!("'{raw}' must look like '*_spec.rb' or an exact file name"),
            });
        }
        Ok(Self {
            raw: trimmed.to_string(),
        })
    }

    /// Whether a file name matches.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.raw
            .strip_prefix('*')
            .map_or(file_name == self.raw, |suffix| file_name.ends_with(suffix))
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for FilePattern {
    fn default() -> Self {
        Self {
            raw: DEFAULT_PATTERN.to_string(),
        }
    }
}

/// Resolve `root` to an ordered list of input files.
///
/// A regular file is returned as-is regardless of its name. A directory is
/// walked recursively and every matching file is returned, sorted by the
/// full path string. Entries the walk cannot read are logged and skipped.
pub fn collect_paths(root: &Path, pattern: &FilePattern) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(
                    path = ?err.path(),
                    error = %err,
                    "Skipping unreadable entry during spec discovery"
                );
                None
            },
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.matches(name))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    // Whole-string order: `api-v2/x` sorts before `api/x`.
    paths.sort_by_cached_key(|path| path.to_string_lossy().into_owned());
    debug!(root = %root.display(), count = paths.len(), pattern = pattern.as_str(), "Collected spec files");
    paths
}

/// Read every path into an [`InputFile`], in order.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path)?;
            let raw_text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = %path.display(), "Spec file is not valid UTF-8; decoding lossily");
                    String::from_utf8_lossy(err.as_bytes()).into_owned()
                },
            };
            Ok(InputFile::new(path.display().to_string(), raw_text))
        })
        .collect()
}
