//! Core domain types: file records, the file dictionary, and read limits.

use std::num::NonZeroUsize;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{EloquentError, Result};

/// Line terminator of the host platform.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Line terminator of the host platform.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Free-form metadata bag carried by the builder and exposed to plugins.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Files keyed by their path relative to the directory that was read.
///
/// Insertion order follows the walker's enumeration order; entries added by
/// plugins are appended at the end.
pub type FileDictionary = IndexMap<String, FileRecord>;

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// Decoded text of one file plus its line-split view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Decoded file contents.
    pub contents: String,
    /// `contents` split on [`LINE_ENDING`].
    pub lines: Vec<String>,
}

impl FileRecord {
    /// Build a record from already-decoded text.
    pub fn from_text(contents: impl Into<String>) -> Self {
        let contents = contents.into();
        let lines = contents.split(LINE_ENDING).map(String::from).collect();
        Self { contents, lines }
    }

    /// Decode raw bytes: UTF-8 when valid, lossy replacement otherwise.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::from_text(text),
            Err(err) => Self::from_text(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        }
    }

    /// Replace the contents, keeping `lines` in sync.
    pub fn set_contents(&mut self, contents: impl Into<String>) {
        *self = Self::from_text(contents);
    }
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

/// Upper bound on file reads in flight at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// Read every file in a single batch.
    #[default]
    Unbounded,
    /// Read at most this many files per batch.
    Limited(NonZeroUsize),
}

impl Concurrency {
    /// Validate a numeric limit. Zero is rejected.
    pub fn limited(max: usize) -> Result<Self> {
        NonZeroUsize::new(max)
            .map(Self::Limited)
            .ok_or_else(|| EloquentError::config("concurrency must be at least 1"))
    }

    /// Batch size to use for `total` paths. Never zero.
    pub fn batch_size(self, total: usize) -> usize {
        match self {
            Self::Unbounded => total.max(1),
            Self::Limited(max) => max.get(),
        }
    }

    /// The numeric limit, or `None` when unbounded.
    pub fn get(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Limited(max) => Some(max.get()),
        }
    }
}

impl std::fmt::Display for Concurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Limited(max) => write!(f, "{max}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_on_host_line_ending() {
        let text = format!("one{LINE_ENDING}two{LINE_ENDING}");
        let record = FileRecord::from_text(text.clone());
        assert_eq!(record.contents, text);
        assert_eq!(record.lines, vec!["one", "two", ""]);
    }

    #[test]
    fn record_from_invalid_utf8_falls_back() {
        let record = FileRecord::from_bytes(vec![b'a', 0xff, b'b']);
        assert_eq!(record.contents, "a\u{fffd}b");
        assert_eq!(record.lines.len(), 1);
    }

    #[test]
    fn set_contents_refreshes_lines() {
        let mut record = FileRecord::from_text("body");
        record.set_contents(format!("a{LINE_ENDING}b"));
        assert_eq!(record.lines, vec!["a", "b"]);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = Concurrency::limited(0).unwrap_err();
        assert_eq!(err.code(), "invalid_config");
        assert_eq!(Concurrency::limited(3).unwrap().get(), Some(3));
    }

    #[test]
    fn batch_size_never_zero() {
        assert_eq!(Concurrency::Unbounded.batch_size(0), 1);
        assert_eq!(Concurrency::Unbounded.batch_size(12), 12);
        assert_eq!(Concurrency::limited(4).unwrap().batch_size(12), 4);
        assert_eq!(Concurrency::Unbounded.to_string(), "unbounded");
    }
}
