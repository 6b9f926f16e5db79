//! Flatten Data Model
//!
//! Every file discovered under the root flows through these types: a
//! `CandidateFile` from discovery ends up as exactly one text, binary or error
//! record inside the `AggregateResult`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A file discovered under the root, pending classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// Absolute path on disk
    pub absolute: PathBuf,

    /// Path relative to root, using '/' as separator
    pub relative: String,
}

impl CandidateFile {
    pub fn new(absolute: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self {
            absolute: absolute.into(),
            relative: relative.into(),
        }
    }
}

/// Binary/text verdict for a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    Binary,
    Text,
}

/// A text file whose content is embedded in the output document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFileRecord {
    /// Path relative to root
    pub path: String,

    /// Exact file content (not normalized)
    pub content: String,

    /// Content length in characters
    pub size: usize,

    /// Number of '\n'-separated segments (a trailing unterminated line counts)
    pub lines: usize,
}

impl TextFileRecord {
    pub fn new(path: impl Into<String>, content: String) -> Self {
        let size = content.chars().count();
        let lines = count_lines(&content);
        Self {
            path: path.into(),
            content,
            size,
            lines,
        }
    }
}

/// A binary file; only its size is retained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryFileRecord {
    pub path: String,
    pub absolute_path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// A file that could not be classified or read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub path: String,
    pub absolute_path: PathBuf,
    pub error: String,
}

/// Outcome of processing a single candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Text(TextFileRecord),
    Binary(BinaryFileRecord),
    Error(ErrorRecord),
}

impl FileOutcome {
    /// Relative path of the underlying candidate
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub fn path(&self) -> &str {
        match self {
            FileOutcome::Text(r) => &r.path,
            FileOutcome::Binary(r) => &r.path,
            FileOutcome::Error(r) => &r.path,
        }
    }
}

/// Aggregated result of a flatten run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    pub text_files: Vec<TextFileRecord>,
    pub binary_files: Vec<BinaryFileRecord>,
    pub errors: Vec<ErrorRecord>,

    /// Number of candidates handed to the aggregator
    pub total_files: usize,

    /// Number of candidates visited, whatever the outcome
    pub processed_files: usize,
}

impl AggregateResult {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Default::default()
        }
    }

    /// Record the outcome of one candidate
    pub fn push(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Text(r) => self.text_files.push(r),
            FileOutcome::Binary(r) => self.binary_files.push(r),
            FileOutcome::Error(r) => self.errors.push(r),
        }
        self.processed_files += 1;
    }

    /// Total line count across text files
    pub fn total_lines(&self) -> usize {
        self.text_files.iter().map(|f| f.lines).sum()
    }

    /// Whether every candidate has been visited
    pub fn is_complete(&self) -> bool {
        self.processed_files == self.total_files
    }
}

/// Count lines the way the document's consumers do: segments split on '\n'
pub fn count_lines(content: &str) -> usize {
    content.split('\n').count()
}

/// Fatal errors of a flatten run
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("root directory {path} is not accessible: {source}")]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output to {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
