//! Flatten flow - Discover, read and serialize a project into one XML document
//!
//! Pipeline: ignore rules → discovery → filtering → per-file classify/read →
//! XML rendering → write. Everything before the final write degrades
//! gracefully; only a failed write aborts the run.

use anyhow::{Context, Result};
use std::fs;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::backends::scan::{builtin_rules, discover};
use crate::core::file_reader::{classify, file_size, read_text};
use crate::core::model::{
    AggregateResult, BinaryFileRecord, CandidateFile, ErrorRecord, FileClass, FileOutcome,
    FlattenError, TextFileRecord,
};
use crate::core::paths::{literal_pattern, make_relative};
use crate::core::render::serialize;
use crate::core::rules::{load_ignore_rules, RuleSet, DEFAULT_IGNORE_FILE};
use crate::core::tokenizer::TokenModel;
use crate::flows::stats::{calculate_statistics, FlattenStats};

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "flattened-codebase.xml";

/// Receives per-file progress notifications. Purely informational.
pub trait ProgressSink {
    /// Called before candidate `index` (1-based) of `total` is processed
    fn on_file(&mut self, _index: usize, _total: usize, _path: &str) {}

    /// Called when a candidate ends up as an error record
    fn on_error(&mut self, _path: &str, _error: &str) {}

    /// Called once after the last candidate
    fn finish(&mut self, _result: &AggregateResult) {}
}

/// Progress sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Single overwriting status line on stderr
#[derive(Debug, Default)]
pub struct TerminalProgress {
    active: bool,
}

impl TerminalProgress {
    /// Only draws when stderr is a terminal
    pub fn new() -> Self {
        Self {
            active: std::io::stderr().is_terminal(),
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn on_file(&mut self, index: usize, total: usize, path: &str) {
        if self.active {
            eprint!("\r\x1b[2K📄 Processing file {}/{}: {}", index, total, path);
            let _ = std::io::stderr().flush();
        }
    }

    fn on_error(&mut self, path: &str, error: &str) {
        if self.active {
            eprintln!("\r\x1b[2K⚠️  Could not read file {}: {}", path, error);
        }
    }

    fn finish(&mut self, result: &AggregateResult) {
        if self.active {
            eprintln!(
                "\r\x1b[2K✅ Processed {}/{} files",
                result.processed_files, result.total_files
            );
        }
    }
}

/// Classify and read one candidate. Never fails: problems become error records.
pub fn process_file(candidate: &CandidateFile) -> FileOutcome {
    let path = &candidate.absolute;

    let outcome = match classify(path) {
        FileClass::Binary => file_size(path).map(|size| {
            FileOutcome::Binary(BinaryFileRecord {
                path: candidate.relative.clone(),
                absolute_path: path.clone(),
                size,
            })
        }),
        FileClass::Text => read_text(path).map(|content| {
            FileOutcome::Text(TextFileRecord::new(candidate.relative.clone(), content))
        }),
    };

    outcome.unwrap_or_else(|e| {
        tracing::warn!("Could not read file {}: {}", candidate.relative, e);
        FileOutcome::Error(ErrorRecord {
            path: candidate.relative.clone(),
            absolute_path: path.clone(),
            error: e.to_string(),
        })
    })
}

fn record(result: &mut AggregateResult, outcome: FileOutcome, progress: &mut dyn ProgressSink) {
    if let FileOutcome::Error(err) = &outcome {
        progress.on_error(&err.path, &err.error);
    }
    result.push(outcome);
}

/// Read and classify every candidate, in order.
///
/// Each candidate lands in exactly one of text/binary/error and counts as
/// processed exactly once.
#[cfg(not(feature = "parallel"))]
pub fn aggregate(candidates: &[CandidateFile], progress: &mut dyn ProgressSink) -> AggregateResult {
    let total = candidates.len();
    let mut result = AggregateResult::new(total);

    for (idx, candidate) in candidates.iter().enumerate() {
        progress.on_file(idx + 1, total, &candidate.relative);
        record(&mut result, process_file(candidate), progress);
    }

    debug_assert!(result.is_complete());
    progress.finish(&result);
    result
}

/// Read and classify every candidate on the rayon pool.
///
/// `collect` keeps candidate order, so the result matches the sequential
/// version exactly. Progress is reported while merging.
#[cfg(feature = "parallel")]
pub fn aggregate(candidates: &[CandidateFile], progress: &mut dyn ProgressSink) -> AggregateResult {
    use rayon::prelude::*;

    let total = candidates.len();
    let outcomes: Vec<FileOutcome> = candidates.par_iter().map(process_file).collect();

    let mut result = AggregateResult::new(total);
    for (idx, outcome) in outcomes.into_iter().enumerate() {
        progress.on_file(idx + 1, total, outcome.path());
        record(&mut result, outcome, progress);
    }

    debug_assert!(result.is_complete());
    progress.finish(&result);
    result
}

/// Options for a flatten run
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Project root to flatten
    pub root: PathBuf,
    /// Output document path (relative paths resolve against the current directory)
    pub output: PathBuf,
    /// Ignore file name looked up at the root
    pub ignore_file: String,
    /// Model used for the token estimate
    pub token_model: TokenModel,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            token_model: TokenModel::default(),
        }
    }
}

/// Everything a caller needs to report on a finished run
#[derive(Debug, Clone)]
pub struct FlattenReport {
    pub result: AggregateResult,
    pub stats: FlattenStats,
    /// Absolute path of the written document
    pub output: PathBuf,
}

/// Resolve the output path to an absolute path, canonicalizing its parent
/// when it exists
fn resolve_output(output: &Path) -> Result<PathBuf> {
    let absolute = if output.is_absolute() {
        output.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Cannot determine current directory")?
            .join(output)
    };

    let resolved = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| absolute.clone()),
        _ => absolute,
    };
    Ok(resolved)
}

/// Build the filtered candidate list for a root
pub fn collect_candidates(
    root: &Path,
    ignore_file: &str,
    extra_excludes: &[String],
) -> Result<Vec<CandidateFile>> {
    let rules = RuleSet::from_rules(&load_ignore_rules(root, ignore_file));
    let builtin = builtin_rules(extra_excludes);

    discover(root, &rules, &builtin)
}

/// Run the full pipeline and write the document
pub fn flatten(opts: &FlattenOptions, progress: &mut dyn ProgressSink) -> Result<FlattenReport> {
    let root = opts
        .root
        .canonicalize()
        .map_err(|source| FlattenError::InvalidRoot {
            path: opts.root.clone(),
            source,
        })?;

    let output = resolve_output(&opts.output)?;
    let extra: Vec<String> = make_relative(&output, &root)
        .filter(|rel| !rel.is_empty())
        .map(|rel| literal_pattern(&rel))
        .into_iter()
        .collect();

    let candidates = collect_candidates(&root, &opts.ignore_file, &extra)?;
    tracing::info!("Found {} files to include", candidates.len());

    let result = aggregate(&candidates, progress);
    let document = serialize(&result);

    fs::write(&output, &document).map_err(|source| FlattenError::WriteOutput {
        path: output.clone(),
        source,
    })?;
    tracing::info!("Wrote {} characters to {}", document.len(), output.display());

    let stats = calculate_statistics(&result, &document, opts.token_model);

    Ok(FlattenReport {
        result,
        stats,
        output,
    })
}
