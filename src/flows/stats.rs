//! Statistics flow - Summary numbers for a flatten run
//!
//! Counts files by category, sizes, total lines and a token estimate for the
//! rendered document, and prints the completion summary.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::model::AggregateResult;
use crate::core::tokenizer::{count_tokens, TokenModel};

/// Summary statistics of a flatten run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenStats {
    /// Text plus binary files (errors excluded)
    pub total_files: usize,
    pub text_files: usize,
    pub binary_files: usize,
    pub error_files: usize,
    /// Text sizes (characters) plus binary sizes (bytes)
    pub total_size: u64,
    /// Length of the rendered document in characters
    pub xml_size: usize,
    /// Total line count across text files
    pub total_lines: usize,
    /// Estimated token count of the rendered document
    pub estimated_tokens: usize,
    /// Token model used for the estimate
    pub token_model: String,
}

/// Compute statistics from the aggregate and the rendered document
pub fn calculate_statistics(
    result: &AggregateResult,
    document: &str,
    model: TokenModel,
) -> FlattenStats {
    let text_size: u64 = result.text_files.iter().map(|f| f.size as u64).sum();
    let binary_size: u64 = result.binary_files.iter().map(|f| f.size).sum();

    FlattenStats {
        total_files: result.text_files.len() + result.binary_files.len(),
        text_files: result.text_files.len(),
        binary_files: result.binary_files.len(),
        error_files: result.errors.len(),
        total_size: text_size + binary_size,
        xml_size: document.chars().count(),
        total_lines: result.total_lines(),
        estimated_tokens: count_tokens(document, model),
        token_model: model.to_string(),
    }
}

/// Human-readable size: B below 1 KiB, then KB and MB with one decimal
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Format a count with thousands separators
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render the completion summary printed after a successful run
pub fn render_summary(stats: &FlattenStats, processed: usize, output: &Path) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "📊 Completion Summary:".bold()));
    out.push_str(&format!(
        "✅ Successfully processed {} files into {}\n",
        processed,
        output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
            .green()
    ));
    out.push_str(&format!("📁 Output file: {}\n", output.display()));
    out.push_str(&format!(
        "📏 Total source size: {}\n",
        format_size(stats.total_size)
    ));
    out.push_str(&format!(
        "📄 Generated XML size: {}\n",
        format_size(stats.xml_size as u64)
    ));
    out.push_str(&format!(
        "📝 Total lines of code: {}\n",
        format_count(stats.total_lines)
    ));
    out.push_str(&format!(
        "🔢 Estimated tokens: {} ({})\n",
        format_count(stats.estimated_tokens),
        stats.token_model
    ));

    let errors = format!("{} errors", stats.error_files);
    out.push_str(&format!(
        "📊 File breakdown: {} text, {} binary, {}\n",
        stats.text_files,
        stats.binary_files,
        if stats.error_files > 0 {
            errors.yellow()
        } else {
            errors.normal()
        }
    ));
    out
}
