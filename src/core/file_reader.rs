//! File classification and reading
//!
//! Decides whether a candidate is binary or text and reads text content.
//! Binary files are never content-read beyond the classification sample.

use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::core::model::FileClass;

/// Number of leading bytes inspected for a null byte
pub const SAMPLE_SIZE: u64 = 1024;

/// Extensions that are always treated as binary (lowercase, without the dot)
#[rustfmt::skip]
pub const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "svg",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // archives
    "zip", "tar", "gz", "rar", "7z",
    // executables and libraries
    "exe", "dll", "so", "dylib",
    // audio/video
    "mp3", "mp4", "avi", "mov", "wav",
    // fonts
    "ttf", "otf", "woff", "woff2",
    // data
    "bin", "dat", "db", "sqlite",
];

/// Check the extension against the known binary set (case-insensitive)
pub fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            BINARY_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Classify a file as binary or text.
///
/// Falls back to text when the file cannot be inspected; the read step will
/// surface the real error.
pub fn classify(path: &Path) -> FileClass {
    match try_classify(path) {
        Ok(class) => class,
        Err(e) => {
            tracing::warn!(
                "Could not determine if file is binary: {} - {}",
                path.display(),
                e
            );
            FileClass::Text
        }
    }
}

fn try_classify(path: &Path) -> std::io::Result<FileClass> {
    if has_binary_extension(path) {
        return Ok(FileClass::Binary);
    }

    if fs::metadata(path)?.len() == 0 {
        return Ok(FileClass::Text);
    }

    if sample_contains_null(path)? {
        Ok(FileClass::Binary)
    } else {
        Ok(FileClass::Text)
    }
}

/// Read at most `SAMPLE_SIZE` leading bytes and look for a null byte
pub fn sample_contains_null(path: &Path) -> std::io::Result<bool> {
    let file = fs::File::open(path)?;
    let mut sample = Vec::with_capacity(SAMPLE_SIZE as usize);
    BufReader::new(file).take(SAMPLE_SIZE).read_to_end(&mut sample)?;
    Ok(sample.contains(&0))
}

/// Read a whole text file.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn read_text(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(e) => {
            tracing::debug!("Lossy UTF-8 conversion applied to {}", path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Get file size in bytes
pub fn file_size(path: &Path) -> std::io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}
