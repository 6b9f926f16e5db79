//! Glob pattern matching for ignore rules
//!
//! Patterns are matched against root-relative paths that use '/' as separator.
//! `*` and `?` never cross a separator, `**` spans zero or more segments.

use globset::{GlobBuilder, GlobMatcher};

/// A single compiled ignore pattern
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    matcher: Option<GlobMatcher>,
}

impl PatternMatcher {
    /// Compile a pattern in ignore-file syntax
    pub fn compile(pattern: &str) -> Result<Self, globset::Error> {
        let glob = GlobBuilder::new(&normalize_pattern(pattern))
            .literal_separator(true)
            .build()?;

        Ok(Self {
            matcher: Some(glob.compile_matcher()),
        })
    }

    /// A matcher that matches nothing (stands in for an unparseable pattern)
    pub fn never() -> Self {
        Self { matcher: None }
    }

    /// Match a relative path. A path also matches when one of its ancestor
    /// directories does, so an ignored directory hides everything beneath it.
    pub fn is_match(&self, path: &str) -> bool {
        if self.is_match_exact(path) {
            return true;
        }

        path.match_indices('/')
            .any(|(idx, _)| self.is_match_exact(&path[..idx]))
    }

    /// Match the path itself only, without looking at its ancestors
    pub fn is_match_exact(&self, path: &str) -> bool {
        self.matcher
            .as_ref()
            .map(|m| m.is_match(path))
            .unwrap_or(false)
    }
}

/// Rewrite an ignore-file pattern into the glob actually compiled.
///
/// A leading '/' anchors the pattern at the root; anything else may match at
/// any depth.
pub fn normalize_pattern(pattern: &str) -> String {
    if let Some(anchored) = pattern.strip_prefix('/') {
        anchored.to_string()
    } else if pattern == "**" || pattern.starts_with("**/") {
        pattern.to_string()
    } else {
        format!("**/{}", pattern)
    }
}
