//! Ignore rules
//!
//! Loads the ignore file at the project root and evaluates the resulting rules
//! with a fixed precedence: every exclude pattern is checked first, then every
//! negation pattern, so a `!pattern` re-includes a path no matter where it
//! appears in the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::pattern::PatternMatcher;

/// Default ignore file looked up at the root
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// A single ignore rule as loaded from the ignore file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    /// Glob pattern (directory patterns already rewritten to `dir/**`)
    pub pattern: String,

    /// Whether this rule re-includes paths (`!pattern` in source form)
    pub negated: bool,
}

impl IgnoreRule {
    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negated: false,
        }
    }

    #[cfg(test)]
    pub fn negate(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negated: true,
        }
    }
}

/// Parse ignore-file content into ordered rules
pub fn parse_rules(content: &str) -> Vec<IgnoreRule> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (negated, pattern) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };

            let pattern = if pattern.ends_with('/') {
                format!("{}**", pattern)
            } else {
                pattern.to_string()
            };

            IgnoreRule { pattern, negated }
        })
        .collect()
}

/// Load rules from the ignore file at the root.
///
/// A missing or unreadable file yields no rules.
pub fn load_ignore_rules(root: &Path, file_name: &str) -> Vec<IgnoreRule> {
    let path = root.join(file_name);
    if !path.is_file() {
        tracing::debug!("No ignore file at {}", path.display());
        return Vec::new();
    }

    match fs::read_to_string(&path) {
        Ok(content) => {
            let rules = parse_rules(&content);
            tracing::info!("Loaded {} ignore rules from {}", rules.len(), path.display());
            rules
        }
        Err(e) => {
            tracing::warn!("Could not read ignore file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Compiled rules split into the two precedence groups
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    excludes: Vec<PatternMatcher>,
    negations: Vec<PatternMatcher>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile rules; unparseable patterns are kept as never-matching
    pub fn from_rules(rules: &[IgnoreRule]) -> Self {
        let mut set = Self::new();
        for rule in rules {
            set.add(rule);
        }
        set
    }

    /// Add a single rule to its group
    pub fn add(&mut self, rule: &IgnoreRule) {
        let matcher = if rule.pattern.is_empty() {
            tracing::warn!("Skipping empty ignore pattern");
            PatternMatcher::never()
        } else {
            PatternMatcher::compile(&rule.pattern).unwrap_or_else(|e| {
                tracing::warn!("Skipping invalid ignore pattern '{}': {}", rule.pattern, e);
                PatternMatcher::never()
            })
        };

        if rule.negated {
            self.negations.push(matcher);
        } else {
            self.excludes.push(matcher);
        }
    }

    /// Add exclude patterns (used for built-in exclusions)
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.add(&IgnoreRule::exclude(pattern.as_ref()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.excludes.is_empty() && self.negations.is_empty()
    }

    pub fn has_negations(&self) -> bool {
        !self.negations.is_empty()
    }

    /// Decide whether a relative path is excluded.
    ///
    /// Pass 1 marks the path if any exclude pattern matches it or one of its
    /// ancestor directories; pass 2 unmarks it if any negation pattern matches
    /// the path itself. Negations on unmarked paths are a no-op.
    pub fn is_excluded(&self, path: &str) -> bool {
        let marked = self.excludes.iter().any(|m| m.is_match(path));
        if !marked {
            return false;
        }

        !self.negations.iter().any(|m| m.is_match_exact(path))
    }
}
