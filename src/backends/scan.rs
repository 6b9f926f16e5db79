//! File discovery backend
//!
//! Walks the root with the ignore crate's walker (its own ignore-file handling
//! switched off) and applies the loaded rules plus the built-in exclusions.

use anyhow::Result;
use ignore::WalkBuilder;
use std::path::Path;

use crate::core::model::CandidateFile;
use crate::core::paths::make_relative;
use crate::core::rules::RuleSet;

/// Version-control metadata directory, never ingested
pub const VCS_DIR: &str = ".git";

/// Output file names of this tool (and its best-known sibling), never ingested
pub const DEFAULT_OUTPUT_NAMES: &[&str] = &["flattened-codebase.xml", "repomix-output.xml"];

/// Built-in exclusions plus any extra patterns supplied by the caller.
///
/// These are kept apart from the user's rules so a negation in the ignore
/// file cannot re-include them.
pub fn builtin_rules<S: AsRef<str>>(extra: &[S]) -> RuleSet {
    RuleSet::new()
        .with_excludes([VCS_DIR])
        .with_excludes(DEFAULT_OUTPUT_NAMES.iter().map(|name| format!("/{}", name)))
        .with_excludes(extra)
}

/// Discover candidate files under root.
///
/// `builtin` exclusions always apply; `rules` go through `filter`, so the
/// result is already filtered. Hidden files are included, symbolic links are
/// neither followed nor returned, and only regular files come back, sorted by
/// relative path.
pub fn discover(
    root: &Path,
    rules: &RuleSet,
    builtin: &RuleSet,
) -> Result<Vec<CandidateFile>> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    // Prune directories early. User rules may only prune when nothing can be
    // re-included beneath an excluded directory.
    let prune_root = root.to_path_buf();
    let prune_builtin = builtin.clone();
    let prune_user = if rules.has_negations() {
        None
    } else {
        Some(rules.clone())
    };
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 || !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            return true;
        }
        let Some(relative) = make_relative(entry.path(), &prune_root) else {
            return true;
        };
        if prune_builtin.is_excluded(&relative) {
            return false;
        }
        !prune_user
            .as_ref()
            .map(|user| user.is_excluded(&relative))
            .unwrap_or(false)
    });

    let mut candidates = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let relative = match make_relative(entry.path(), root) {
            Some(r) => r,
            None => continue,
        };

        if builtin.is_excluded(&relative) {
            continue;
        }

        candidates.push(CandidateFile::new(entry.path(), relative));
    }

    let mut candidates = filter(candidates, rules);
    candidates.sort_by(|a, b| a.relative.cmp(&b.relative));

    tracing::debug!("Discovered {} candidate files", candidates.len());
    Ok(candidates)
}

/// Apply ignore-rule precedence: exclusions first, then negations.
pub fn filter(candidates: Vec<CandidateFile>, rules: &RuleSet) -> Vec<CandidateFile> {
    if rules.is_empty() {
        return candidates;
    }

    let before = candidates.len();
    let kept: Vec<CandidateFile> = candidates
        .into_iter()
        .filter(|candidate| !rules.is_excluded(&candidate.relative))
        .collect();

    tracing::debug!("Ignore rules excluded {} files", before - kept.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::parse_rules;
    use std::fs;
    use tempfile::tempdir;

    fn write_file(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn discover_plain(root: &Path, rules: &RuleSet) -> Vec<CandidateFile> {
        discover(root, rules, &builtin_rules::<&str>(&[])).unwrap()
    }

    fn relatives(candidates: &[CandidateFile]) -> Vec<&str> {
        candidates.iter().map(|c| c.relative.as_str()).collect()
    }

    #[test]
    fn test_discover_empty_dir() {
        let temp = tempdir().unwrap();
        let result = discover_plain(temp.path(), &RuleSet::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_discover_sorted_files_only() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), "b.txt", "b");
        write_file(temp.path(), "a.txt", "a");
        write_file(temp.path(), "sub/zz.md", "z");
        fs::create_dir(temp.path().join("empty_dir")).unwrap();

        let result = discover_plain(temp.path(), &RuleSet::new());
        assert_eq!(relatives(&result), vec!["a.txt", "b.txt", "sub/zz.md"]);
        assert_eq!(result[0].absolute, temp.path().join("a.txt"));
    }

    #[test]
    fn test_discover_includes_hidden_files() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), ".env.example", "KEY=");
        write_file(temp.path(), ".config/settings.toml", "x = 1");

        let result = discover_plain(temp.path(), &RuleSet::new());
        assert_eq!(
            relatives(&result),
            vec![".config/settings.toml", ".env.example"]
        );
    }

    #[test]
    fn test_discover_walker_ignore_files_disabled() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_file(temp.path(), ".gitignore", "");
        write_file(temp.path(), ".ignore", "*.rs\n");
        write_file(temp.path(), "main.rs", "fn main() {}");

        // The walker's own ignore handling is off; only our rules apply
        let result = discover_plain(temp.path(), &RuleSet::new());
        assert!(relatives(&result).contains(&"main.rs"));
    }

    #[test]
    fn test_discover_builtin_exclusions() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), ".git/HEAD", "ref: refs/heads/main");
        write_file(temp.path(), ".git/objects/ab/cdef", "blob");
        write_file(temp.path(), "flattened-codebase.xml", "<files/>");
        write_file(temp.path(), "repomix-output.xml", "<files/>");
        write_file(temp.path(), "src/lib.rs", "");

        let result = discover_plain(temp.path(), &RuleSet::new());
        assert_eq!(relatives(&result), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_builtin_exclusions_survive_negation() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), ".git/config", "[core]");
        write_file(temp.path(), "keep.rs", "");

        let rules = RuleSet::from_rules(&parse_rules("*\n!.git/config\n!keep.rs\n"));
        let result = discover_plain(temp.path(), &rules);
        assert_eq!(relatives(&result), vec!["keep.rs"]);
    }

    #[test]
    fn test_discover_extra_exclusion() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), "out/context.xml", "<files/>");
        write_file(temp.path(), "main.rs", "");

        let builtin = builtin_rules(&["/out/context.xml"]);
        let result = discover(temp.path(), &RuleSet::new(), &builtin).unwrap();
        assert_eq!(relatives(&result), vec!["main.rs"]);
    }

    #[test]
    fn test_discover_applies_rules() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), "build/a", "");
        write_file(temp.path(), "build/x/y", "");
        write_file(temp.path(), "builder/x", "");
        write_file(temp.path(), "src/main.rs", "");

        let rules = RuleSet::from_rules(&parse_rules("build/\n"));
        let result = discover_plain(temp.path(), &rules);
        assert_eq!(relatives(&result), vec!["builder/x", "src/main.rs"]);
    }

    #[test]
    fn test_discover_negation_inside_excluded_directory() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), "docs/drop.md", "");
        write_file(temp.path(), "docs/keep.md", "");

        let rules = RuleSet::from_rules(&parse_rules("docs\n!docs/keep.md\n"));
        let result = discover_plain(temp.path(), &rules);
        assert_eq!(relatives(&result), vec!["docs/keep.md"]);
    }

    #[test]
    fn test_discover_negated_name_keeps_excluded_descendants() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), "lib/mod.rs", "");
        write_file(temp.path(), "lib/secret.env", "");
        write_file(temp.path(), "app.env", "");

        let rules = RuleSet::from_rules(&parse_rules("*.env\n!lib\n"));
        let result = discover_plain(temp.path(), &rules);
        assert_eq!(relatives(&result), vec!["lib/mod.rs"]);
    }

    #[test]
    fn test_discover_output_is_already_filtered() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), "a.log", "");
        write_file(temp.path(), "keep.log", "");
        write_file(temp.path(), "main.rs", "");

        let rules = RuleSet::from_rules(&parse_rules("*.log\n!keep.log\n"));
        let result = discover_plain(temp.path(), &rules);
        assert_eq!(relatives(&result), vec!["keep.log", "main.rs"]);
        assert_eq!(filter(result.clone(), &rules), result);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_symlinks() {
        let temp = tempdir().unwrap();
        write_file(temp.path(), "real/file.txt", "x");
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("linked_dir"))
            .unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("real/file.txt"),
            temp.path().join("linked.txt"),
        )
        .unwrap();

        let result = discover_plain(temp.path(), &RuleSet::new());
        assert_eq!(relatives(&result), vec!["real/file.txt"]);
    }

    #[test]
    fn test_filter_negation_precedence() {
        let candidates = vec![
            CandidateFile::new("/r/keep.txt", "keep.txt"),
            CandidateFile::new("/r/other.txt", "other.txt"),
            CandidateFile::new("/r/main.rs", "main.rs"),
        ];
        let rules = RuleSet::from_rules(&parse_rules("*.txt\n!keep.txt\n"));

        let kept = filter(candidates, &rules);
        assert_eq!(relatives(&kept), vec!["keep.txt", "main.rs"]);
    }

    #[test]
    fn test_filter_without_rules_keeps_everything() {
        let candidates = vec![CandidateFile::new("/r/a", "a")];
        assert_eq!(filter(candidates.clone(), &RuleSet::new()), candidates);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let candidates = vec![
            CandidateFile::new("/r/a.log", "a.log"),
            CandidateFile::new("/r/b.rs", "b.rs"),
        ];
        let rules = RuleSet::from_rules(&parse_rules("*.log\n"));
        let once = filter(candidates, &rules);
        let twice = filter(once.clone(), &rules);
        assert_eq!(once, twice);
    }
}
