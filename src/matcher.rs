use crate::error::AppbakError;
use crate::Result;
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Does an item string contain glob metacharacters?
///
/// Anything without `*` or `?` is treated as a literal relative path.
pub fn contains_wildcard(item: &str) -> bool {
    item.contains('*') || item.contains('?')
}

/// Translate a wildcard pattern into an anchored, case-insensitive regex.
///
/// `*` matches any run of characters excluding path separators, `?` exactly
/// one such character; every other character is literal. Separators in the
/// pattern are normalized to `/` so a pattern like `sub\*.log` and
/// `sub/*.log` mean the same thing.
pub fn wildcard_to_regex(pattern: &str) -> Result<Regex> {
    let normalized = pattern.replace('\\', "/");
    let escaped = regex::escape(&normalized)
        .replace(r"\*", "[^/]*")
        .replace(r"\?", "[^/]");

    RegexBuilder::new(&format!("^{escaped}$"))
        .case_insensitive(true)
        .build()
        .map_err(|_| AppbakError::InvalidPattern {
            pattern: pattern.to_string(),
        })
}

/// Enumerate every file and directory under `base` whose path relative to
/// `base` matches the wildcard pattern. Returns absolute paths.
pub fn find_matches(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let regex = wildcard_to_regex(pattern)?;
    let mut matches = Vec::new();

    for entry in WalkDir::new(base).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = relative_name(base, entry.path())?;
        if regex.is_match(&relative) {
            matches.push(entry.path().to_path_buf());
        }
    }

    Ok(matches)
}

/// Path relative to `base` with separators normalized to `/`.
pub fn relative_name(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        AppbakError::validation(format!(
            "{} is not under {}",
            path.display(),
            base.display()
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    fn setup_tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("a.log"), "a").unwrap();
        fs::write(sub.join("b.log"), "b").unwrap();
        dir
    }

    fn matched_names(base: &Path, pattern: &str) -> HashSet<String> {
        find_matches(base, pattern)
            .unwrap()
            .iter()
            .map(|path| relative_name(base, path).unwrap())
            .collect()
    }

    #[test]
    fn test_contains_wildcard() {
        assert!(contains_wildcard("*.log"));
        assert!(contains_wildcard("cache?"));
        assert!(contains_wildcard("sub/*.dat"));

        assert!(!contains_wildcard("config.ini"));
        assert!(!contains_wildcard("sub/settings.json"));
        assert!(!contains_wildcard(""));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let dir = setup_tree();

        // *.log matches nothing at the base level
        assert!(matched_names(dir.path(), "*.log").is_empty());

        // but sub/*.log matches both log files
        let matched = matched_names(dir.path(), "sub/*.log");
        assert_eq!(
            matched,
            ["sub/a.log", "sub/b.log"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        );
    }

    #[test]
    fn test_star_at_base_level() {
        let dir = setup_tree();

        let matched = matched_names(dir.path(), "*.txt");
        assert_eq!(matched, ["a.txt"].iter().map(|s| s.to_string()).collect());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let dir = setup_tree();

        let matched = matched_names(dir.path(), "*.TXT");
        assert_eq!(matched, ["a.txt"].iter().map(|s| s.to_string()).collect());

        let matched = matched_names(dir.path(), "SUB/*.Log");
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_star_matches_directories_too() {
        let dir = setup_tree();

        let matched = matched_names(dir.path(), "*");
        assert!(matched.contains("a.txt"));
        assert!(matched.contains("sub"));
        assert!(!matched.contains("sub/a.log"));
    }

    #[test]
    fn test_question_mark_single_character() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a1.dat"), "x").unwrap();
        fs::write(dir.path().join("a22.dat"), "x").unwrap();

        let matched = matched_names(dir.path(), "a?.dat");
        assert_eq!(matched, ["a1.dat"].iter().map(|s| s.to_string()).collect());
    }

    #[test]
    fn test_no_partial_matches() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("prefix_settings.json"), "x").unwrap();

        // the pattern must cover the full relative path
        assert!(matched_names(dir.path(), "settings.json").is_empty());
        assert!(matched_names(dir.path(), "prefix*").contains("prefix_settings.json"));
    }

    #[test]
    fn test_literal_regex_metacharacters_escaped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes (1).txt"), "x").unwrap();
        fs::write(dir.path().join("notes+1.txt"), "x").unwrap();

        let matched = matched_names(dir.path(), "notes (?).txt");
        assert_eq!(
            matched,
            ["notes (1).txt"].iter().map(|s| s.to_string()).collect()
        );

        let matched = matched_names(dir.path(), "notes+?.txt");
        assert_eq!(
            matched,
            ["notes+1.txt"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_backslash_pattern_normalized() {
        let dir = setup_tree();

        let matched = matched_names(dir.path(), "sub\\*.log");
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_zero_matches_is_empty_not_error() {
        let dir = setup_tree();
        assert!(find_matches(dir.path(), "*.nothing").unwrap().is_empty());
    }

    #[test]
    fn test_relative_name_rejects_outside_path() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();

        let result = relative_name(dir.path(), other.path());
        assert!(result.is_err());
    }
}
