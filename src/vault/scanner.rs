//! Directory scanning for note files.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;

/// Directories holding dependencies rather than notes.
pub const DEFAULT_EXCLUDE_GLOB: &str = "**/node_modules/**";

/// `**/*.md` for `.md`.
pub fn include_glob(extension: &str) -> String {
    format!("**/*{}", Pattern::escape(extension))
}

/// Lists the files under a root that a note index is built from.
pub trait DirectoryScanner {
    /// Every file below `root` whose root-relative path matches `include` and
    /// does not match `exclude`.
    fn scan(&self, root: &Path, include: &str, exclude: &str) -> Result<Vec<PathBuf>, ScanError>;
}

/// Scans the local file system with `walkdir`. Hidden directories are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkDirScanner;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn compile(pattern: &str) -> Result<Pattern, ScanError> {
    Pattern::new(pattern).map_err(|source| ScanError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

impl DirectoryScanner for WalkDirScanner {
    fn scan(&self, root: &Path, include: &str, exclude: &str) -> Result<Vec<PathBuf>, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::MissingRoot(root.to_path_buf()));
        }

        let include = compile(include)?;
        let exclude = compile(exclude)?;

        // A directory is pruned when anything directly inside it would be excluded.
        let excluded_dir = |entry: &DirEntry| {
            entry.file_type().is_dir()
                && entry
                    .path()
                    .strip_prefix(root)
                    .is_ok_and(|rel| exclude.matches_path_with(&rel.join("_"), MATCH_OPTIONS))
        };

        let mut paths = Vec::new();

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(is_hidden(e) || excluded_dir(e)));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(ScanError::Walk {
                        path: root.to_path_buf(),
                        source,
                    })
                }
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry while scanning notes");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            if include.matches_path_with(relative, MATCH_OPTIONS)
                && !exclude.matches_path_with(relative, MATCH_OPTIONS)
            {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_utils::create_test_vault_dir;

    fn relative(root: &Path, paths: Vec<PathBuf>) -> Vec<String> {
        paths
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn finds_matching_files_recursively() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::create_dir_all(vault_dir.join("a/b")).unwrap();
        fs::write(vault_dir.join("top.md"), "").unwrap();
        fs::write(vault_dir.join("a/b/deep.md"), "").unwrap();
        fs::write(vault_dir.join("a/image.png"), "").unwrap();

        let found = WalkDirScanner
            .scan(&vault_dir, &include_glob(".md"), DEFAULT_EXCLUDE_GLOB)
            .unwrap();

        assert_eq!(relative(&vault_dir, found), vec!["a/b/deep.md", "top.md"]);
    }

    #[test]
    fn skips_dependency_and_hidden_directories() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::create_dir_all(vault_dir.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(vault_dir.join("docs/node_modules")).unwrap();
        fs::create_dir_all(vault_dir.join(".obsidian")).unwrap();
        fs::write(vault_dir.join("node_modules/pkg/README.md"), "").unwrap();
        fs::write(vault_dir.join("docs/node_modules/x.md"), "").unwrap();
        fs::write(vault_dir.join(".obsidian/workspace.md"), "").unwrap();
        fs::write(vault_dir.join("docs/kept.md"), "").unwrap();

        let found = WalkDirScanner
            .scan(&vault_dir, &include_glob(".md"), DEFAULT_EXCLUDE_GLOB)
            .unwrap();

        assert_eq!(relative(&vault_dir, found), vec!["docs/kept.md"]);
    }

    #[test]
    fn honours_other_extensions() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("a.md"), "").unwrap();
        fs::write(vault_dir.join("b.org"), "").unwrap();

        let found = WalkDirScanner
            .scan(&vault_dir, &include_glob(".org"), DEFAULT_EXCLUDE_GLOB)
            .unwrap();

        assert_eq!(relative(&vault_dir, found), vec!["b.org"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        let result = WalkDirScanner.scan(
            &vault_dir.join("absent"),
            &include_glob(".md"),
            DEFAULT_EXCLUDE_GLOB,
        );

        assert!(matches!(result, Err(ScanError::MissingRoot(_))));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        let result = WalkDirScanner.scan(&vault_dir, "**/[.md", DEFAULT_EXCLUDE_GLOB);

        assert!(matches!(result, Err(ScanError::Pattern { .. })));
    }
}
