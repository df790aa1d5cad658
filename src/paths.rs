//! Joining a configured vault root with a note file name.
//!
//! The vault root may be unset, relative to the workspace, or absolute on any
//! platform (`/notes`, `C:\notes`, `\\server\share`, `~/notes`). The file name
//! is always passed through [`sanitize`], whatever slug strategy produced it.

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest file name, in characters, that [`sanitize`] produces.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Fallback for names that sanitize to nothing.
pub const UNTITLED: &str = "untitled";

/// Extension used when none is configured.
pub const DEFAULT_EXTENSION: &str = ".md";

const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

static DRIVE_LETTER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]:[\\/]").unwrap());

/// Make `name` safe to use as a file name on every platform.
///
/// Idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        let c = if c.is_control() || ILLEGAL_CHARS.contains(&c) {
            '-'
        } else {
            c
        };

        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push(' ');
            }
            in_whitespace = true;
        } else {
            sanitized.push(c);
            in_whitespace = false;
        }
    }

    let mut sanitized = strip_trailing_periods(sanitized.trim_start()).to_string();

    if sanitized.chars().count() > MAX_FILE_NAME_LEN {
        sanitized = truncate_chars(&sanitized, MAX_FILE_NAME_LEN);
    }

    if sanitized.is_empty() {
        return UNTITLED.to_string();
    }

    if is_reserved(&sanitized) {
        if sanitized.chars().count() >= MAX_FILE_NAME_LEN {
            sanitized = truncate_chars(&sanitized, MAX_FILE_NAME_LEN - 1);
        }
        sanitized.insert(0, '_');
    }

    sanitized
}

fn strip_trailing_periods(name: &str) -> &str {
    name.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

fn truncate_chars(name: &str, max: usize) -> String {
    let truncated: String = name.chars().take(max).collect();
    strip_trailing_periods(&truncated).to_string()
}

fn is_reserved(name: &str) -> bool {
    let base = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(base))
}

/// Whether a configured root is absolute on any supported platform.
pub fn is_absolute_root(root: &str) -> bool {
    root.starts_with('/') || root.starts_with(r"\\") || DRIVE_LETTER_REGEX.is_match(root)
}

/// `".md"` for `"md"`, `".md"` and `""`.
pub fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim();
    match extension {
        "" | "." => DEFAULT_EXTENSION.to_string(),
        ext if ext.starts_with('.') => ext.to_string(),
        ext => format!(".{ext}"),
    }
}

/// The directory a vault root refers to.
pub fn resolve_root(vault_root: &str, workspace_root: &Path) -> PathBuf {
    let vault_root = vault_root.trim();
    if vault_root.is_empty() {
        return normalize_lexically(workspace_root);
    }

    let expanded = shellexpand::tilde(vault_root);
    if is_absolute_root(&expanded) {
        normalize_lexically(Path::new(expanded.as_ref()))
    } else {
        normalize_lexically(&workspace_root.join(expanded.as_ref()))
    }
}

/// `path` with `.` segments dropped and each `..` applied to the segment
/// before it, without touching the file system. `..` never climbs above a
/// root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// The path a note with `stem` lives at under `vault_root`.
pub fn resolve(vault_root: &str, stem: &str, extension: &str, workspace_root: &Path) -> PathBuf {
    let file_name = format!("{}{}", sanitize(stem), normalize_extension(extension));
    resolve_root(vault_root, workspace_root).join(file_name)
}
