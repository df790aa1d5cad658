//! Core types for the note index.
//!
//! - `NoteRecord`: one indexed note file
//! - `ScopeKey`: identifies one cached inventory

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::VaultConfig;

/// One note file found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteRecord {
    /// File name without the note extension.
    pub title: String,
    /// Absolute location of the file.
    pub path: PathBuf,
    /// Location relative to the search root, `/`-separated.
    pub relative_path: String,
}

impl NoteRecord {
    /// Number of `/`-separated segments in the relative path; `Note.md` is 1.
    pub fn depth(&self) -> usize {
        self.relative_path.split('/').count()
    }

    /// Directory segments of the relative path, excluding the file name.
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        let mut segments = self.relative_path.split('/').collect::<Vec<_>>();
        segments.pop();
        segments.into_iter()
    }

    /// `dir/Note` for `dir/Note.md`: how a link with a directory addresses this note.
    pub fn link_path(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(idx) => {
                let dir_len = idx + 1;
                &self.relative_path[..dir_len + self.title.len()]
            }
            None => &self.title,
        }
    }
}

/// Identifies the inventory of one (workspace, vault root, extension)
/// combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub workspace_root: PathBuf,
    pub vault_root: String,
    pub extension: String,
}

impl ScopeKey {
    pub fn new(workspace_root: &Path, config: &VaultConfig) -> ScopeKey {
        ScopeKey {
            workspace_root: workspace_root.to_path_buf(),
            vault_root: config.vault_root.trim().to_string(),
            extension: config.note_extension.clone(),
        }
    }

    /// The directory notes of this scope are scanned under.
    pub fn search_root(&self) -> PathBuf {
        crate::paths::resolve_root(&self.vault_root, &self.workspace_root)
    }
}
