//! Helper functions for turning scanned paths into note records.

use std::path::{Component, Path};

use pathdiff::diff_paths;

use super::NoteRecord;

/// `path` relative to `root`, joined with `/` regardless of platform.
pub fn relative_note_path(root: &Path, path: &Path) -> Option<String> {
    let diff = diff_paths(path, root)?;

    let segments = diff
        .components()
        .map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    Some(segments.join("/"))
}

/// Build a record for a file under `root` whose name ends with `extension`.
pub fn note_record(root: &Path, path: &Path, extension: &str) -> Option<NoteRecord> {
    let file_name = path.file_name()?.to_str()?;
    let title = file_name.strip_suffix(extension)?;
    if title.is_empty() {
        return None;
    }

    Some(NoteRecord {
        title: title.to_string(),
        path: path.to_path_buf(),
        relative_path: relative_note_path(root, path)?,
    })
}
