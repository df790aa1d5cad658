use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{Location, Position, Range, Url};
use tracing::debug;

use crate::config::VaultConfig;
use crate::paths;
use crate::slug;
use crate::vault::{DirectoryScanner, NoteIndex, NoteRecord};
use crate::wikilink::{wikilink_at, ParsedWikiLink};

/// Where a wikilink points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An indexed note.
    Existing(NoteRecord),
    /// No note yet; the path one would be created at.
    Missing(PathBuf),
}

impl Resolution {
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Existing(note) => &note.path,
            Resolution::Missing(path) => path,
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, Resolution::Existing(_))
    }
}

/// Resolve the page of a parsed link.
///
/// Links with a directory (`dir/Page`) first try the note at exactly that
/// relative path. Then the slugged page name is looked up by title, then the
/// page name as written.
pub fn resolve_page<S: DirectoryScanner>(
    index: &mut NoteIndex<S>,
    scope: &VaultConfig,
    link: &ParsedWikiLink,
) -> Resolution {
    let page_name = link.page_name.as_str();
    let (directory, name) = page_name.rsplit_once('/').unwrap_or(("", page_name));
    let stem = slug::transform(name, scope.slug_strategy);

    if link.has_directory() {
        let slugged_path = format!("{directory}/{stem}");
        let found = index
            .find_by_relative_path(page_name, scope)
            .or_else(|| index.find_by_relative_path(&slugged_path, scope));
        if let Some(note) = found {
            return Resolution::Existing(note);
        }
    }

    if let Some(note) = index.find_exact(&stem, scope) {
        return Resolution::Existing(note);
    }

    if stem != name {
        if let Some(note) = index.find_exact(name, scope) {
            return Resolution::Existing(note);
        }
    }

    Resolution::Missing(missing_note_path(index.workspace_root(), scope, directory, &stem))
}

fn missing_note_path(
    workspace_root: &Path,
    scope: &VaultConfig,
    directory: &str,
    stem: &str,
) -> PathBuf {
    let target = paths::resolve(&scope.vault_root, stem, &scope.note_extension, workspace_root);

    let Some(file_name) = target.file_name() else {
        return target;
    };

    let mut path = paths::resolve_root(&scope.vault_root, workspace_root);
    for segment in directory.split('/') {
        match segment.trim() {
            "" | "." | ".." => continue,
            segment => path.push(paths::sanitize(segment)),
        }
    }
    path.push(file_name);
    path
}

static HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}[ \t]+(?<text>.*?)[ \t#]*$").unwrap());

/// Zero-based line of the first ATX heading whose text matches, ignoring case.
/// Headings inside fenced code blocks are skipped.
pub fn find_heading_line(text: &str, heading: &str) -> Option<u32> {
    let heading = heading.trim().to_lowercase();
    let mut in_fence = false;

    for (line_nr, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        let matches = HEADING_REGEX
            .captures(line)
            .and_then(|captures| captures.name("text"))
            .is_some_and(|text| text.as_str().trim().to_lowercase() == heading);

        if matches {
            return u32::try_from(line_nr).ok();
        }
    }

    None
}

/// Location of the note (or heading) referenced by the wikilink under the
/// cursor. `line` is the text of the cursor's line.
pub fn goto_definition<S: DirectoryScanner>(
    index: &mut NoteIndex<S>,
    scope: &VaultConfig,
    line: &str,
    cursor_position: Position,
) -> Option<Location> {
    let span = wikilink_at(line, cursor_position.character as usize)?;

    let link = match span.parse() {
        Ok(link) => link,
        Err(err) => {
            debug!(%err, "ignoring malformed wikilink under cursor");
            return None;
        }
    };

    let note = match resolve_page(index, scope, &link) {
        Resolution::Existing(note) => note,
        Resolution::Missing(path) => {
            debug!(page = %link.page_name, path = %path.display(), "wikilink target does not exist");
            return None;
        }
    };

    let heading_line = link
        .heading
        .as_deref()
        .filter(|heading| !heading.is_empty())
        .and_then(|heading| {
            let text = std::fs::read_to_string(&note.path).ok()?;
            find_heading_line(&text, heading)
        })
        .unwrap_or(0);

    Some(Location {
        uri: Url::from_file_path(&note.path).ok()?,
        range: Range {
            start: Position {
                line: heading_line,
                character: 0,
            },
            end: Position {
                line: heading_line,
                character: 1,
            },
        },
    })
}
