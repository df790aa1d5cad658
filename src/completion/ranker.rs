//! Prefix filtering and ranking of notes for autocomplete.

use itertools::Itertools;

use crate::vault::NoteRecord;

/// Why a note matched a prefix. Earlier variants rank higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    /// Title equals the name prefix, ignoring case.
    Exact,
    /// Title starts with the name prefix.
    Partial,
    /// One of the note's directories starts with the name prefix.
    Directory,
}

/// A typed prefix split at its last `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SplitPrefix {
    /// Lowercased, without the trailing separator; empty if none was typed.
    directory: String,
    /// Lowercased remainder after the last separator.
    name: String,
}

impl SplitPrefix {
    fn new(prefix: &str) -> SplitPrefix {
        let prefix = prefix.replace('\\', "/").to_lowercase();

        match prefix.rsplit_once('/') {
            Some((directory, name)) => SplitPrefix {
                directory: directory.to_string(),
                name: name.to_string(),
            },
            None => SplitPrefix {
                directory: String::new(),
                name: prefix,
            },
        }
    }
}

fn match_kind(note: &NoteRecord, prefix: &SplitPrefix) -> Option<MatchKind> {
    if !prefix.directory.is_empty() {
        let required = format!("{}/", prefix.directory);
        if !note.relative_path.to_lowercase().starts_with(&required) {
            return None;
        }
    }

    let title = note.title.to_lowercase();
    if title == prefix.name {
        return Some(MatchKind::Exact);
    }
    if title.starts_with(&prefix.name) {
        return Some(MatchKind::Partial);
    }

    if prefix.directory.is_empty()
        && note
            .directories()
            .any(|dir| dir.to_lowercase().starts_with(&prefix.name))
    {
        return Some(MatchKind::Directory);
    }

    None
}

/// Notes matching `prefix`, best first, at most `max_results` of them.
///
/// A prefix such as `projects/pl` only considers notes under `projects/`; a
/// trailing `/` lists everything below the directory. Without a directory
/// part, notes inside a directory whose name starts with the prefix match
/// too, ranked after every title match.
pub fn filter_and_rank(
    all_notes: &[NoteRecord],
    prefix: &str,
    max_results: usize,
) -> Vec<NoteRecord> {
    let prefix = SplitPrefix::new(prefix);

    all_notes
        .iter()
        .unique_by(|note| note.relative_path.as_str())
        .flat_map(|note| Some((match_kind(note, &prefix)?, note)))
        .sorted_by(|(kind_a, a), (kind_b, b)| {
            kind_a
                .cmp(kind_b)
                .then_with(|| a.depth().cmp(&b.depth()))
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        })
        .take(max_results)
        .map(|(_, note)| note.clone())
        .collect()
}
