use chrono::{Duration, NaiveDate};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemLabelDetails, CompletionTextEdit, Position,
    Range, TextEdit,
};

use crate::{
    config::VaultConfig,
    daily::{daily_note_stem, relative_date_label},
    paths,
    vault::{DirectoryScanner, NoteRecord},
    wikilink::{partial_wikilink, PartialWikiLink},
};

use super::{Context, MAX_COMPLETIONS};

/// Completes the page part of an unclosed `[[...` before the cursor.
pub struct WikiLinkCompleter {
    partial: PartialWikiLink,
    line_nr: u32,
    /// The text after the cursor already closes the link.
    closed: bool,
}

impl WikiLinkCompleter {
    pub fn construct(line: &str, line_nr: u32, character: usize) -> Option<Self> {
        let line_chars = line.chars().collect::<Vec<_>>();
        let line_to_cursor = line_chars.get(0..character)?;
        let after_cursor = line_chars.get(character..).unwrap_or_default();

        let partial = partial_wikilink(&String::from_iter(line_to_cursor))?;

        Some(WikiLinkCompleter {
            partial,
            line_nr,
            closed: after_cursor.starts_with(&[']', ']']),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.partial.prefix
    }

    fn has_directory(&self) -> bool {
        self.partial.prefix.contains(['/', '\\'])
    }

    pub fn completions<S: DirectoryScanner>(&self, context: Context<'_, S>) -> Vec<LinkCompletion> {
        let Context {
            index,
            settings,
            today,
        } = context;
        let scope = VaultConfig::snapshot(settings);

        let notes = index.find_by_prefix(self.prefix(), &scope, MAX_COMPLETIONS);

        let daily_notes = if self.has_directory() {
            Vec::new()
        } else {
            let prefix = self.prefix().to_lowercase();
            (-1..=1)
                .flat_map(|offset| Some(today + Duration::try_days(offset)?))
                .flat_map(|date| MDDailyNote::from_date(&settings.dailynote, date, today))
                .filter(|daily| {
                    daily.ref_name.to_lowercase().starts_with(&prefix)
                        || daily.match_string.to_lowercase().starts_with(&prefix)
                })
                .filter(|daily| !notes.iter().any(|note| note.title == daily.ref_name))
                .collect()
        };

        notes
            .into_iter()
            .map(LinkCompletion::Note)
            .chain(daily_notes.into_iter().map(LinkCompletion::DailyNote))
            .collect()
    }

    fn text_edit(&self, refname: &str) -> CompletionTextEdit {
        let suffix = if self.closed { "" } else { "]]" };

        CompletionTextEdit::Edit(TextEdit {
            range: Range {
                start: Position {
                    line: self.line_nr,
                    character: self.partial.range.start as u32,
                },
                end: Position {
                    line: self.line_nr,
                    character: self.partial.range.end as u32,
                },
            },
            new_text: format!("{refname}{suffix}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MDDailyNote {
    /// `today: 2024-01-02`
    match_string: String,
    /// `2024-01-02`, the file stem the daily note is created with
    ref_name: String,
}

impl MDDailyNote {
    fn from_date(format: &str, date: NaiveDate, today: NaiveDate) -> Option<MDDailyNote> {
        let ref_name = paths::sanitize(&daily_note_stem(format, date));
        let match_string = format!("{}: {}", relative_date_label(date, today)?, ref_name);

        Some(MDDailyNote {
            match_string,
            ref_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCompletion {
    Note(NoteRecord),
    DailyNote(MDDailyNote),
}

impl LinkCompletion {
    /// Text inserted between the brackets.
    fn refname<'a>(&'a self, completer: &WikiLinkCompleter) -> &'a str {
        match self {
            LinkCompletion::Note(note) if completer.has_directory() => note.link_path(),
            LinkCompletion::Note(note) => &note.title,
            LinkCompletion::DailyNote(daily) => &daily.ref_name,
        }
    }

    fn label(&self) -> &str {
        match self {
            LinkCompletion::Note(note) => &note.title,
            LinkCompletion::DailyNote(daily) => &daily.match_string,
        }
    }

    pub fn completion_item(&self, completer: &WikiLinkCompleter, rank: usize) -> CompletionItem {
        CompletionItem {
            label: self.label().to_string(),
            kind: Some(match self {
                LinkCompletion::Note(_) => CompletionItemKind::FILE,
                LinkCompletion::DailyNote(_) => CompletionItemKind::EVENT,
            }),
            label_details: match self {
                LinkCompletion::Note(note) if note.depth() > 1 => {
                    Some(CompletionItemLabelDetails {
                        detail: None,
                        description: Some(note.relative_path.clone()),
                    })
                }
                LinkCompletion::DailyNote(_) => Some(CompletionItemLabelDetails {
                    detail: Some(" (daily note)".to_string()),
                    description: None,
                }),
                LinkCompletion::Note(_) => None,
            },
            detail: match self {
                LinkCompletion::Note(note) => Some(note.relative_path.clone()),
                LinkCompletion::DailyNote(_) => None,
            },
            text_edit: Some(completer.text_edit(self.refname(completer))),
            filter_text: Some(completer.prefix().to_string()),
            sort_text: Some(format!("{rank:04}")),
            preselect: Some(rank == 0),
            ..Default::default()
        }
    }
}
