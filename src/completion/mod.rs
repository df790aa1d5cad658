use chrono::NaiveDate;
use tower_lsp::lsp_types::{CompletionItem, CompletionList, CompletionResponse, Position};

use crate::{
    config::Settings,
    vault::{DirectoryScanner, NoteIndex},
};

use self::link_completer::WikiLinkCompleter;

mod link_completer;
pub mod ranker;

/// Most completion items returned for one request.
pub const MAX_COMPLETIONS: usize = 20;

pub struct Context<'a, S: DirectoryScanner> {
    pub index: &'a mut NoteIndex<S>,
    pub settings: &'a Settings,
    /// Anchors daily note suggestions.
    pub today: NaiveDate,
}

/// Completions for the cursor at `position`, where `line` is the text of the
/// cursor's line. `None` outside an unclosed wikilink.
pub fn get_completions<S: DirectoryScanner>(
    context: Context<'_, S>,
    line: &str,
    position: Position,
) -> Option<CompletionResponse> {
    let completer =
        WikiLinkCompleter::construct(line, position.line, position.character as usize)?;

    let completions = completer
        .completions(context)
        .iter()
        .take(MAX_COMPLETIONS)
        .enumerate()
        .map(|(rank, completable)| completable.completion_item(&completer, rank))
        .collect::<Vec<CompletionItem>>();

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: true,
        items: completions,
    }))
}
