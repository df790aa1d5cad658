//! Conversion between protocol columns and character offsets.
//!
//! The library counts columns in characters. Clients count them in UTF-16
//! code units unless UTF-32 was negotiated.

use ropey::Rope;
use tower_lsp::lsp_types::{CompletionResponse, CompletionTextEdit, Position, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionEncoding {
    #[default]
    Utf16,
    Utf32,
}

impl PositionEncoding {
    /// Character offset of `column` in `line`. `None` past the end of the line.
    pub fn to_char_column(self, line: &str, column: u32) -> Option<usize> {
        let column = column as usize;
        match self {
            PositionEncoding::Utf32 => (column <= line.chars().count()).then_some(column),
            PositionEncoding::Utf16 => {
                let rope = Rope::from_str(line);
                (column <= rope.len_utf16_cu()).then(|| rope.utf16_cu_to_char(column))
            }
        }
    }

    /// Protocol column of the character offset `char_column` in `line`.
    pub fn from_char_column(self, line: &str, char_column: usize) -> u32 {
        let column = match self {
            PositionEncoding::Utf32 => char_column,
            PositionEncoding::Utf16 => {
                let rope = Rope::from_str(line);
                rope.char_to_utf16_cu(char_column.min(rope.len_chars()))
            }
        };
        u32::try_from(column).unwrap_or(u32::MAX)
    }

    /// `position` with its column counted in characters.
    pub fn to_char_position(self, line: &str, position: Position) -> Option<Position> {
        let character = self.to_char_column(line, position.character)?;
        Some(Position {
            line: position.line,
            character: u32::try_from(character).ok()?,
        })
    }

    /// Re-encode the edit ranges of completion items computed on `line`.
    pub fn encode_completions(self, line: &str, response: &mut CompletionResponse) {
        if self == PositionEncoding::Utf32 {
            return;
        }

        let items = match response {
            CompletionResponse::Array(items) => items,
            CompletionResponse::List(list) => &mut list.items,
        };

        let encode_range = |range: &mut Range| {
            range.start.character = self.from_char_column(line, range.start.character as usize);
            range.end.character = self.from_char_column(line, range.end.character as usize);
        };

        for item in items {
            match item.text_edit.as_mut() {
                Some(CompletionTextEdit::Edit(edit)) => encode_range(&mut edit.range),
                Some(CompletionTextEdit::InsertAndReplace(edit)) => {
                    encode_range(&mut edit.insert);
                    encode_range(&mut edit.replace);
                }
                None => {}
            }
        }
    }
}
