//! Wikilink syntax: `[[Page]]`, `[[Page|Alias]]`, `[[Page#Heading]]`,
//! `[[Page#Heading|Alias]]`.
//!
//! [`parse`] decomposes the text between the brackets. The remaining functions
//! locate links inside a single line of a document, which is what navigation
//! and completion work with.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MalformedLinkError;

const ALIAS_SEPARATOR: char = '|';
const HEADING_SEPARATOR: char = '#';
const ESCAPE: char = '\\';

/// The parts of a wikilink.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedWikiLink {
    /// Never empty.
    pub page_name: String,
    /// `Some("")` for a trailing `#`.
    pub heading: Option<String>,
    /// `Some("")` for a trailing `|`.
    pub display_name: Option<String>,
}

impl ParsedWikiLink {
    pub fn is_alias(&self) -> bool {
        self.display_name.is_some()
    }

    /// Whether the page name addresses a note inside a directory, e.g. `dir/Page`.
    pub fn has_directory(&self) -> bool {
        self.page_name.contains('/')
    }
}

impl fmt::Display for ParsedWikiLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.page_name.replace(ALIAS_SEPARATOR, "\\|"))?;
        if let Some(heading) = &self.heading {
            write!(f, "#{}", heading.replace(ALIAS_SEPARATOR, "\\|"))?;
        }
        if let Some(display) = &self.display_name {
            write!(f, "|{}", display)?;
        }
        Ok(())
    }
}

/// Parse the raw text found between `[[` and `]]`.
///
/// The alias separator is the first `|` not preceded by a backslash. The
/// heading separator is the first `#` before it; a `#` inside the alias is
/// plain text.
pub fn parse(raw: &str) -> Result<ParsedWikiLink, MalformedLinkError> {
    if raw.trim().is_empty() {
        return Err(MalformedLinkError::Empty);
    }

    let (left, display_name) = match find_unescaped(raw, ALIAS_SEPARATOR) {
        Some(idx) => (&raw[..idx], Some(&raw[idx + ALIAS_SEPARATOR.len_utf8()..])),
        None => (raw, None),
    };

    let (page_name, heading) = match left.find(HEADING_SEPARATOR) {
        Some(idx) => (
            &left[..idx],
            Some(&left[idx + HEADING_SEPARATOR.len_utf8()..]),
        ),
        None => (left, None),
    };

    let page_name = unescape(page_name.trim());
    if page_name.is_empty() {
        return Err(MalformedLinkError::MissingPageName {
            raw: raw.to_string(),
        });
    }

    Ok(ParsedWikiLink {
        page_name,
        heading: heading.map(|heading| unescape(heading.trim())),
        display_name: display_name.map(|display| display.trim().to_string()),
    })
}

/// Byte index of the first `needle` that is not escaped with a backslash.
fn find_unescaped(haystack: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in haystack.char_indices() {
        match c {
            _ if escaped => escaped = false,
            ESCAPE => escaped = true,
            c if c == needle => return Some(idx),
            _ => {}
        }
    }
    None
}

fn unescape(segment: &str) -> String {
    segment.replace("\\|", "|")
}

/// Range of character offsets within one line.
pub type LineRange = std::ops::Range<usize>;

/// A `[[...]]` occurrence within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLinkSpan {
    /// Text between the brackets, unparsed.
    pub inner: String,
    /// Character range covering the brackets (and the `!` of an embed).
    pub range: LineRange,
    pub is_embed: bool,
}

impl WikiLinkSpan {
    pub fn parse(&self) -> Result<ParsedWikiLink, MalformedLinkError> {
        parse(&self.inner)
    }
}

static WIKILINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?<embed>!)?\[\[(?<inner>[^\[\]]+?)\]\]").unwrap());

static PARTIAL_WIKILINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?<prefix>[^\[\]\|#]*)$").unwrap());

/// All wikilinks in `line`, left to right.
pub fn wikilinks_in_line(line: &str) -> Vec<WikiLinkSpan> {
    WIKILINK_REGEX
        .captures_iter(line)
        .flat_map(|captures| {
            let full = captures.get(0)?;
            let inner = captures.name("inner")?;

            Some(WikiLinkSpan {
                inner: inner.as_str().to_string(),
                range: char_offset(line, full.start())..char_offset(line, full.end()),
                is_embed: captures.name("embed").is_some(),
            })
        })
        .collect()
}

/// The wikilink whose brackets surround `character`, if any.
pub fn wikilink_at(line: &str, character: usize) -> Option<WikiLinkSpan> {
    wikilinks_in_line(line)
        .into_iter()
        .find(|span| span.range.start <= character && character <= span.range.end)
}

/// An unclosed `[[prefix` immediately before the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialWikiLink {
    /// What has been typed after `[[`, possibly empty.
    pub prefix: String,
    /// Character range of `prefix`; the range to replace when completing.
    pub range: LineRange,
}

/// Detect an in-progress wikilink in the text up to the cursor.
///
/// Nothing is returned once the user has typed a `#` or `|`, since the page
/// part is then complete.
pub fn partial_wikilink(line_to_cursor: &str) -> Option<PartialWikiLink> {
    let captures = PARTIAL_WIKILINK_REGEX.captures(line_to_cursor)?;
    let prefix = captures.name("prefix")?;

    Some(PartialWikiLink {
        prefix: prefix.as_str().to_string(),
        range: char_offset(line_to_cursor, prefix.start())
            ..char_offset(line_to_cursor, prefix.end()),
    })
}

fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}
