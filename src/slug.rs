//! File name strategies applied to page names before looking them up on disk.

use serde::{Deserialize, Serialize};

/// How a page name becomes a file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlugStrategy {
    /// `My Page` stays `My Page`.
    #[default]
    #[serde(rename = "passthrough")]
    Passthrough,
    /// `My Page` becomes `my-page`.
    #[serde(rename = "kebab-case")]
    KebabCase,
    /// `My Page` becomes `my_page`.
    #[serde(rename = "snake_case")]
    SnakeCase,
}

impl SlugStrategy {
    fn separator(self) -> Option<char> {
        match self {
            SlugStrategy::Passthrough => None,
            SlugStrategy::KebabCase => Some('-'),
            SlugStrategy::SnakeCase => Some('_'),
        }
    }
}

/// Characters that never survive into a slug.
const SPECIAL_CHARS: &[char] = &[
    '/', '\\', ':', '*', '?', '"', '<', '>', '|', '#', '^', '[', ']',
];

/// Turn a page name into a candidate file stem.
///
/// The result is not guaranteed to be a legal file name (passthrough keeps
/// everything); [`crate::paths::sanitize`] runs afterwards.
pub fn transform(page_name: &str, strategy: SlugStrategy) -> String {
    let Some(separator) = strategy.separator() else {
        return page_name.to_string();
    };

    let mut slug = String::with_capacity(page_name.len());
    let mut pending_separator = false;

    for c in page_name.chars() {
        if c.is_whitespace() || SPECIAL_CHARS.contains(&c) || c == separator {
            pending_separator = true;
            continue;
        }

        if pending_separator && !slug.is_empty() {
            slug.push(separator);
        }
        pending_separator = false;
        slug.extend(c.to_lowercase());
    }

    slug
}
