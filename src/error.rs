//! Error types for link parsing and note discovery.

use std::path::PathBuf;

use thiserror::Error;

/// The content of a `[[...]]` link could not be interpreted.
///
/// This is the only error that crosses the library boundary; callers usually
/// no-op or show a message to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLinkError {
    /// Nothing but whitespace between the brackets.
    #[error("wikilink is empty")]
    Empty,

    /// The link has a heading or alias but no page, e.g. `[[#Heading]]`.
    #[error("wikilink has no page name: {raw:?}")]
    MissingPageName { raw: String },
}

/// Errors reported by a [`DirectoryScanner`](crate::vault::DirectoryScanner).
///
/// The note index absorbs these and degrades to "no matches".
#[derive(Debug, Error)]
pub enum ScanError {
    /// The directory to scan does not exist.
    #[error("note root does not exist: {0}")]
    MissingRoot(PathBuf),

    /// Walking the directory tree failed.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// An include or exclude glob could not be compiled.
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
