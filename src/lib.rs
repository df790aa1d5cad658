//! wikidex: wikilink resolution and note addressing for Markdown vaults
//!
//! This crate provides the core of the wikidex language server: it turns
//! `[[Page#Heading|Alias]]` references into note files and back.
//!
//! # Overview
//!
//! - **Link syntax**: parsing wikilinks and locating them in a line
//! - **File names**: slug strategies and sanitized, cross-platform file names
//! - **Note index**: a lazily scanned, event-invalidated inventory of notes
//! - **Completion**: prefix ranking of notes for `[[` autocomplete
//! - **Navigation**: go-to-definition for links, including heading targets
//!
//! # Architecture
//!
//! - [`wikilink`]: link syntax
//! - [`slug`] and [`paths`]: from page names to file paths
//! - [`vault`]: the [`vault::NoteIndex`] and its cache
//! - [`completion`]: ranking and completion items
//! - [`gotodef`]: link resolution and navigation
//! - [`config`]: settings and the per-operation configuration snapshot
//!
//! # Usage
//!
//! ```ignore
//! use wikidex::config::{Settings, VaultConfig};
//! use wikidex::gotodef::resolve_page;
//! use wikidex::vault::NoteIndex;
//! use wikidex::wikilink::parse;
//!
//! let settings = Settings::new(&workspace)?;
//! let mut index = NoteIndex::new(&workspace);
//! let target = resolve_page(&mut index, &VaultConfig::snapshot(&settings), &parse("Page")?);
//! ```

// Note index
pub mod vault;

// LSP features
pub mod completion;
pub mod gotodef;

// Link syntax and file naming
pub mod paths;
pub mod position;
pub mod slug;
pub mod wikilink;

// Configuration, errors and utilities
pub mod config;
pub mod daily;
pub mod error;
pub mod logging;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
