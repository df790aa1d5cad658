mod helpers;
mod scanner;
mod types;

#[cfg(test)]
mod tests;

pub use helpers::{note_record, relative_note_path};
pub use scanner::{include_glob, DirectoryScanner, WalkDirScanner, DEFAULT_EXCLUDE_GLOB};
pub use types::{NoteRecord, ScopeKey};

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use tower_lsp::lsp_types::FileChangeType;
use tracing::{debug, warn};

use crate::completion::ranker::filter_and_rank;
use crate::config::VaultConfig;
use crate::paths::normalize_lexically;

/// Receives file-system notifications for note files.
///
/// Only creation and deletion matter to the index: titles and paths do not
/// depend on file content, so modifications are never forwarded.
pub trait NoteEventListener {
    fn on_create(&mut self, path: &Path);
    fn on_delete(&mut self, path: &Path);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    seq: u64,
    notes: Vec<NoteRecord>,
}

/// Cached note inventories, one per [`ScopeKey`].
#[derive(Debug, Default)]
pub struct NoteIndexCache {
    entries: HashMap<ScopeKey, CacheEntry>,
    /// Sequence number issued when a key was last invalidated; 0 if never.
    /// Holds every key a rebuild was started for.
    invalidated_at: HashMap<ScopeKey, u64>,
    next_seq: u64,
}

/// Permission to commit the result of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildTicket {
    key: ScopeKey,
    seq: u64,
}

impl RebuildTicket {
    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl NoteIndexCache {
    fn issue_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn get(&self, key: &ScopeKey) -> Option<&[NoteRecord]> {
        self.entries.get(key).map(|entry| entry.notes.as_slice())
    }

    pub fn begin_rebuild(&mut self, key: ScopeKey) -> RebuildTicket {
        let seq = self.issue_seq();
        self.invalidated_at.entry(key.clone()).or_insert(0);
        RebuildTicket { key, seq }
    }

    /// Store a scan result unless something newer has happened to its key
    /// since the ticket was issued. Returns whether the result was stored.
    pub fn commit_rebuild(&mut self, ticket: RebuildTicket, notes: Vec<NoteRecord>) -> bool {
        let RebuildTicket { key, seq } = ticket;

        if self
            .entries
            .get(&key)
            .is_some_and(|existing| existing.seq >= seq)
        {
            debug!(seq, "dropping stale note index rebuild");
            return false;
        }

        if self
            .invalidated_at
            .get(&key)
            .is_some_and(|&invalidated| invalidated > seq)
        {
            debug!(seq, "dropping note index rebuild started before invalidation");
            return false;
        }

        self.entries.insert(key, CacheEntry { seq, notes });
        true
    }

    pub fn invalidate(&mut self, key: &ScopeKey) {
        let seq = self.issue_seq();
        self.entries.remove(key);
        self.invalidated_at.insert(key.clone(), seq);
    }

    /// Invalidate every scope a created or deleted `path` belongs to.
    fn invalidate_for_path(&mut self, path: &Path) {
        let path = normalize_lexically(path);
        let affected = self
            .invalidated_at
            .keys()
            .filter(|key| {
                path.to_str()
                    .is_some_and(|path_str| path_str.ends_with(key.extension.as_str()))
                    && path.starts_with(key.search_root())
            })
            .cloned()
            .collect_vec();

        for key in affected {
            debug!(path = %path.display(), root = %key.search_root().display(), "invalidating note index");
            self.invalidate(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finds note files under a workspace, by exact title or by prefix.
///
/// Inventories are scanned lazily on first use and kept until a create or
/// delete event arrives for their scope.
#[derive(Debug)]
pub struct NoteIndex<S: DirectoryScanner = WalkDirScanner> {
    scanner: S,
    workspace_root: PathBuf,
    cache: NoteIndexCache,
}

impl NoteIndex<WalkDirScanner> {
    pub fn new(workspace_root: &Path) -> Self {
        NoteIndex::with_scanner(workspace_root, WalkDirScanner)
    }
}

impl<S: DirectoryScanner> NoteIndex<S> {
    pub fn with_scanner(workspace_root: &Path, scanner: S) -> Self {
        NoteIndex {
            scanner,
            workspace_root: workspace_root.to_path_buf(),
            cache: NoteIndexCache::default(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn scope_key(&self, scope: &VaultConfig) -> ScopeKey {
        ScopeKey::new(&self.workspace_root, scope)
    }

    pub fn search_root(&self, scope: &VaultConfig) -> PathBuf {
        self.scope_key(scope).search_root()
    }

    pub fn cache(&self) -> &NoteIndexCache {
        &self.cache
    }

    /// Start a rebuild whose result is committed with [`Self::commit_rebuild`].
    /// Hosts that scan off the main context use this pair directly.
    pub fn begin_rebuild(&mut self, scope: &VaultConfig) -> RebuildTicket {
        let key = self.scope_key(scope);
        self.cache.begin_rebuild(key)
    }

    pub fn commit_rebuild(&mut self, ticket: RebuildTicket, notes: Vec<NoteRecord>) -> bool {
        self.cache.commit_rebuild(ticket, notes)
    }

    /// Scan the scope's search root. `None` when the scanner failed.
    pub fn scan(&self, scope: &VaultConfig) -> Option<Vec<NoteRecord>> {
        let root = self.search_root(scope);
        let extension = &scope.note_extension;

        match self
            .scanner
            .scan(&root, &include_glob(extension), DEFAULT_EXCLUDE_GLOB)
        {
            Ok(paths) => Some(
                paths
                    .iter()
                    .flat_map(|path| note_record(&root, path, extension))
                    .sorted_by(|a, b| a.relative_path.cmp(&b.relative_path))
                    .collect(),
            ),
            Err(err) => {
                warn!(root = %root.display(), error = %err, "note scan failed");
                None
            }
        }
    }

    /// Scan now and replace the cached inventory. Failed scans are not cached.
    pub fn rebuild_index(&mut self, scope: &VaultConfig) -> Vec<NoteRecord> {
        let ticket = self.begin_rebuild(scope);

        match self.scan(scope) {
            Some(notes) => {
                debug!(count = notes.len(), "rebuilt note index");
                self.commit_rebuild(ticket, notes.clone());
                notes
            }
            None => Vec::new(),
        }
    }

    /// Cached inventory for the scope, scanning first if there is none.
    pub fn notes(&mut self, scope: &VaultConfig) -> &[NoteRecord] {
        let key = self.scope_key(scope);
        if self.cache.get(&key).is_none() {
            self.rebuild_index(scope);
        }
        self.cache.get(&key).unwrap_or_default()
    }

    /// The note titled exactly `title`. Among several, the shallowest wins,
    /// then the lexicographically smallest relative path.
    pub fn find_exact(&mut self, title: &str, scope: &VaultConfig) -> Option<NoteRecord> {
        self.notes(scope)
            .iter()
            .filter(|note| note.title == title)
            .min_by(|a, b| {
                a.depth()
                    .cmp(&b.depth())
                    .then_with(|| a.relative_path.cmp(&b.relative_path))
            })
            .cloned()
    }

    /// The note addressed by a `dir/Page` link, matched against the relative
    /// path without extension.
    pub fn find_by_relative_path(
        &mut self,
        link_path: &str,
        scope: &VaultConfig,
    ) -> Option<NoteRecord> {
        let link_path = link_path.trim_start_matches("./").trim_start_matches('/');

        self.notes(scope)
            .iter()
            .find(|note| note.link_path() == link_path)
            .cloned()
    }

    /// Ranked notes matching a typed prefix; see [`filter_and_rank`].
    pub fn find_by_prefix(
        &mut self,
        prefix: &str,
        scope: &VaultConfig,
        max_results: usize,
    ) -> Vec<NoteRecord> {
        filter_and_rank(self.notes(scope), prefix, max_results)
    }
}

impl<S: DirectoryScanner> NoteEventListener for NoteIndex<S> {
    fn on_create(&mut self, path: &Path) {
        self.cache.invalidate_for_path(path);
    }

    fn on_delete(&mut self, path: &Path) {
        self.cache.invalidate_for_path(path);
    }
}

/// Forward a watched-file event to `listener`. Only creations and deletions
/// are forwarded; returns whether the event was.
pub fn dispatch_file_event<L: NoteEventListener + ?Sized>(
    listener: &mut L,
    path: &Path,
    change: FileChangeType,
) -> bool {
    match change {
        FileChangeType::CREATED => listener.on_create(path),
        FileChangeType::DELETED => listener.on_delete(path),
        _ => {
            debug!(path = %path.display(), ?change, "ignoring note change event");
            return false;
        }
    }
    true
}
