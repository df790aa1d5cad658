use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tower_lsp::lsp_types::FileChangeType;

use crate::config::VaultConfig;
use crate::error::ScanError;
use crate::test_utils::{create_test_vault, write_notes};
use crate::vault::{dispatch_file_event, DirectoryScanner, NoteEventListener, NoteIndex};

/// Serves a fixed file list and counts how often it was asked.
#[derive(Debug, Default, Clone)]
struct MockScanner {
    files: Rc<RefCell<Vec<PathBuf>>>,
    scans: Rc<Cell<usize>>,
    fail: Rc<Cell<bool>>,
}

impl MockScanner {
    fn with_files(files: &[&str]) -> MockScanner {
        let scanner = MockScanner::default();
        scanner
            .files
            .borrow_mut()
            .extend(files.iter().map(PathBuf::from));
        scanner
    }

    fn add(&self, file: &str) {
        self.files.borrow_mut().push(PathBuf::from(file));
    }
}

impl DirectoryScanner for MockScanner {
    fn scan(&self, root: &Path, _include: &str, _exclude: &str) -> Result<Vec<PathBuf>, ScanError> {
        self.scans.set(self.scans.get() + 1);
        if self.fail.get() {
            return Err(ScanError::MissingRoot(root.to_path_buf()));
        }

        Ok(self
            .files
            .borrow()
            .iter()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect())
    }
}

fn mock_index(files: &[&str]) -> (NoteIndex<MockScanner>, MockScanner) {
    let scanner = MockScanner::with_files(files);
    (NoteIndex::with_scanner(Path::new("/ws"), scanner.clone()), scanner)
}

fn scoped(vault_root: &str) -> VaultConfig {
    VaultConfig {
        vault_root: vault_root.to_string(),
        ..VaultConfig::default()
    }
}

#[test]
fn scans_lazily_and_once() {
    let (mut index, scanner) = mock_index(&["/ws/A.md", "/ws/dir/B.md"]);
    let scope = VaultConfig::default();
    assert_eq!(scanner.scans.get(), 0);

    let notes = index.notes(&scope);
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[1].relative_path, "dir/B.md");

    index.find_exact("A", &scope);
    index.find_by_prefix("b", &scope, 10);
    assert_eq!(scanner.scans.get(), 1);
}

#[test]
fn find_exact_prefers_shallowest_then_path_order() {
    let (mut index, _) = mock_index(&["/ws/a/b/Note.md", "/ws/z/Note.md", "/ws/c/Note.md"]);
    let scope = VaultConfig::default();

    let found = index.find_exact("Note", &scope).unwrap();
    assert_eq!(found.relative_path, "c/Note.md");

    let (mut index, _) = mock_index(&["/ws/a/b/Note.md", "/ws/Note.md"]);
    let found = index.find_exact("Note", &scope).unwrap();
    assert_eq!(found.path, PathBuf::from("/ws/Note.md"));
}

#[test]
fn find_exact_is_case_sensitive() {
    let (mut index, _) = mock_index(&["/ws/Note.md"]);
    let scope = VaultConfig::default();

    assert!(index.find_exact("Note", &scope).is_some());
    assert!(index.find_exact("note", &scope).is_none());
}

#[test]
fn find_by_relative_path_uses_link_form() {
    let (mut index, _) = mock_index(&["/ws/a/Note.md", "/ws/Note.md"]);
    let scope = VaultConfig::default();

    let found = index.find_by_relative_path("./a/Note", &scope).unwrap();
    assert_eq!(found.relative_path, "a/Note.md");
    assert!(index.find_by_relative_path("b/Note", &scope).is_none());
}

#[test]
fn create_event_invalidates_matching_scope() {
    let (mut index, scanner) = mock_index(&["/ws/A.md"]);
    let scope = VaultConfig::default();
    assert!(index.find_exact("New", &scope).is_none());

    scanner.add("/ws/New.md");
    index.on_create(Path::new("/ws/New.md"));

    assert!(index.find_exact("New", &scope).is_some());
    assert_eq!(scanner.scans.get(), 2);
}

#[test]
fn delete_event_invalidates_matching_scope() {
    let (mut index, scanner) = mock_index(&["/ws/A.md", "/ws/Gone.md"]);
    let scope = VaultConfig::default();
    assert!(index.find_exact("Gone", &scope).is_some());

    scanner.files.borrow_mut().retain(|p| !p.ends_with("Gone.md"));
    index.on_delete(Path::new("/ws/Gone.md"));

    assert!(index.find_exact("Gone", &scope).is_none());
}

#[test]
fn events_outside_scope_keep_cache() {
    let (mut index, scanner) = mock_index(&["/ws/notes/A.md"]);
    let scope = scoped("notes");
    index.notes(&scope);

    index.on_create(Path::new("/ws/notes/picture.png"));
    index.on_create(Path::new("/ws/Outside.md"));
    index.on_delete(Path::new("/other/notes/A.md"));
    index.notes(&scope);

    assert_eq!(scanner.scans.get(), 1);
}

#[test]
fn events_before_first_scan_are_harmless() {
    let (mut index, scanner) = mock_index(&["/ws/A.md"]);
    index.on_create(Path::new("/ws/B.md"));
    index.on_delete(Path::new("/ws/A.md"));

    assert_eq!(index.notes(&VaultConfig::default()).len(), 1);
    assert_eq!(scanner.scans.get(), 1);
}

#[test]
fn failed_scan_is_empty_and_not_cached() {
    let (mut index, scanner) = mock_index(&["/ws/A.md"]);
    let scope = VaultConfig::default();
    scanner.fail.set(true);

    assert!(index.notes(&scope).is_empty());
    assert!(index.find_exact("A", &scope).is_none());
    assert_eq!(scanner.scans.get(), 2);
    assert!(index.cache().is_empty());

    scanner.fail.set(false);
    assert!(index.find_exact("A", &scope).is_some());
}

#[test]
fn scopes_are_cached_separately() {
    let (mut index, scanner) = mock_index(&["/ws/Top.md", "/ws/notes/Inner.md"]);

    assert_eq!(index.notes(&VaultConfig::default()).len(), 2);
    assert_eq!(index.notes(&scoped("notes")).len(), 1);
    assert_eq!(index.cache().len(), 2);
    assert_eq!(scanner.scans.get(), 2);

    index.on_create(Path::new("/ws/Another.md"));
    assert_eq!(index.cache().len(), 1);
}

#[test]
fn file_system_index_tracks_created_notes() {
    let (_temp_dir, vault_dir, mut index) = create_test_vault(|dir| {
        write_notes(
            dir,
            &[
                ("Home.md", "# Home"),
                ("projects/Plan.md", ""),
                ("node_modules/pkg/README.md", ""),
                (".obsidian/Hidden.md", ""),
            ],
        );
    });
    let scope = VaultConfig::default();

    let titles = index
        .notes(&scope)
        .iter()
        .map(|note| note.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Home", "Plan"]);

    let new_note = vault_dir.join("projects/Later.md");
    fs::write(&new_note, "").unwrap();
    assert!(index.find_exact("Later", &scope).is_none());

    index.on_create(&new_note);
    assert_eq!(index.find_exact("Later", &scope).unwrap().path, new_note);
}

#[test]
fn parent_relative_vault_root_still_invalidates() {
    let scanner = MockScanner::with_files(&["/ws/notes/A.md"]);
    let mut index = NoteIndex::with_scanner(Path::new("/ws/app"), scanner.clone());
    let scope = scoped("../notes");

    assert!(index.find_exact("A", &scope).is_some());
    assert_eq!(index.search_root(&scope), PathBuf::from("/ws/notes"));

    scanner.add("/ws/notes/New.md");
    index.on_create(Path::new("/ws/notes/New.md"));

    assert!(index.find_exact("New", &scope).is_some());
    assert_eq!(scanner.scans.get(), 2);
}

#[test]
fn event_paths_are_normalized_before_matching() {
    let (mut index, scanner) = mock_index(&["/ws/notes/A.md"]);
    let scope = scoped("notes");
    index.notes(&scope);

    index.on_delete(Path::new("/ws/other/../notes/./A.md"));
    index.notes(&scope);

    assert_eq!(scanner.scans.get(), 2);
}

#[test]
fn cached_queries_share_one_inventory() {
    let (mut index, scanner) = mock_index(&["/ws/A.md", "/ws/B.md"]);
    let scope = VaultConfig::default();

    let first = index.notes(&scope).as_ptr();
    index.find_exact("A", &scope);
    index.find_by_prefix("b", &scope, 10);
    let second = index.notes(&scope).as_ptr();

    assert_eq!(first, second);
    assert_eq!(scanner.scans.get(), 1);
}

#[test]
fn only_create_and_delete_events_are_dispatched() {
    let (mut index, scanner) = mock_index(&["/ws/A.md"]);
    let scope = VaultConfig::default();
    index.notes(&scope);
    let path = Path::new("/ws/A.md");

    assert!(!dispatch_file_event(&mut index, path, FileChangeType::CHANGED));
    index.notes(&scope);
    assert_eq!(scanner.scans.get(), 1);

    assert!(dispatch_file_event(&mut index, path, FileChangeType::CREATED));
    index.notes(&scope);
    assert_eq!(scanner.scans.get(), 2);

    assert!(dispatch_file_event(&mut index, path, FileChangeType::DELETED));
    index.notes(&scope);
    assert_eq!(scanner.scans.get(), 3);
}

#[derive(Default)]
struct RecordingListener {
    events: Vec<String>,
}

impl NoteEventListener for RecordingListener {
    fn on_create(&mut self, path: &Path) {
        self.events.push(format!("create {}", path.display()));
    }

    fn on_delete(&mut self, path: &Path) {
        self.events.push(format!("delete {}", path.display()));
    }
}

#[test]
fn dispatch_maps_event_types_to_listener_calls() {
    let mut listener = RecordingListener::default();
    let path = Path::new("/ws/Note.md");

    dispatch_file_event(&mut listener, path, FileChangeType::CREATED);
    dispatch_file_event(&mut listener, path, FileChangeType::CHANGED);
    dispatch_file_event(&mut listener, path, FileChangeType::DELETED);

    assert_eq!(
        listener.events,
        vec!["create /ws/Note.md", "delete /ws/Note.md"]
    );
}
