//! Shared test utilities.
//!
//! Only compiled when running tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::vault::NoteIndex;

/// Creates a temporary vault directory for testing.
///
/// Returns the temp directory handle, which must be kept alive for the test,
/// and the path of a `vault` subdirectory inside it.
///
/// Scans skip hidden directories, and temp directories can live under paths
/// like `/tmp/.tmpXXXXX`, so notes go into a non-hidden subdirectory.
///
/// ```ignore
/// use crate::test_utils::create_test_vault_dir;
///
/// let (_temp_dir, vault_dir) = create_test_vault_dir();
/// std::fs::write(vault_dir.join("test.md"), "# Test").unwrap();
/// ```
pub fn create_test_vault_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let vault_dir = temp_dir.path().join("vault");
    fs::create_dir(&vault_dir).expect("Failed to create vault subdirectory");
    (temp_dir, vault_dir)
}

/// Creates a test vault and a [`NoteIndex`] rooted at it.
///
/// `setup_fn` receives the vault directory and can create files before the
/// index is built.
///
/// ```ignore
/// let (_temp_dir, vault_dir, mut index) = create_test_vault(|dir| {
///     std::fs::write(dir.join("test.md"), "# Test").unwrap();
/// });
/// ```
pub fn create_test_vault<F>(setup_fn: F) -> (TempDir, PathBuf, NoteIndex)
where
    F: FnOnce(&PathBuf),
{
    let (temp_dir, vault_dir) = create_test_vault_dir();
    setup_fn(&vault_dir);
    let index = NoteIndex::new(&vault_dir);
    (temp_dir, vault_dir, index)
}

/// Writes each `(relative path, content)` pair under `root`, creating parent
/// directories as needed.
pub fn write_notes(root: &std::path::Path, notes: &[(&str, &str)]) {
    for (relative_path, content) in notes {
        let path = root.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create note directory");
        }
        fs::write(&path, content).expect("Failed to write note");
    }
}
