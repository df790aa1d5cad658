//! Daily note naming.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::warn;

use crate::config::{Settings, VaultConfig};
use crate::paths;

const FALLBACK_FORMAT: &str = "%Y-%m-%d";

/// File stem of the daily note for `date`.
///
/// An unusable format string falls back to `%Y-%m-%d`.
pub fn daily_note_stem(format: &str, date: NaiveDate) -> String {
    let mut stem = String::new();
    if write!(stem, "{}", date.format(format)).is_ok() && !stem.trim().is_empty() {
        return stem;
    }

    warn!(format, "invalid daily note format, using {FALLBACK_FORMAT}");
    date.format(FALLBACK_FORMAT).to_string()
}

/// Where the daily note for `date` lives.
pub fn daily_note_path(settings: &Settings, workspace_root: &Path, date: NaiveDate) -> PathBuf {
    let config = VaultConfig::snapshot(settings);
    let stem = daily_note_stem(&settings.dailynote, date);
    let root = daily_root(&config.vault_root, &settings.daily_notes_folder);

    paths::resolve(&root, &stem, &config.note_extension, workspace_root)
}

/// The vault root with the daily folder appended, in configuration terms.
fn daily_root(vault_root: &str, daily_folder: &str) -> String {
    let vault_root = vault_root.trim();
    let daily_folder = daily_folder.trim();

    // Keep the separator of a bare root such as `/` or `C:\`.
    let stripped = vault_root.trim_end_matches(['/', '\\']);
    let vault_root = if stripped.is_empty() || stripped.ends_with(':') {
        vault_root
    } else {
        stripped
    };

    if daily_folder.is_empty() {
        vault_root.to_string()
    } else if vault_root.is_empty() || paths::is_absolute_root(daily_folder) {
        daily_folder.to_string()
    } else if vault_root.ends_with(['/', '\\']) {
        format!("{vault_root}{daily_folder}")
    } else {
        format!("{vault_root}/{daily_folder}")
    }
}

/// `today`, `tomorrow`, `yesterday`, or `next`/`last` plus the weekday within
/// a week of `today`.
pub fn relative_date_label(date: NaiveDate, today: NaiveDate) -> Option<String> {
    match (date - today).num_days() {
        0 => Some("today".to_string()),
        1 => Some("tomorrow".to_string()),
        -1 => Some("yesterday".to_string()),
        2..=7 => Some(format!("next {}", date.format("%A"))),
        -7..=-2 => Some(format!("last {}", date.format("%A"))),
        _ => None,
    }
}
