use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

use crate::paths::normalize_extension;
use crate::slug::SlugStrategy;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where notes live: empty for the workspace root, relative to it, or absolute
    pub vault_root: String,
    /// Extension of note files, with or without the leading dot
    pub note_extension: String,
    pub slug_strategy: SlugStrategy,
    /// Format of daily notes
    pub dailynote: String,
    /// Daily notes folder, relative to the vault root
    pub daily_notes_folder: String,
}

impl Settings {
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/wikidex/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.wikidex",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("vault_root", "")?
            .set_default("note_extension", ".md")?
            .set_default("slug_strategy", "passthrough")?
            .set_default("dailynote", "%Y-%m-%d")?
            .set_default("daily_notes_folder", "")?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            vault_root: "".to_string(),
            note_extension: ".md".to_string(),
            slug_strategy: SlugStrategy::Passthrough,
            dailynote: "%Y-%m-%d".to_string(),
            daily_notes_folder: "".to_string(),
        }
    }
}

/// The configuration values note resolution depends on.
pub trait ConfigurationProvider {
    fn vault_root(&self) -> String;
    fn note_extension(&self) -> String;
    fn slug_strategy(&self) -> SlugStrategy;
}

impl ConfigurationProvider for Settings {
    fn vault_root(&self) -> String {
        self.vault_root.clone()
    }

    fn note_extension(&self) -> String {
        self.note_extension.clone()
    }

    fn slug_strategy(&self) -> SlugStrategy {
        self.slug_strategy
    }
}

/// Snapshot of the resolution settings, taken at the start of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub vault_root: String,
    /// Always starts with `.`
    pub note_extension: String,
    pub slug_strategy: SlugStrategy,
}

impl VaultConfig {
    pub fn snapshot(provider: &impl ConfigurationProvider) -> VaultConfig {
        VaultConfig {
            vault_root: provider.vault_root(),
            note_extension: normalize_extension(&provider.note_extension()),
            slug_strategy: provider.slug_strategy(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig::snapshot(&Settings::default())
    }
}
