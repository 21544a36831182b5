use std::fs;
use std::path::{Path, PathBuf};

use crate::prelude::*;
use serde_json::{Map, Value};
use wmic_parser::{ResolvedSettings, SettingsNotice, SettingsStore};

/// Settings file names in priority order
const SETTINGS_FILENAMES: &[&str] = &["settings.json", "settings.yaml", "settings.yml"];

/// Shipped next to the binary as a starting point for `settings.json`.
const SETTINGS_TEMPLATE_FILENAME: &str = "settings.json.template";

/// Settings read from a file, either given explicitly or discovered in a directory.
#[derive(Debug, Clone)]
pub enum FileSettingsStore {
    /// `--settings PATH`: the file must exist.
    Explicit(PathBuf),
    /// First of [`SETTINGS_FILENAMES`] present in the directory, if any.
    Discovered { dir: PathBuf },
}

impl FileSettingsStore {
    pub fn new(settings_path_override: Option<&Path>, current_dir: &Path) -> Self {
        match settings_path_override {
            Some(path) => FileSettingsStore::Explicit(path.to_path_buf()),
            None => FileSettingsStore::Discovered {
                dir: current_dir.to_path_buf(),
            },
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        match self {
            FileSettingsStore::Explicit(path) => Some(path.clone()),
            FileSettingsStore::Discovered { dir } => SETTINGS_FILENAMES
                .iter()
                .map(|filename| dir.join(filename))
                .find(|candidate| candidate.exists()),
        }
    }

    /// Whether a settings template sits where a settings file was expected.
    pub fn has_template(&self) -> bool {
        match self {
            FileSettingsStore::Explicit(_) => false,
            FileSettingsStore::Discovered { dir } => dir.join(SETTINGS_TEMPLATE_FILENAME).exists(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn describe(&self) -> String {
        match self.locate() {
            Some(path) => path.display().to_string(),
            None => match self {
                FileSettingsStore::Explicit(path) => path.display().to_string(),
                FileSettingsStore::Discovered { dir } => {
                    format!("{} (no settings file)", dir.display())
                }
            },
        }
    }

    fn read(&self) -> Result<Option<Map<String, Value>>> {
        let Some(path) = self.locate() else {
            return Ok(None);
        };
        let content = fs::read(&path)
            .with_context(|| format!("Failed to read settings file at {}", path.display()))?;
        let settings = parse_settings(&path, &content)
            .with_context(|| format!("Failed to parse settings at {}", path.display()))?;
        debug!("Settings loaded from {}", path.display());
        Ok(Some(settings))
    }
}

fn parse_settings(path: &Path, content: &[u8]) -> Result<Map<String, Value>> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    let settings = if is_yaml {
        serde_yaml::from_slice(content)?
    } else {
        serde_json::from_slice(content)?
    };
    Ok(settings)
}

/// Resolve the settings for this run and log every notice.
pub fn load_settings(store: &FileSettingsStore) -> ResolvedSettings {
    let store_ref: &dyn SettingsStore = store;
    let resolved = wmic_parser::resolve(Some(store_ref));
    for notice in &resolved.notices {
        match notice {
            SettingsNotice::DefaultsInEffect => {
                if store.has_template() {
                    warn!(
                        "settings.json not found, create it from {SETTINGS_TEMPLATE_FILENAME} to customize the output"
                    );
                }
                debug!("{notice}");
            }
            SettingsNotice::ReadFailed { .. } | SettingsNotice::InvalidIndent { .. } => {
                warn!("{notice}")
            }
        }
    }
    resolved
}
