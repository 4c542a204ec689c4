//! Persisted settings.
//!
//! Stored as camelCase JSON. Fields missing from the file fall back to their
//! defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SETTINGS_DIR: &str = ".kobo-highlights";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Vault-relative folder notes are written into. Empty means the vault root.
    pub storage_folder: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to access settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Folder '{0}' is not one of the vault's top-level folders")]
    UnknownFolder(String),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait SettingsStore {
    fn load(&self) -> Result<Settings, SettingsError>;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSettingsStore { path: path.into() }
    }

    pub fn in_vault(vault_root: &Path) -> Self {
        Self::new(vault_root.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "no settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, json).map_err(io_err)?;
        tracing::info!(path = ?self.path, storage_folder = %settings.storage_folder, "settings saved");
        Ok(())
    }
}

/// Stores `folder` as the destination if it is one of `choices`.
pub fn set_storage_folder(
    store: &dyn SettingsStore,
    choices: &[String],
    folder: &str,
) -> Result<Settings, SettingsError> {
    if !choices.iter().any(|c| c == folder) {
        return Err(SettingsError::UnknownFolder(folder.to_string()));
    }
    let mut settings = store.load()?;
    settings.storage_folder = folder.to_string();
    store.save(&settings)?;
    Ok(settings)
}
