//! CLI settings stored under `<settingsRoot>/.bkit/settings.json`
//!
//! Loaded once per invocation and handed to commands through the session.
//! Only the `settings` command writes the file back.

use crate::bkit::fsutil;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const STATE_DIR: &str = ".bkit";
pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_LANGUAGE: &str = "en_US";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory searched for projects instead of the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: default_language(),
            project_root: None,
        }
    }
}

/// Settings plus the root they were loaded from
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsContext {
    root: PathBuf,
    pub settings: Settings,
}

impl SettingsContext {
    /// Load settings under `root`; a missing file yields defaults
    pub fn load(root: &Path) -> Result<Self, SettingsError> {
        let path = Self::settings_path_for(root);
        let settings = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|source| SettingsError::Parse { path, source })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };

        Ok(Self {
            root: root.to_path_buf(),
            settings,
        })
    }

    pub fn new(root: PathBuf, settings: Settings) -> Self {
        Self { root, settings }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/.bkit`, home of settings and watch state
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn settings_path(&self) -> PathBuf {
        Self::settings_path_for(&self.root)
    }

    fn settings_path_for(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join(SETTINGS_FILE)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = self.settings_path();
        fsutil::write_json(&path, &self.settings).map_err(|source| SettingsError::Io { path, source })
    }

    /// Where to look for projects: the saved root, else `workdir`
    pub fn search_root(&self, workdir: &Path) -> PathBuf {
        self.settings
            .project_root
            .clone()
            .unwrap_or_else(|| workdir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    include!("settings.test.rs");
}
