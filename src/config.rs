//! Application configuration settings.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use which::which;

use crate::{DaybookError, Result};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the primary entry records
    pub data_dir: PathBuf,

    /// Directory holding the JSON mirror consulted when the primary fails
    pub mirror_dir: PathBuf,

    /// Default editor command for composing entries
    pub editor_command: Option<String>,
}

impl Config {
    /// Loads the configuration.
    ///
    /// With an explicit `path` the file must exist and parse. Otherwise
    /// the platform config location is consulted and missing files fall
    /// back to defaults under the platform data directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let raw = fs::read_to_string(path).map_err(|e| DaybookError::ConfigError {
                message: format!("cannot read {}: {}", path.display(), e),
            })?;
            return serde_json::from_str(&raw).map_err(|e| DaybookError::ConfigError {
                message: format!("cannot parse {}: {}", path.display(), e),
            });
        }

        let dirs = ProjectDirs::from("", "", "daybook").ok_or_else(|| {
            DaybookError::ConfigError {
                message: "could not determine a home directory".to_string(),
            }
        })?;

        let config_path = dirs.config_dir().join("config.json");
        if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let raw = fs::read_to_string(&config_path)?;
            serde_json::from_str(&raw).map_err(|e| DaybookError::ConfigError {
                message: format!("cannot parse {}: {}", config_path.display(), e),
            })
        } else {
            debug!("No config file, using platform defaults");
            Ok(Config {
                data_dir: dirs.data_dir().join("entries"),
                mirror_dir: dirs.data_dir().join("mirror"),
                editor_command: None,
            })
        }
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        // First try the configured editor
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        // Then try environment variable
        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        // Fall back to platform defaults
        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            // Try common Linux editors
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}
