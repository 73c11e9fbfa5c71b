use crate::error::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file, both in the working directory and under XDG
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Main configuration structure for dotmate
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory every tracked dotfile tree is mirrored into
    pub destination: String,
}

impl Config {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;

        let mut config: Config =
            serde_json::from_str(&content).map_err(|source| Error::MalformedState {
                path: path.to_path_buf(),
                source,
            })?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|source| Error::MalformedState {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io("create directory", parent, e))?;
        }

        std::fs::write(path, content).map_err(|e| Error::io("write", path, e))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("dotmate").join(SETTINGS_FILE_NAME))
    }

    /// Pick the settings file: explicit path, then `settings.json` in
    /// `working_dir` if present, then the XDG location
    pub fn resolve_path(explicit: Option<PathBuf>, working_dir: &Path) -> Option<PathBuf> {
        if explicit.is_some() {
            return explicit;
        }

        let local = working_dir.join(SETTINGS_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }

        Self::default_config_path()
    }

    /// Expand `~` and environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.destination = expand(&self.destination)?.to_string_lossy().into_owned();
        Ok(())
    }

    pub fn destination_path(&self) -> PathBuf {
        PathBuf::from(&self.destination)
    }
}

/// Shell-expand a user-supplied path (`~`, `$HOME`, `${XDG_CONFIG_HOME}`)
pub fn expand(path: &str) -> Result<PathBuf> {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|source| Error::Expand {
            path: path.to_string(),
            source,
        })
}
