//! Path Registry - JSON-backed record of tracked dotfile directories
//!
//! The registry is a flat JSON object mapping a normalized source path to a
//! tracked flag:
//!
//! ```json
//! {
//!   "~/.config/nvim": true
//! }
//! ```
//!
//! Nothing is cached between calls; every operation reloads the file so the
//! on-disk state is always the source of truth.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name used when the registry lives next to the settings file
pub const REGISTRY_FILE_NAME: &str = "file_paths.json";

/// Tracked path -> tracked flag
pub type TrackedPaths = BTreeMap<String, bool>;

/// Handle to the registry file
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry stored in the same directory as `settings_path`
    pub fn beside(settings_path: &Path) -> Self {
        Self::new(settings_path.with_file_name(REGISTRY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted mapping. A missing file is an empty registry.
    pub fn load(&self) -> Result<TrackedPaths> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No registry at {}, starting empty", self.path.display());
                return Ok(TrackedPaths::new());
            }
            Err(e) => return Err(Error::io("read", &self.path, e)),
        };

        serde_json::from_str(&content).map_err(|source| Error::MalformedState {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the persisted mapping in full
    pub fn save(&self, paths: &TrackedPaths) -> Result<()> {
        let content = serde_json::to_string_pretty(paths).map_err(|source| Error::MalformedState {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
        }

        // Write next to the target and rename, so a crash mid-write never
        // leaves a truncated registry behind
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| REGISTRY_FILE_NAME.to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

        fs::write(&temp_path, content).map_err(|e| Error::io("write", &temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            Error::io("write", &self.path, e)
        })?;

        debug!("Saved {} tracked paths to {}", paths.len(), self.path.display());
        Ok(())
    }

    /// Record `path` as tracked and return the key it was stored under.
    ///
    /// Call only after the path has been mirrored successfully.
    pub fn track(&self, path: &str) -> Result<String> {
        let key = tracking_key(path);
        let mut paths = self.load()?;
        paths.insert(key.clone(), true);
        self.save(&paths)?;
        Ok(key)
    }

    /// Keys whose tracked flag is set
    pub fn tracked_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .load()?
            .into_iter()
            .filter_map(|(path, tracked)| tracked.then_some(path))
            .collect())
    }
}

/// Lexically clean a user-supplied path; `~` and variables are kept as typed
pub fn normalize(path: &str) -> String {
    path_clean::clean(path).to_string_lossy().into_owned()
}

/// Registry key for a user-supplied path.
///
/// `~` and `$VAR` paths are kept unexpanded; other relative paths are made
/// absolute against the working directory, since the registry outlives it.
pub fn tracking_key(path: &str) -> String {
    let key = normalize(path);
    if key.starts_with('~') || key.starts_with('$') || Path::new(&key).is_absolute() {
        return key;
    }
    match std::env::current_dir() {
        Ok(cwd) => path_clean::clean(cwd.join(&key))
            .to_string_lossy()
            .into_owned(),
        Err(_) => key,
    }
}
