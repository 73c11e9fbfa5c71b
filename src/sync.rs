//! Sync Engine - ties validation, mirroring and the registry together
//!
//! This module provides the entry points the CLI and TUI call: adding a new
//! dotfile directory and re-synchronizing everything already tracked.

use crate::config::{expand, Config};
use crate::error::{Error, Result};
use crate::mirror::{self, sync_dir, SyncReport};
use crate::registry::{normalize, tracking_key, Registry};
use crate::validate::{validate_source, SourceKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Outcome of re-synchronizing one tracked path
#[derive(Debug)]
pub struct PathOutcome {
    pub path: String,
    pub result: Result<SyncReport>,
}

/// Results from a refresh over every tracked path
#[derive(Debug)]
pub struct RefreshSummary {
    pub outcomes: Vec<PathOutcome>,
    pub duration: Duration,
}

impl RefreshSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &SyncReport)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.path.as_str(), r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.path.as_str(), e)))
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

/// A tracked path as shown by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub path: String,
    pub mirror: Option<PathBuf>,
    pub source_exists: bool,
}

/// The main sync engine
#[derive(Debug, Clone)]
pub struct SyncEngine {
    destination: PathBuf,
    registry: Registry,
}

impl SyncEngine {
    pub fn new(destination: impl Into<PathBuf>, registry: Registry) -> Self {
        Self {
            destination: destination.into(),
            registry,
        }
    }

    /// Engine for a loaded configuration, with the registry next to its file
    pub fn from_config(config: &Config, config_path: &Path) -> Self {
        Self::new(config.destination_path(), Registry::beside(config_path))
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Where `source` is mirrored: `<destination>/<basename of source>`
    pub fn mirror_path(&self, source: &str) -> Result<PathBuf> {
        let expanded = expand(&normalize(source))?;
        let name = match expanded.file_name() {
            Some(name) => name.to_os_string(),
            None => mirror::absolute(&expanded)
                .file_name()
                .map(|n| n.to_os_string())
                .ok_or_else(|| Error::InvalidKind {
                    path: expanded.clone(),
                    expected: "a named directory",
                })?,
        };
        Ok(self.destination.join(name))
    }

    /// Validate `source`, mirror it, then record it as tracked.
    ///
    /// Refuses a source whose mirror directory already belongs to another
    /// tracked path; the destination is left untouched in that case.
    pub fn validate_and_sync(&self, source: &str) -> Result<SyncReport> {
        let key = tracking_key(source);
        self.ensure_mirror_free(&key)?;
        let report = self.sync_one(&key)?;
        self.registry.track(&key)?;
        info!("Tracking {}", key);
        Ok(report)
    }

    fn ensure_mirror_free(&self, key: &str) -> Result<()> {
        let mirror = self.mirror_path(key)?;
        for tracked in self.registry.tracked_paths()? {
            if tracked != key && self.mirror_path(&tracked).ok().as_ref() == Some(&mirror) {
                return Err(Error::MirrorConflict {
                    path: key.to_string(),
                    tracked,
                    mirror,
                });
            }
        }
        Ok(())
    }

    /// Re-synchronize every tracked path.
    ///
    /// Fails only when the registry itself cannot be read; individual path
    /// failures are collected and the remaining paths are still processed.
    pub fn refresh_all(&self) -> Result<RefreshSummary> {
        let start_time = Instant::now();
        let paths = self.registry.tracked_paths()?;

        info!("Refreshing {} tracked paths", paths.len());

        let outcomes = paths
            .into_iter()
            .map(|path| {
                let result = self.sync_one(&path);
                if let Err(e) = &result {
                    error!("Refresh failed for {}: {}", path, e);
                }
                PathOutcome { path, result }
            })
            .collect();

        let summary = RefreshSummary {
            outcomes,
            duration: start_time.elapsed(),
        };

        info!(
            "Refresh completed in {:.2}s: {} ok, {} failed",
            summary.duration.as_secs_f64(),
            summary.total() - summary.failed_count(),
            summary.failed_count()
        );

        Ok(summary)
    }

    /// Tracked paths with their mirror location and source status
    pub fn tracked(&self) -> Result<Vec<TrackedEntry>> {
        Ok(self
            .registry
            .tracked_paths()?
            .into_iter()
            .map(|path| {
                let source_exists = expand(&path).map(|p| p.is_dir()).unwrap_or(false);
                let mirror = self.mirror_path(&path).ok();
                TrackedEntry {
                    path,
                    mirror,
                    source_exists,
                }
            })
            .collect())
    }

    /// Push the mirror to a remote. Not implemented.
    pub fn push(&self) -> Result<()> {
        Err(Error::Unsupported {
            operation: "push to remote",
        })
    }

    fn sync_one(&self, source: &str) -> Result<SyncReport> {
        let source_path = expand(&normalize(source))?;
        validate_source(&source_path, SourceKind::Directory)?;
        let mirror = self.mirror_path(source)?;
        sync_dir(&source_path, &mirror)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn engine(temp: &TempDir) -> SyncEngine {
        SyncEngine::new(
            temp.path().join("dest"),
            Registry::new(temp.path().join("file_paths.json")),
        )
    }

    fn source(temp: &TempDir, name: &str) -> PathBuf {
        let dir = temp.path().join("home").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config"), name).unwrap();
        dir
    }

    #[test]
    fn test_validate_and_sync_tracks_on_success() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let src = source(&temp, "kitty");

        let report = engine.validate_and_sync(src.to_str().unwrap()).unwrap();

        assert_eq!(report.files_copied, 1);
        assert!(temp.path().join("dest/kitty/config").exists());
        assert_eq!(
            engine.registry().tracked_paths().unwrap(),
            vec![src.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn test_failed_validation_tracks_nothing() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let file = temp.path().join(".bashrc");
        std::fs::write(&file, "").unwrap();

        assert!(matches!(
            engine.validate_and_sync(file.to_str().unwrap()),
            Err(Error::InvalidKind { .. })
        ));
        assert!(matches!(
            engine.validate_and_sync(temp.path().join("nope").to_str().unwrap()),
            Err(Error::NotFound { .. })
        ));
        assert!(engine.registry().load().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_continues_past_failures() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let alacritty = source(&temp, "alacritty");
        let zellij = source(&temp, "zellij");
        engine.validate_and_sync(alacritty.to_str().unwrap()).unwrap();
        engine.validate_and_sync(zellij.to_str().unwrap()).unwrap();

        std::fs::remove_dir_all(&alacritty).unwrap();
        std::fs::write(zellij.join("layout.kdl"), "layout {}").unwrap();

        let summary = engine.refresh_all().unwrap();

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed_count(), 1);
        let (failed_path, err) = summary.failed().next().unwrap();
        assert!(failed_path.ends_with("alacritty"));
        assert!(matches!(err, Error::NotFound { .. }));
        let (_, report) = summary.succeeded().next().unwrap();
        assert_eq!(report.files_copied, 1);
        assert!(temp.path().join("dest/zellij/layout.kdl").exists());
    }

    #[test]
    fn test_refresh_with_empty_registry() {
        let temp = TempDir::new().unwrap();
        let summary = engine(&temp).refresh_all().unwrap();
        assert_eq!(summary.total(), 0);
        assert!(summary.all_succeeded());
    }

    #[test]
    fn test_refresh_fails_on_malformed_registry() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        std::fs::write(engine.registry().path(), "[not a map]").unwrap();

        assert!(matches!(
            engine.refresh_all(),
            Err(Error::MalformedState { .. })
        ));
    }

    #[test]
    fn test_mirror_path_uses_basename() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        assert_eq!(
            engine.mirror_path("/etc/xdg/nvim/").unwrap(),
            temp.path().join("dest").join("nvim")
        );
    }

    #[test]
    fn test_tracked_reports_missing_sources() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let src = source(&temp, "fish");
        engine.validate_and_sync(src.to_str().unwrap()).unwrap();
        std::fs::remove_dir_all(&src).unwrap();

        let entries = engine.tracked().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].source_exists);
        assert_eq!(entries[0].mirror, Some(temp.path().join("dest/fish")));
    }

    #[test]
    fn test_same_basename_is_refused_without_touching_mirror() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let user = temp.path().join("home/.config/nvim");
        let system = temp.path().join("etc/xdg/nvim");
        std::fs::create_dir_all(&user).unwrap();
        std::fs::create_dir_all(&system).unwrap();
        std::fs::write(user.join("init.lua"), "-- user").unwrap();
        std::fs::write(system.join("sysinit.lua"), "-- system").unwrap();

        engine.validate_and_sync(user.to_str().unwrap()).unwrap();
        let err = engine.validate_and_sync(system.to_str().unwrap()).unwrap_err();

        assert!(matches!(err, Error::MirrorConflict { .. }));
        assert!(temp.path().join("dest/nvim/init.lua").exists());
        assert!(!temp.path().join("dest/nvim/sysinit.lua").exists());
        assert_eq!(engine.registry().tracked_paths().unwrap().len(), 1);

        let summary = engine.refresh_all().unwrap();
        let (_, report) = summary.succeeded().next().unwrap();
        assert!(report.is_noop());
    }

    #[test]
    fn test_re_adding_a_tracked_path_is_allowed() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let src = source(&temp, "tmux");

        engine.validate_and_sync(src.to_str().unwrap()).unwrap();
        let report = engine.validate_and_sync(src.to_str().unwrap()).unwrap();

        assert!(report.is_noop());
    }

    #[test]
    #[serial]
    fn test_relative_path_survives_working_directory_change() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        source(&temp, "fish");
        let original = std::env::current_dir().unwrap();

        std::env::set_current_dir(temp.path().join("home")).unwrap();
        let added = engine.validate_and_sync("./fish");
        std::env::set_current_dir(temp.path()).unwrap();
        let summary = engine.refresh_all();
        std::env::set_current_dir(&original).unwrap();

        added.unwrap();
        assert!(summary.unwrap().all_succeeded());
        let tracked = engine.registry().tracked_paths().unwrap();
        assert_eq!(tracked.len(), 1);
        assert!(Path::new(&tracked[0]).is_absolute());
        assert!(tracked[0].ends_with("home/fish"));
    }

    #[test]
    fn test_push_is_unsupported() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            engine(&temp).push(),
            Err(Error::Unsupported { .. })
        ));
    }
}
