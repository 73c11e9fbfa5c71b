//! Common test utilities and helpers for dotmate tests
#![allow(dead_code)]

use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated home directory, destination and settings file.
///
/// `HOME` is pointed at the temporary home for the lifetime of the value, so
/// tests creating one must run `#[serial]`.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub destination: PathBuf,
    pub settings_path: PathBuf,
    original_env: Vec<(String, Option<String>)>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("home");
        let destination = temp_dir.path().join("dotfiles");
        let settings_path = temp_dir.path().join("config").join("settings.json");
        std::fs::create_dir_all(&home).expect("Failed to create home dir");

        // Store original environment variables
        let original_env = ["HOME", "XDG_CONFIG_HOME"]
            .iter()
            .map(|var| (var.to_string(), env::var(var).ok()))
            .collect();

        env::set_var("HOME", &home);

        Self {
            temp_dir,
            home,
            destination,
            settings_path,
            original_env,
        }
    }

    /// Create `relative` under the fake home with the given files
    pub fn create_dotfiles(&self, relative: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.home.join(relative);
        for (name, content) in files {
            write_file(&dir.join(name), content);
        }
        std::fs::create_dir_all(&dir).expect("Failed to create dotfile dir");
        dir
    }

    /// Write a settings file pointing at the test destination
    pub fn write_settings(&self) -> PathBuf {
        dotmate::Config::new(self.destination.to_string_lossy())
            .save(&self.settings_path)
            .expect("Failed to write settings");
        self.settings_path.clone()
    }

    pub fn engine(&self) -> dotmate::SyncEngine {
        dotmate::SyncEngine::new(
            self.destination.clone(),
            dotmate::Registry::beside(&self.settings_path),
        )
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        // Restore original environment variables
        for (key, value) in &self.original_env {
            match value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
