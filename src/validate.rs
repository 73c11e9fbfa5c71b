//! Source validation before any sync is attempted

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Kind of filesystem entry a source path resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

impl SourceKind {
    fn describe(self) -> &'static str {
        match self {
            SourceKind::File => "a regular file",
            SourceKind::Directory => "a directory",
        }
    }
}

/// Stat `path` (following symlinks) and classify it.
pub fn inspect_source(path: &Path) -> Result<SourceKind> {
    let metadata = fs::metadata(path).map_err(|e| Error::from_stat(path, e))?;

    if metadata.is_dir() {
        Ok(SourceKind::Directory)
    } else if metadata.is_file() {
        Ok(SourceKind::File)
    } else {
        Err(Error::InvalidKind {
            path: path.to_path_buf(),
            expected: "a regular file or a directory",
        })
    }
}

/// Check that `path` exists and is of the `required` kind
pub fn validate_source(path: &Path, required: SourceKind) -> Result<()> {
    let kind = inspect_source(path)?;
    if kind != required {
        return Err(Error::InvalidKind {
            path: path.to_path_buf(),
            expected: required.describe(),
        });
    }
    Ok(())
}
