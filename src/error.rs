//! Error types shared by the sync engine, registry and settings layer

use std::path::{Path, PathBuf};

/// Result type for dotmate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating, mirroring or tracking dotfiles
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("source path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{} is not {expected}", path.display())]
    InvalidKind {
        path: PathBuf,
        expected: &'static str,
    },

    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    MalformedState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "source {} and destination {} overlap",
        source_dir.display(),
        destination.display()
    )]
    Overlap {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    #[error(
        "{path} would mirror into {}, already used by {tracked}",
        mirror.display()
    )]
    MirrorConflict {
        path: String,
        tracked: String,
        mirror: PathBuf,
    },

    #[error("cannot expand {path}: {source}")]
    Expand {
        path: String,
        #[source]
        source: shellexpand::LookupError<std::env::VarError>,
    },

    #[error("{operation} is not implemented")]
    Unsupported { operation: &'static str },
}

impl Error {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Map a failed `stat` to `NotFound` when the path is simply missing
    pub(crate) fn from_stat(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::io("stat", path, source)
        }
    }

    pub(crate) fn from_walk(op: &'static str, fallback: &Path, err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| fallback.to_path_buf());
        Self::io(op, path, err.into())
    }
}
