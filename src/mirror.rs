//! Tree Synchronizer - reconciles a source directory against its mirror
//!
//! A reconciliation walks the destination once to collect deletion
//! candidates, then walks the source, copying new or changed files and
//! unmarking everything it sees. Whatever is still marked afterwards is stale
//! and gets removed.
//!
//! Change detection is the size + modification time heuristic. Copies carry
//! the source mtime over, so an unchanged tree reconciles with zero writes.

use crate::copy::copy_file;
use crate::error::{Error, Result};
use filetime::FileTime;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What a single reconciliation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files_copied: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub dirs_created: usize,
    pub dirs_removed: usize,
    pub skipped: usize,
    pub bytes_copied: u64,
}

impl SyncReport {
    /// Number of filesystem mutations performed
    pub fn operations(&self) -> usize {
        self.files_copied + self.files_removed + self.dirs_created + self.dirs_removed
    }

    pub fn is_noop(&self) -> bool {
        self.operations() == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} copied, {} unchanged, {} removed",
            self.files_copied,
            self.files_unchanged,
            self.files_removed + self.dirs_removed
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// Entries found in the destination before reconciling, keyed by path
/// relative to the destination root. `true` means "still a candidate for
/// removal".
#[derive(Debug, Default)]
struct DestinationIndex {
    files: HashMap<PathBuf, bool>,
    dirs: HashMap<PathBuf, bool>,
}

impl DestinationIndex {
    /// Drop `relative` and everything below it after it was removed eagerly
    fn forget_under(&mut self, relative: &Path) {
        self.files.retain(|path, _| !path.starts_with(relative));
        self.dirs.retain(|path, _| !path.starts_with(relative));
    }
}

/// Check the entry at `path` without following symlinks
fn is_kind(path: &Path, pred: impl Fn(&fs::FileType) -> bool) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| pred(&meta.file_type()))
        .unwrap_or(false)
}

/// Make `dest_dir` structurally and content-equivalent to `source_dir`.
///
/// Aborts on the first failure; files copied or removed before that point
/// stay changed. Running it again converges.
pub fn sync_dir(source_dir: &Path, dest_dir: &Path) -> Result<SyncReport> {
    ensure_disjoint(source_dir, dest_dir)?;

    let mut report = SyncReport::default();

    if !dest_dir.is_dir() {
        fs::create_dir_all(dest_dir).map_err(|e| Error::io("create directory", dest_dir, e))?;
        report.dirs_created += 1;
    }

    let mut index = scan_destination(dest_dir)?;

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::from_walk("scan", source_dir, e))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| Error::InvalidKind {
                path: entry.path().to_path_buf(),
                expected: "an entry under the source directory",
            })?
            .to_path_buf();
        let target = dest_dir.join(&relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            if is_kind(&target, |t| !t.is_dir()) {
                // A file in the mirror where the source now has a directory
                fs::remove_file(&target).map_err(|e| Error::io("remove", &target, e))?;
                index.forget_under(&relative);
                report.files_removed += 1;
            }
            if !target.is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| Error::io("create directory", &target, e))?;
                report.dirs_created += 1;
            }
            index.dirs.insert(relative, false);
            continue;
        }

        if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    warn!("Skipping symlink to directory: {}", entry.path().display());
                    report.skipped += 1;
                    continue;
                }
                Err(_) => {
                    warn!("Skipping dangling symlink: {}", entry.path().display());
                    report.skipped += 1;
                    continue;
                }
            }
        }

        if is_kind(&target, |t| t.is_symlink()) {
            // Replace the link itself; copying would write through it
            fs::remove_file(&target).map_err(|e| Error::io("remove", &target, e))?;
        } else if is_kind(&target, |t| t.is_dir()) {
            fs::remove_dir_all(&target).map_err(|e| Error::io("remove", &target, e))?;
            index.forget_under(&relative);
            report.dirs_removed += 1;
        }

        if !target.exists() || is_modified(entry.path(), &target) {
            debug!("Copying {} -> {}", entry.path().display(), target.display());
            report.bytes_copied += copy_file(entry.path(), &target)?;
            report.files_copied += 1;
        } else {
            report.files_unchanged += 1;
        }

        index.files.insert(relative, false);
    }

    remove_stale(dest_dir, index, &mut report)?;

    info!(
        "Synced {} -> {}: {} copied, {} unchanged, {} removed",
        source_dir.display(),
        dest_dir.display(),
        report.files_copied,
        report.files_unchanged,
        report.files_removed
    );

    Ok(report)
}

/// True when the destination differs from the source in size or mtime, or
/// when either side cannot be stat'ed.
pub fn is_modified(source: &Path, dest: &Path) -> bool {
    let (Ok(src_meta), Ok(dst_meta)) = (fs::metadata(source), fs::metadata(dest)) else {
        return true;
    };

    src_meta.len() != dst_meta.len()
        || FileTime::from_last_modification_time(&src_meta)
            != FileTime::from_last_modification_time(&dst_meta)
}

fn scan_destination(dest_dir: &Path) -> Result<DestinationIndex> {
    let mut index = DestinationIndex::default();

    for entry in WalkDir::new(dest_dir).min_depth(1) {
        let entry = entry.map_err(|e| Error::from_walk("scan", dest_dir, e))?;
        let Ok(relative) = entry.path().strip_prefix(dest_dir) else {
            continue;
        };

        if entry.file_type().is_dir() {
            index.dirs.insert(relative.to_path_buf(), true);
        } else {
            index.files.insert(relative.to_path_buf(), true);
        }
    }

    Ok(index)
}

fn remove_stale(dest_dir: &Path, index: DestinationIndex, report: &mut SyncReport) -> Result<()> {
    for (relative, stale) in index.files {
        if !stale {
            continue;
        }
        let path = dest_dir.join(&relative);
        debug!("Removing stale file {}", path.display());
        fs::remove_file(&path).map_err(|e| Error::io("remove", &path, e))?;
        report.files_removed += 1;
    }

    // Deepest first, so children are gone before their parents
    let mut stale_dirs: Vec<PathBuf> = index
        .dirs
        .into_iter()
        .filter_map(|(relative, stale)| stale.then_some(relative))
        .collect();
    stale_dirs.sort_by_key(|relative| std::cmp::Reverse(relative.components().count()));

    for relative in stale_dirs {
        let path = dest_dir.join(&relative);
        debug!("Removing stale directory {}", path.display());
        fs::remove_dir(&path).map_err(|e| Error::io("remove", &path, e))?;
        report.dirs_removed += 1;
    }

    Ok(())
}

/// A mirror nested in its source would copy itself one level deeper on every
/// run; a source nested in its mirror would have its own files treated as
/// stale and removed.
fn ensure_disjoint(source_dir: &Path, dest_dir: &Path) -> Result<()> {
    let source = absolute(source_dir);
    let dest = absolute(dest_dir);

    if dest.starts_with(&source) || source.starts_with(&dest) {
        return Err(Error::Overlap {
            source_dir: source,
            destination: dest,
        });
    }
    Ok(())
}

/// Lexically absolute form of `path`, resolving symlinks where the path exists.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    path_clean::clean(joined)
}
