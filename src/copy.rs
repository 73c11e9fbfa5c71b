//! Single-file copy used by the tree synchronizer

use crate::error::{Error, Result};
use filetime::FileTime;
use std::fs;
use std::path::Path;

/// Copy a regular file's bytes, permission bits and modification time.
///
/// `src` is stat'ed through symlinks, so a link to a regular file copies the
/// link target's content. The destination is created or overwritten; a failed
/// write may leave it partially written.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    let metadata = fs::metadata(src).map_err(|e| Error::from_stat(src, e))?;
    if !metadata.is_file() {
        return Err(Error::InvalidKind {
            path: src.to_path_buf(),
            expected: "a regular file",
        });
    }

    make_writable(dst)?;

    // std::fs::copy carries the permission bits over
    let bytes = fs::copy(src, dst).map_err(|e| Error::io("copy", src, e))?;

    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(dst, mtime).map_err(|e| Error::io("copy", dst, e))?;

    Ok(bytes)
}

/// A previous copy of a read-only source leaves a read-only destination,
/// which would refuse the next overwrite.
#[cfg(unix)]
fn make_writable(dst: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = fs::symlink_metadata(dst) else {
        return Ok(());
    };
    if !metadata.is_file() {
        return Ok(());
    }

    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    if mode & 0o200 == 0 {
        permissions.set_mode(mode | 0o200);
        fs::set_permissions(dst, permissions).map_err(|e| Error::io("copy", dst, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_writable(_dst: &Path) -> Result<()> {
    Ok(())
}
