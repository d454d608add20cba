//! Recursive tree copy from the snapshot namespace into the staging
//! directory.
//!
//! Behavior:
//! - destination directories are created if absent, never cleared;
//! - files are copied once and never overwrite an existing destination file
//!   of the same name (each run stages into a fresh directory, so a hit
//!   means the caller already placed that file);
//! - subdirectories recurse depth-first; a call returns only after its whole
//!   subtree has been copied;
//! - any enumeration or copy failure aborts the entire invocation.

use std::fs;
use std::path::Path;

use log::debug;

use crate::errors::BackupError;

/// Counters accumulated over one copy invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStats {
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
}

/// Copy all files and subdirectories of `src` into `dst`, preserving
/// relative structure. Fails with `DirectoryNotFound` when `src` is missing.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats, BackupError> {
    if !src.is_dir() {
        return Err(BackupError::DirectoryNotFound(src.to_path_buf()));
    }
    let mut stats = CopyStats::default();
    copy_level(src, dst, &mut stats)?;
    debug!(
        "copytree: done, files={}, dirs={}, bytes={}, src={}",
        stats.files,
        stats.dirs,
        stats.bytes,
        src.display()
    );
    Ok(stats)
}

fn copy_level(src: &Path, dst: &Path, stats: &mut CopyStats) -> Result<(), BackupError> {
    if !dst.is_dir() {
        fs::create_dir_all(dst).map_err(|e| BackupError::CopyFailed {
            path: dst.to_path_buf(),
            source: e,
        })?;
    }
    stats.dirs += 1;

    let mut subdirs = Vec::new();
    let entries = fs::read_dir(src).map_err(|e| BackupError::CopyFailed {
        path: src.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| BackupError::CopyFailed {
            path: src.to_path_buf(),
            source: e,
        })?;
        let from = entry.path();
        let file_type = entry.file_type().map_err(|e| BackupError::CopyFailed {
            path: from.clone(),
            source: e,
        })?;
        let to = dst.join(entry.file_name());

        if file_type.is_dir() {
            subdirs.push((from, to));
        } else {
            // Copy-once: an already present destination file stays untouched.
            if to.exists() {
                debug!("copytree: skip existing {}", to.display());
                continue;
            }
            let n = fs::copy(&from, &to).map_err(|e| BackupError::CopyFailed {
                path: from.clone(),
                source: e,
            })?;
            stats.files += 1;
            stats.bytes += n;
        }
    }

    for (from, to) in subdirs {
        copy_level(&from, &to, stats)?;
    }
    Ok(())
}
