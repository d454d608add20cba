//! Path translation between the live filesystem namespace and a snapshot's
//! namespace.
//!
//! Pure functions, no I/O:
//! - volume_root_of(): root component(s) of an absolute path.
//! - resolve_snapshot_path(): live absolute path -> path inside the snapshot.
//!
//! Mapping is strip-and-rejoin: drop the volume-root prefix from the live
//! path, join the root-relative remainder onto the snapshot root. Path::join
//! inserts exactly one separator, so the result is never doubled or missing
//! one. Callers map each logical path exactly once.

use std::path::{Component, Path, PathBuf};

use crate::errors::BackupError;

/// Root of the volume containing `path` ("/" on Unix, "C:\" on Windows).
///
/// Non-rooted input is a validation failure, not a best-effort string.
pub fn volume_root_of(path: &Path) -> Result<PathBuf, BackupError> {
    if !path.is_absolute() {
        return Err(BackupError::PathNotRooted(path.to_path_buf()));
    }
    let mut root = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir => root.push(comp.as_os_str()),
            _ => break,
        }
    }
    Ok(root)
}

/// Translate a live absolute path into the equivalent path inside a
/// committed snapshot rooted at `snapshot_root`.
///
/// `volume_root` is the root that was enrolled into the snapshot set; `live`
/// must be rooted and lie under it.
pub fn resolve_snapshot_path(
    snapshot_root: &Path,
    volume_root: &Path,
    live: &Path,
) -> Result<PathBuf, BackupError> {
    if !live.is_absolute() {
        return Err(BackupError::PathNotRooted(live.to_path_buf()));
    }
    let remainder = live
        .strip_prefix(volume_root)
        .map_err(|_| BackupError::PathOutsideVolume {
            path: live.to_path_buf(),
            volume: volume_root.to_path_buf(),
        })?;
    Ok(snapshot_root.join(remainder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_root_of_absolute() {
        let root = volume_root_of(Path::new("/var/lib/app/data")).unwrap();
        assert_eq!(root, PathBuf::from("/"));
    }

    #[test]
    fn volume_root_of_relative_is_error() {
        let err = volume_root_of(Path::new("var/lib")).unwrap_err();
        assert!(matches!(err, BackupError::PathNotRooted(_)));
    }

    #[test]
    fn resolve_starts_with_snapshot_root() {
        let snap = Path::new("/snap/dev3");
        let got = resolve_snapshot_path(snap, Path::new("/"), Path::new("/var/lib/app")).unwrap();
        assert_eq!(got, PathBuf::from("/snap/dev3/var/lib/app"));
        assert!(got.starts_with(snap));
    }

    #[test]
    fn resolve_roundtrips_remainder() {
        let snap = Path::new("/snap/dev7");
        let live = Path::new("/srv/saves/world");
        let got = resolve_snapshot_path(snap, Path::new("/"), live).unwrap();
        // Stripping the snapshot root back off reproduces the root-relative
        // remainder of the live path.
        let back = got.strip_prefix(snap).unwrap();
        assert_eq!(back, live.strip_prefix("/").unwrap());
    }

    #[test]
    fn resolve_no_doubled_separator() {
        // Trailing separator on the snapshot root must not double up.
        let got =
            resolve_snapshot_path(Path::new("/snap/dev1/"), Path::new("/"), Path::new("/a/b"))
                .unwrap();
        assert_eq!(got.to_str().unwrap(), "/snap/dev1/a/b");
    }

    #[test]
    fn resolve_with_scoped_volume_root() {
        let got = resolve_snapshot_path(
            Path::new("/frozen/set-1"),
            Path::new("/srv/vol"),
            Path::new("/srv/vol/saves/world"),
        )
        .unwrap();
        assert_eq!(got, PathBuf::from("/frozen/set-1/saves/world"));
    }

    #[test]
    fn resolve_outside_volume_is_error() {
        let err = resolve_snapshot_path(
            Path::new("/frozen/set-1"),
            Path::new("/srv/vol"),
            Path::new("/etc/passwd"),
        )
        .unwrap_err();
        assert!(matches!(err, BackupError::PathOutsideVolume { .. }));
    }

    #[test]
    fn resolve_relative_live_is_error() {
        let err =
            resolve_snapshot_path(Path::new("/frozen"), Path::new("/"), Path::new("saves/world"))
                .unwrap_err();
        assert!(matches!(err, BackupError::PathNotRooted(_)));
    }
}
