//! SnapshotSet: one provider snapshot set, exclusively owned by its session.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};

use crate::errors::BackupError;
use crate::provider::{ProviderError, SnapshotProvider};

/// One OS-level snapshot set with a single enrolled volume.
///
/// Shares the provider with the owning session; deletes itself from the
/// provider on drop. A failed delete only costs storage, so it is logged
/// and discarded.
#[derive(Debug)]
pub struct SnapshotSet<P: SnapshotProvider> {
    provider: Rc<RefCell<P>>,
    set_id: u64,
    snapshot_id: Option<u64>,
    root: Option<PathBuf>,
}

impl<P: SnapshotProvider> SnapshotSet<P> {
    /// Begin a new snapshot set.
    pub(crate) fn start(provider: Rc<RefCell<P>>) -> Result<Self, ProviderError> {
        let set_id = provider.borrow_mut().start_snapshot_set()?;
        debug!("session: snapshot set {} started", set_id);
        Ok(Self {
            provider,
            set_id,
            snapshot_id: None,
            root: None,
        })
    }

    /// Enroll the volume containing the backup source.
    pub(crate) fn add_volume(&mut self, volume: &Path) -> Result<(), BackupError> {
        let mut p = self.provider.borrow_mut();
        let supported = p
            .is_volume_supported(volume)
            .map_err(BackupError::SnapshotDiscoveryFailed)?;
        if !supported {
            return Err(BackupError::VolumeNotSupported(volume.to_path_buf()));
        }
        let snap_id = p
            .add_to_snapshot_set(self.set_id, volume)
            .map_err(BackupError::SnapshotDiscoveryFailed)?;
        debug!(
            "session: volume {} enrolled, snapshot id {}",
            volume.display(),
            snap_id
        );
        self.snapshot_id = Some(snap_id);
        Ok(())
    }

    /// Commit the set and record the materialized snapshot root.
    pub(crate) fn commit(&mut self) -> Result<(), ProviderError> {
        let mut p = self.provider.borrow_mut();
        p.do_snapshot_set(self.set_id)?;
        let snap_id = self.snapshot_id.ok_or(ProviderError::BadState)?;
        let root = p.snapshot_root(snap_id)?;
        debug!(
            "session: set {} committed, root={}",
            self.set_id,
            root.display()
        );
        self.root = Some(root);
        Ok(())
    }

    pub fn set_id(&self) -> u64 {
        self.set_id
    }

    /// Snapshot root; Some only once committed.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

impl<P: SnapshotProvider> Drop for SnapshotSet<P> {
    fn drop(&mut self) {
        if let Err(e) = self.provider.borrow_mut().delete_snapshot_set(self.set_id) {
            warn!(
                "session: delete of snapshot set {} failed, leaving it to the provider: {e}",
                self.set_id
            );
        }
    }
}
