//! Simulation provider: freezes the enrolled volume root by copying it.
//!
//! On commit, every enrolled volume root gets a full copy under
//! `<scratch>/set-<set_id>/snap-<snapshot_id>`; that copy is the snapshot
//! root and stays stable no matter what happens to the live tree afterward.
//! delete_snapshot_set removes the copies. The copy cost makes this
//! unsuitable for whole real volumes; it gives tests and small enrollment
//! roots genuine point-in-time semantics.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::copytree::copy_tree;

use super::{BackupKind, ProviderError, SnapshotProvider, WriterComponent, WriterMetadata};

#[derive(Debug)]
struct SetState {
    snapshots: Vec<u64>,
    committed: bool,
}

#[derive(Debug)]
pub struct FrozenDirProvider {
    scratch: PathBuf,
    initialized: bool,
    any_committed: bool,
    next_id: u64,
    sets: HashMap<u64, SetState>,
    // snapshot_id -> (enrolled volume root, frozen root once committed)
    volumes: HashMap<u64, (PathBuf, Option<PathBuf>)>,
}

impl FrozenDirProvider {
    /// `scratch` is where frozen copies are materialized; created on demand.
    pub fn new(scratch: impl Into<PathBuf>) -> Self {
        Self {
            scratch: scratch.into(),
            initialized: false,
            any_committed: false,
            next_id: 0,
            sets: HashMap::new(),
            volumes: HashMap::new(),
        }
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn frozen_root(&self, set_id: u64, snapshot_id: u64) -> PathBuf {
        self.scratch
            .join(format!("set-{set_id}"))
            .join(format!("snap-{snapshot_id}"))
    }
}

impl SnapshotProvider for FrozenDirProvider {
    fn initialize_for_backup(&mut self) -> Result<(), ProviderError> {
        fs::create_dir_all(&self.scratch)?;
        self.initialized = true;
        debug!(
            "frozen: context initialized, scratch={}",
            self.scratch.display()
        );
        Ok(())
    }

    fn gather_writer_metadata(&mut self) -> Result<(), ProviderError> {
        if !self.initialized {
            return Err(ProviderError::BadState);
        }
        Ok(())
    }

    fn free_writer_metadata(&mut self) {}

    fn writer_metadata(&self) -> Vec<WriterMetadata> {
        Vec::new()
    }

    fn start_snapshot_set(&mut self) -> Result<u64, ProviderError> {
        if !self.initialized {
            return Err(ProviderError::BadState);
        }
        let id = self.next();
        self.sets.insert(
            id,
            SetState {
                snapshots: Vec::new(),
                committed: false,
            },
        );
        Ok(id)
    }

    fn is_volume_supported(&self, volume: &Path) -> Result<bool, ProviderError> {
        Ok(volume.is_dir())
    }

    fn add_to_snapshot_set(&mut self, set_id: u64, volume: &Path) -> Result<u64, ProviderError> {
        let snap_id = self.next();
        let set = self
            .sets
            .get_mut(&set_id)
            .ok_or(ProviderError::UnknownSet(set_id))?;
        set.snapshots.push(snap_id);
        self.volumes.insert(snap_id, (volume.to_path_buf(), None));
        Ok(snap_id)
    }

    fn set_backup_state(
        &mut self,
        _select_components: bool,
        _bootable: bool,
        _kind: BackupKind,
    ) -> Result<(), ProviderError> {
        if !self.initialized {
            return Err(ProviderError::BadState);
        }
        Ok(())
    }

    fn prepare_for_backup(&mut self) -> Result<(), ProviderError> {
        if !self.initialized {
            return Err(ProviderError::BadState);
        }
        Ok(())
    }

    fn do_snapshot_set(&mut self, set_id: u64) -> Result<(), ProviderError> {
        let snapshots = {
            let set = self
                .sets
                .get(&set_id)
                .ok_or(ProviderError::UnknownSet(set_id))?;
            set.snapshots.clone()
        };
        for snap_id in snapshots {
            let (volume, _) = self
                .volumes
                .get(&snap_id)
                .cloned()
                .ok_or(ProviderError::UnknownSnapshot(snap_id))?;
            let frozen = self.frozen_root(set_id, snap_id);
            let stats = copy_tree(&volume, &frozen)
                .map_err(|e| ProviderError::Other(format!("freeze {}: {e}", volume.display())))?;
            info!(
                "frozen: committed snap {} of {}, files={}, bytes={}",
                snap_id,
                volume.display(),
                stats.files,
                stats.bytes
            );
            self.volumes.insert(snap_id, (volume, Some(frozen)));
        }
        if let Some(set) = self.sets.get_mut(&set_id) {
            set.committed = true;
        }
        self.any_committed = true;
        Ok(())
    }

    fn snapshot_root(&self, snapshot_id: u64) -> Result<PathBuf, ProviderError> {
        match self.volumes.get(&snapshot_id) {
            Some((_, Some(frozen))) => Ok(frozen.clone()),
            Some((_, None)) => Err(ProviderError::BadState),
            None => Err(ProviderError::UnknownSnapshot(snapshot_id)),
        }
    }

    fn set_backup_succeeded(
        &mut self,
        _instance_id: &str,
        _writer_id: &str,
        _component: &WriterComponent,
        _succeeded: bool,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    fn backup_complete(&mut self) -> Result<(), ProviderError> {
        if !self.any_committed {
            return Err(ProviderError::BadState);
        }
        Ok(())
    }

    fn delete_snapshot_set(&mut self, set_id: u64) -> Result<(), ProviderError> {
        let set = self
            .sets
            .remove(&set_id)
            .ok_or(ProviderError::UnknownSet(set_id))?;
        for snap_id in set.snapshots {
            self.volumes.remove(&snap_id);
        }
        let set_dir = self.scratch.join(format!("set-{set_id}"));
        if set_dir.exists() {
            fs::remove_dir_all(&set_dir)?;
        }
        debug!("frozen: deleted set {}", set_id);
        Ok(())
    }

    fn release(&mut self) {
        debug!("frozen: context released");
        self.initialized = false;
    }
}
