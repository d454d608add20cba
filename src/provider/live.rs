//! Degraded provider that serves the live volume root as the "snapshot".
//!
//! No freezing happens: files copied through this provider can tear if the
//! tree mutates mid-copy. It exists so the pipeline runs on hosts without a
//! snapshot facility; the log makes the degradation loud.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::{BackupKind, ProviderError, SnapshotProvider, WriterComponent, WriterMetadata};

#[derive(Debug, Default)]
pub struct LiveViewProvider {
    initialized: bool,
    committed: bool,
    next_id: u64,
    // snapshot_id -> enrolled volume root (served back verbatim)
    volumes: HashMap<u64, PathBuf>,
    // set_id -> snapshot ids
    sets: HashMap<u64, Vec<u64>>,
}

impl LiveViewProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl SnapshotProvider for LiveViewProvider {
    fn initialize_for_backup(&mut self) -> Result<(), ProviderError> {
        warn!("liveview: no snapshot facility, serving the live tree (not crash-consistent)");
        self.initialized = true;
        Ok(())
    }

    fn gather_writer_metadata(&mut self) -> Result<(), ProviderError> {
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
        self.sets.insert(id, Vec::new());
        Ok(id)
    }

    fn is_volume_supported(&self, volume: &Path) -> Result<bool, ProviderError> {
        Ok(volume.is_dir())
    }

    fn add_to_snapshot_set(&mut self, set_id: u64, volume: &Path) -> Result<u64, ProviderError> {
        let snap_id = self.next();
        let snaps = self
            .sets
            .get_mut(&set_id)
            .ok_or(ProviderError::UnknownSet(set_id))?;
        snaps.push(snap_id);
        self.volumes.insert(snap_id, volume.to_path_buf());
        Ok(snap_id)
    }

    fn set_backup_state(
        &mut self,
        _select_components: bool,
        _bootable: bool,
        _kind: BackupKind,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    fn prepare_for_backup(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn do_snapshot_set(&mut self, set_id: u64) -> Result<(), ProviderError> {
        if !self.sets.contains_key(&set_id) {
            return Err(ProviderError::UnknownSet(set_id));
        }
        self.committed = true;
        Ok(())
    }

    fn snapshot_root(&self, snapshot_id: u64) -> Result<PathBuf, ProviderError> {
        self.volumes
            .get(&snapshot_id)
            .cloned()
            .ok_or(ProviderError::UnknownSnapshot(snapshot_id))
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
        // Mirrors real providers: completion without a committed set is a
        // bad-state condition (the session tolerates it).
        if !self.committed {
            return Err(ProviderError::BadState);
        }
        Ok(())
    }

    fn delete_snapshot_set(&mut self, set_id: u64) -> Result<(), ProviderError> {
        let snaps = self
            .sets
            .remove(&set_id)
            .ok_or(ProviderError::UnknownSet(set_id))?;
        for s in snaps {
            self.volumes.remove(&s);
        }
        Ok(())
    }

    fn release(&mut self) {
        debug!("liveview: context released");
        self.initialized = false;
    }
}
