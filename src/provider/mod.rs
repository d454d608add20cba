//! Snapshot provider collaborator.
//!
//! The provider is the one genuinely platform-native dependency: the OS
//! facility that can materialize a point-in-time, read-only view of a
//! volume while the live volume keeps changing. This module defines the
//! interface boundary plus two conforming in-tree stand-ins:
//! - live.rs: LiveViewProvider — degraded fallback, serves the live root
//!   as the "snapshot" (no freezing, not crash-consistent);
//! - frozen.rs: FrozenDirProvider — materializes a real frozen copy of the
//!   enrolled volume root at commit time under a scratch directory.
//!
//! Call ordering is strict and enforced by the session, not here:
//! initialize -> gather writers -> start set -> enroll volume ->
//! backup state + prepare -> commit -> (resolve paths) -> complete ->
//! delete set -> release.

mod frozen;
mod live;

pub use frozen::FrozenDirProvider;
pub use live::LiveViewProvider;

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejects the call in its current state. Expected (and
    /// tolerated by the session) at completion when no writers were engaged.
    #[error("provider is in a bad state for this call")]
    BadState,

    #[error("unknown snapshot set id {0}")]
    UnknownSet(u64),

    #[error("unknown snapshot id {0}")]
    UnknownSnapshot(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// File set declared by a writer component (component mode only).
#[derive(Debug, Clone)]
pub struct FileSpec {
    pub path: String,
    pub specification: String,
    pub alternate_location: Option<String>,
}

impl FileSpec {
    /// Effective path + specification, preferring the alternate location.
    pub fn full_specification(&self) -> String {
        let base = self.alternate_location.as_deref().unwrap_or(&self.path);
        format!("{}/{}", base.trim_end_matches('/'), self.specification)
    }
}

/// One component of a registered writer (component mode only).
#[derive(Debug, Clone)]
pub struct WriterComponent {
    pub name: String,
    pub caption: String,
    pub logical_path: Option<String>,
    pub files: Vec<FileSpec>,
}

/// Metadata for one registered writer/participant.
#[derive(Debug, Clone)]
pub struct WriterMetadata {
    pub instance_id: String,
    pub writer_id: String,
    pub name: String,
    pub components: Vec<WriterComponent>,
}

/// Backup kind declared to the provider before prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Full,
    Incremental,
    Differential,
}

/// Interface to the OS snapshot facility.
///
/// All calls are synchronous and may block on provider I/O.
pub trait SnapshotProvider {
    /// Create and initialize the backup-components context.
    fn initialize_for_backup(&mut self) -> Result<(), ProviderError>;

    /// Gather metadata about all registered writers on the system.
    fn gather_writer_metadata(&mut self) -> Result<(), ProviderError>;

    /// Free gathered writer metadata (full-volume mode skips examination).
    fn free_writer_metadata(&mut self);

    /// Gathered writer metadata, for component-mode examination.
    fn writer_metadata(&self) -> Vec<WriterMetadata>;

    /// Begin a new snapshot set; returns its set id.
    fn start_snapshot_set(&mut self) -> Result<u64, ProviderError>;

    /// Whether the provider can snapshot the given volume.
    fn is_volume_supported(&self, volume: &Path) -> Result<bool, ProviderError>;

    /// Enroll a volume into the set; returns the per-volume snapshot id.
    fn add_to_snapshot_set(&mut self, set_id: u64, volume: &Path) -> Result<u64, ProviderError>;

    /// Declare backup parameters before prepare.
    fn set_backup_state(
        &mut self,
        select_components: bool,
        bootable: bool,
        kind: BackupKind,
    ) -> Result<(), ProviderError>;

    /// Signal that preparation is complete.
    fn prepare_for_backup(&mut self) -> Result<(), ProviderError>;

    /// Commit the set: materialize the point-in-time view for every
    /// enrolled volume.
    fn do_snapshot_set(&mut self, set_id: u64) -> Result<(), ProviderError>;

    /// Root device/path of a committed snapshot.
    fn snapshot_root(&self, snapshot_id: u64) -> Result<PathBuf, ProviderError>;

    /// Report per-component backup outcome (component mode only).
    fn set_backup_succeeded(
        &mut self,
        instance_id: &str,
        writer_id: &str,
        component: &WriterComponent,
        succeeded: bool,
    ) -> Result<(), ProviderError>;

    /// Signal overall backup completion.
    fn backup_complete(&mut self) -> Result<(), ProviderError>;

    /// Delete a snapshot set and its volume snapshots.
    fn delete_snapshot_set(&mut self, set_id: u64) -> Result<(), ProviderError>;

    /// Release the backup-components context. Idempotent.
    fn release(&mut self);
}
