//! shadowbak — crash-consistent directory backup via point-in-time volume
//! snapshots.
//!
//! A run copies a live, possibly open directory tree out of a frozen
//! snapshot of its volume (never the mutating live tree), packs the copy
//! into one compressed archive, and cleans up all transient state (staging
//! directory, snapshot set, provider context) on every exit path.
//!
//! Single-threaded and synchronous; the caller serializes concurrent runs
//! per volume.

pub mod alert;
pub mod archive;
pub mod backup;
pub mod config;
pub mod copytree;
pub mod errors;
pub mod pathmap;
pub mod provider;
pub mod session;

// Convenience re-exports
pub use alert::{AlertSink, LogAlert};
pub use archive::{ArchiveCodec, Archiver, TarArchiver};
pub use backup::perform_backup;
pub use config::BackupConfig;
pub use copytree::{copy_tree, CopyStats};
pub use errors::BackupError;
pub use provider::{
    FrozenDirProvider, LiveViewProvider, ProviderError, SnapshotProvider,
};
pub use session::{SessionState, SnapshotSession};
