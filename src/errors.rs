//! Error taxonomy for a backup run.
//!
//! Every fatal condition the orchestrator can hit maps to exactly one
//! variant here. Provider-level failures keep their `ProviderError` source
//! so logs show the underlying cause; `{:#}` via anyhow prints the chain.

use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderError;
use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum BackupError {
    /// Provider context could not be initialized (writer metadata included).
    #[error("snapshot provider initialization failed")]
    SnapshotInitFailed(#[source] ProviderError),

    /// Provider failed while starting the snapshot set or enrolling the volume.
    #[error("snapshot discovery failed")]
    SnapshotDiscoveryFailed(#[source] ProviderError),

    /// The provider reports the volume as unsupported for snapshotting.
    #[error("volume {} is not supported for snapshotting", .0.display())]
    VolumeNotSupported(PathBuf),

    #[error("snapshot prepare failed")]
    SnapshotPrepareFailed(#[source] ProviderError),

    #[error("snapshot commit failed")]
    SnapshotCommitFailed(#[source] ProviderError),

    /// Tree copy source does not exist.
    #[error("source directory does not exist or could not be found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// A single file copy or directory enumeration failed; aborts the whole copy.
    #[error("copy failed at {}", .path.display())]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compression failed for {}", .dest.display())]
    CompressionFailed {
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path mapping requires an absolute (rooted) input path.
    #[error("path is not rooted: {}", .0.display())]
    PathNotRooted(PathBuf),

    /// The live path is not under the enrolled volume root.
    #[error("path {} is outside volume {}", .path.display(), .volume.display())]
    PathOutsideVolume { path: PathBuf, volume: PathBuf },

    /// Snapshot paths can only be resolved once the set is committed.
    #[error("snapshot session is not committed (state: {0:?})")]
    NotCommitted(SessionState),

    /// Operation invoked in a state that does not permit it.
    #[error("operation not valid in session state {0:?}")]
    BadSessionState(SessionState),
}
