//! SnapshotSession: the guarded state machine over the provider.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};

use crate::errors::BackupError;
use crate::pathmap::resolve_snapshot_path;
use crate::provider::{BackupKind, ProviderError, SnapshotProvider};

use super::set::SnapshotSet;

/// Lifecycle states, strictly linear. Failure at any step still ends in
/// Disposed via Drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Discovering,
    Prepared,
    Committed,
    Completed,
    Disposed,
}

/// Owns the provider context and zero-or-one snapshot set.
///
/// Construction drives Uninitialized -> Initialized; `setup` drives
/// Discovery, Prepare and Commit; Drop drives Complete and Dispose exactly
/// once, whether the scope ends normally or after an error.
#[derive(Debug)]
pub struct SnapshotSession<P: SnapshotProvider> {
    provider: Rc<RefCell<P>>,
    state: SessionState,
    component_mode: bool,
    volume_root: Option<PathBuf>,
    set: Option<SnapshotSet<P>>,
}

impl<P: SnapshotProvider> SnapshotSession<P> {
    /// Acquire the provider context and gather writer metadata.
    ///
    /// On failure the provider context is released here, so release still
    /// happens exactly once even though no session exists afterwards.
    pub fn new(provider: P, component_mode: bool) -> Result<Self, BackupError> {
        let provider = Rc::new(RefCell::new(provider));
        let init = {
            let mut p = provider.borrow_mut();
            p.initialize_for_backup()
                .and_then(|()| p.gather_writer_metadata())
        };
        if let Err(e) = init {
            provider.borrow_mut().release();
            return Err(BackupError::SnapshotInitFailed(e));
        }
        debug!("session: initialized, component_mode={component_mode}");
        Ok(Self {
            provider,
            state: SessionState::Initialized,
            component_mode,
            volume_root: None,
            set: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive Discovery, Prepare and Commit for the given volume root.
    pub fn setup(&mut self, volume_root: &Path) -> Result<(), BackupError> {
        if self.state != SessionState::Initialized {
            return Err(BackupError::BadSessionState(self.state));
        }
        self.discover(volume_root)?;
        self.prepare()?;
        self.commit()
    }

    /// Resolve a live path into the committed snapshot's namespace.
    pub fn resolve_snapshot_path(&self, live: &Path) -> Result<PathBuf, BackupError> {
        if self.state != SessionState::Committed {
            return Err(BackupError::NotCommitted(self.state));
        }
        // Both are Some once Committed.
        let set = self.set.as_ref().expect("committed session has a set");
        let snapshot_root = set.root().expect("committed set has a root");
        let volume_root = self
            .volume_root
            .as_ref()
            .expect("committed session has a volume root");
        resolve_snapshot_path(snapshot_root, volume_root, live)
    }

    // ----------------- state transitions -----------------

    fn discover(&mut self, volume_root: &Path) -> Result<(), BackupError> {
        if self.component_mode {
            self.examine_components();
        } else {
            // Full-volume mode never examines writers; free the metadata.
            self.provider.borrow_mut().free_writer_metadata();
        }

        let mut set = SnapshotSet::start(Rc::clone(&self.provider))
            .map_err(BackupError::SnapshotDiscoveryFailed)?;
        set.add_volume(volume_root)?;
        self.set = Some(set);
        self.volume_root = Some(volume_root.to_path_buf());
        self.state = SessionState::Discovering;
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), BackupError> {
        {
            let mut p = self.provider.borrow_mut();
            p.set_backup_state(self.component_mode, false, BackupKind::Full)
                .map_err(BackupError::SnapshotPrepareFailed)?;
            p.prepare_for_backup()
                .map_err(BackupError::SnapshotPrepareFailed)?;
        }
        self.state = SessionState::Prepared;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BackupError> {
        let set = self.set.as_mut().expect("prepare ran after discovery");
        set.commit().map_err(BackupError::SnapshotCommitFailed)?;
        self.state = SessionState::Committed;
        Ok(())
    }

    /// Log writer/component metadata (component mode).
    fn examine_components(&self) {
        let p = self.provider.borrow();
        for writer in p.writer_metadata() {
            debug!("session: examining metadata for writer {}", writer.name);
            for cmp in &writer.components {
                debug!("session:   component {} ({})", cmp.name, cmp.caption);
                for file in &cmp.files {
                    debug!("session:     files {}", file.full_specification());
                }
            }
        }
    }

    /// Report backup outcome for every enrolled component, then signal
    /// completion. No-op component loop in full-volume mode.
    fn complete(&mut self, succeeded: bool) -> Result<(), ProviderError> {
        let mut p = self.provider.borrow_mut();
        if self.component_mode {
            let writers = p.writer_metadata();
            for writer in &writers {
                for cmp in &writer.components {
                    p.set_backup_succeeded(&writer.instance_id, &writer.writer_id, cmp, succeeded)?;
                }
            }
            p.free_writer_metadata();
        }
        p.backup_complete()
    }

    /// Idempotent terminal teardown: Completed then Disposed.
    fn teardown(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        let succeeded = self.state == SessionState::Committed;
        match self.complete(succeeded) {
            Ok(()) => debug!("session: backup completion reported, succeeded={succeeded}"),
            // The provider may legitimately reject completion when no
            // writers were ever engaged; the one tolerated error here.
            Err(ProviderError::BadState) => {
                debug!("session: provider rejected completion (no writers engaged)")
            }
            Err(e) => warn!("session: completion report failed: {e}"),
        }
        self.state = SessionState::Completed;

        // Inner resource first: dropping the set deletes it best-effort.
        self.set = None;
        self.provider.borrow_mut().release();
        self.state = SessionState::Disposed;
    }
}

impl<P: SnapshotProvider> Drop for SnapshotSession<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
