//! Snapshot session: lifecycle of exactly one provider snapshot set.
//!
//! Split into submodules:
//! - machine.rs: SnapshotSession (state machine, guarded operations,
//!   teardown-on-drop).
//! - set.rs: SnapshotSet (set/snapshot ids, commit, best-effort delete on
//!   drop).
//!
//! The state sequence is linear; a failure at any step leaves the session
//! mid-state and Drop still walks it to Disposed: report completion
//! (provider BadState tolerated), drop the inner set (which deletes the
//! snapshot set best-effort), release the provider context. Teardown runs
//! exactly once on every exit path.

mod machine;
mod set;

pub use machine::{SessionState, SnapshotSession};
pub use set::SnapshotSet;
