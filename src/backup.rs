//! Backup orchestrator: one run, end to end.
//!
//! Sequence: validate configuration -> staging directory -> snapshot
//! session -> resolve source into the snapshot namespace -> tree copy into
//! staging -> archive -> manifest sidecar -> remove staging.
//!
//! Failure policy: nothing escapes perform_backup. Every fatal condition is
//! logged and converted into exactly one alert. The session is a scoped
//! resource, so the snapshot is torn down whichever step failed; the
//! staging directory is removed best-effort on every failure path. No
//! retries: a failed run ends the run, the next invocation starts fresh.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{error, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::alert::AlertSink;
use crate::archive::{archive_file_name, Archiver};
use crate::config::BackupConfig;
use crate::copytree::{copy_tree, CopyStats};
use crate::pathmap::volume_root_of;
use crate::provider::SnapshotProvider;
use crate::session::SnapshotSession;

/// Summary sidecar written next to a successful archive (best-effort).
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupManifest {
    pub config_name: String,
    pub source: String,
    pub started_at: String,
    pub archive: String,
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
}

/// Run one backup. Side effect on success: an archive file under
/// `cfg.backup_path`. On any failure: no archive, one alert, and all
/// transient state (staging directory, snapshot set) cleaned up.
pub fn perform_backup<P, A, S>(cfg: &BackupConfig, provider: P, archiver: &A, alerts: &S)
where
    P: SnapshotProvider,
    A: Archiver,
    S: AlertSink,
{
    // Configuration error, not an exceptional one: alert and return.
    if cfg.save_path.as_os_str().is_empty() || !cfg.save_path.is_dir() {
        warn!(
            "backup: SavePath not set or does not exist: {}",
            cfg.save_path.display()
        );
        alerts.alert(
            "SavePath is not set or does not exist.\n\n\
             Backup process aborted.\n\n\
             Check your configuration.",
        );
        return;
    }

    match run_backup(cfg, provider, archiver) {
        Ok(archive) => {
            info!("backup: done, archive={}", archive.display());
        }
        Err(e) => {
            error!("backup: failed: {e:#}");
            alerts.alert(&format!(
                "An error occurred during the backup process:\n{e:#}"
            ));
        }
    }
}

fn run_backup<P, A>(cfg: &BackupConfig, provider: P, archiver: &A) -> Result<PathBuf>
where
    P: SnapshotProvider,
    A: Archiver,
{
    let started_at = Local::now();
    info!(
        "backup: start, source={}, dest={}, name={}",
        cfg.save_path.display(),
        cfg.backup_path.display(),
        cfg.config_name
    );

    let staging = staging_dir(&cfg.backup_path, &cfg.config_name);
    fs::create_dir_all(&staging)
        .with_context(|| format!("create staging dir {}", staging.display()))?;

    let out = snapshot_and_archive(cfg, provider, archiver, &staging, started_at);
    if out.is_err() {
        // Leftover staging has no retry value; the next run starts fresh.
        if let Err(e) = fs::remove_dir_all(&staging) {
            warn!(
                "backup: staging cleanup failed for {}: {e}",
                staging.display()
            );
        }
    }
    out
}

/// The snapshot-scoped part of the run. The session created here is torn
/// down on scope exit no matter which step failed.
fn snapshot_and_archive<P, A>(
    cfg: &BackupConfig,
    provider: P,
    archiver: &A,
    staging: &Path,
    started_at: DateTime<Local>,
) -> Result<PathBuf>
where
    P: SnapshotProvider,
    A: Archiver,
{
    let volume_root = match &cfg.volume_root {
        Some(root) => root.clone(),
        None => volume_root_of(&cfg.save_path)?,
    };

    let mut session = SnapshotSession::new(provider, cfg.component_mode)?;
    session.setup(&volume_root)?;

    let snap_src = session.resolve_snapshot_path(&cfg.save_path)?;
    info!(
        "backup: snapshot committed, copying from {}",
        snap_src.display()
    );

    let stats = copy_tree(&snap_src, staging)?;
    info!(
        "backup: copied files={}, dirs={}, bytes={}",
        stats.files, stats.dirs, stats.bytes
    );

    let archive_path = cfg
        .backup_path
        .join(archive_file_name(&cfg.config_name, started_at, cfg.codec));
    archiver.compress_dir(staging, &archive_path)?;

    // Advisory sidecar; a failure here must not fail the run.
    if let Err(e) = write_manifest(cfg, &archive_path, started_at, &stats) {
        warn!("backup: manifest write failed: {e:#}");
    }

    fs::remove_dir_all(staging)
        .with_context(|| format!("remove staging dir {}", staging.display()))?;

    Ok(archive_path)
}

/// Collision-resistant staging directory under the destination root.
fn staging_dir(backup_path: &Path, config_name: &str) -> PathBuf {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    backup_path.join(format!("{config_name}_staging_{suffix}"))
}

fn write_manifest(
    cfg: &BackupConfig,
    archive_path: &Path,
    started_at: DateTime<Local>,
    stats: &CopyStats,
) -> Result<()> {
    let manifest = BackupManifest {
        config_name: cfg.config_name.clone(),
        source: cfg.save_path.display().to_string(),
        started_at: started_at.to_rfc3339(),
        archive: archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        files: stats.files,
        dirs: stats.dirs,
        bytes: stats.bytes,
    };

    let mut path = archive_path.as_os_str().to_os_string();
    path.push(".manifest.json");
    let path = PathBuf::from(path);

    let data = serde_json::to_vec_pretty(&manifest).context("serialize manifest")?;
    let mut f = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    f.write_all(&data)?;
    Ok(())
}
