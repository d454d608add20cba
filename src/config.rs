//! Backup run configuration.
//!
//! An explicit value passed into the orchestrator at call time; no hidden
//! process-wide state. `from_env()` reads the SB_* variables, builder-style
//! `with_*` setters override individual fields.
//!
//! Fields:
//! - save_path:     source directory to back up (must exist at run start).
//! - backup_path:   destination root for staging dirs and final archives.
//! - config_name:   base name used in archive file names.
//! - volume_root:   optional override of the enrolled volume root; None
//!   means the filesystem root of save_path. An explicit override narrows
//!   what the provider has to freeze.
//! - component_mode: examine writers/components instead of plain
//!   full-volume mode (default off).
//! - codec:         archive compression codec (gzip default).

use std::fmt;
use std::path::PathBuf;

use crate::archive::ArchiveCodec;

#[derive(Debug, Clone, Default)]
pub struct BackupConfig {
    pub save_path: PathBuf,
    pub backup_path: PathBuf,
    pub config_name: String,
    pub volume_root: Option<PathBuf>,
    pub component_mode: bool,
    pub codec: ArchiveCodec,
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_ascii_lowercase())
        .map(|s| s == "1" || s == "true" || s == "yes" || s == "on")
}

impl BackupConfig {
    /// Load configuration from environment variables:
    /// SB_SAVE_PATH, SB_BACKUP_PATH, SB_CONFIG_NAME, SB_VOLUME_ROOT,
    /// SB_COMPONENT_MODE, SB_ARCHIVE_CODEC.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SB_SAVE_PATH") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.save_path = PathBuf::from(s);
            }
        }
        if let Ok(v) = std::env::var("SB_BACKUP_PATH") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.backup_path = PathBuf::from(s);
            }
        }
        if let Ok(v) = std::env::var("SB_CONFIG_NAME") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.config_name = s.to_string();
            }
        }
        if let Ok(v) = std::env::var("SB_VOLUME_ROOT") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.volume_root = Some(PathBuf::from(s));
            }
        }
        if let Some(on) = env_bool("SB_COMPONENT_MODE") {
            cfg.component_mode = on;
        }
        if let Ok(v) = std::env::var("SB_ARCHIVE_CODEC") {
            if let Some(codec) = ArchiveCodec::parse(&v) {
                cfg.codec = codec;
            }
        }

        cfg
    }

    // Fluent setters (builder-style) to override specific fields.

    pub fn with_save_path(mut self, p: impl Into<PathBuf>) -> Self {
        self.save_path = p.into();
        self
    }

    pub fn with_backup_path(mut self, p: impl Into<PathBuf>) -> Self {
        self.backup_path = p.into();
        self
    }

    pub fn with_config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = name.into();
        self
    }

    pub fn with_volume_root(mut self, root: Option<PathBuf>) -> Self {
        self.volume_root = root;
        self
    }

    pub fn with_component_mode(mut self, on: bool) -> Self {
        self.component_mode = on;
        self
    }

    pub fn with_codec(mut self, codec: ArchiveCodec) -> Self {
        self.codec = codec;
        self
    }
}

impl fmt::Display for BackupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BackupConfig {{ save_path: {}, backup_path: {}, config_name: {}, \
             volume_root: {}, component_mode: {}, codec: {:?} }}",
            self.save_path.display(),
            self.backup_path.display(),
            self.config_name,
            self.volume_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default(path root)".to_string()),
            self.component_mode,
            self.codec,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides() {
        let cfg = BackupConfig::default()
            .with_save_path("/srv/saves")
            .with_backup_path("/srv/backups")
            .with_config_name("world")
            .with_codec(ArchiveCodec::Zstd);
        assert_eq!(cfg.save_path, PathBuf::from("/srv/saves"));
        assert_eq!(cfg.config_name, "world");
        assert_eq!(cfg.codec, ArchiveCodec::Zstd);
        assert!(!cfg.component_mode);
        assert!(cfg.volume_root.is_none());
    }
}
