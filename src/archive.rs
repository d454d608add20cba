//! Archiving collaborator: compress a staged directory into a single
//! archive file.
//!
//! The shipped implementation packs the directory into a tar stream
//! compressed with gzip (default) or zstd. The archive is written to a
//! `.partial` neighbor and renamed into place only after the encoder
//! finished, so a failed run never leaves a partial file at the final name.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;

use crate::errors::BackupError;

/// Anything that can compress a directory into a single named archive file.
pub trait Archiver {
    fn compress_dir(&self, src: &Path, dest: &Path) -> Result<(), BackupError>;
}

/// Compression codec for the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveCodec {
    #[default]
    Gzip,
    Zstd,
}

impl ArchiveCodec {
    /// File extension produced by this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveCodec::Gzip => "tar.gz",
            ArchiveCodec::Zstd => "tar.zst",
        }
    }

    /// Parse "gzip"/"gz" or "zstd"/"zst" (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Some(ArchiveCodec::Gzip),
            "zstd" | "zst" => Some(ArchiveCodec::Zstd),
            _ => None,
        }
    }
}

/// Tar-based archiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarArchiver {
    codec: ArchiveCodec,
}

impl TarArchiver {
    pub fn new(codec: ArchiveCodec) -> Self {
        Self { codec }
    }
}

impl Archiver for TarArchiver {
    fn compress_dir(&self, src: &Path, dest: &Path) -> Result<(), BackupError> {
        let partial = partial_path(dest);
        let result =
            write_archive(self.codec, src, &partial).and_then(|()| fs::rename(&partial, dest));
        match result {
            Ok(()) => {
                debug!("archive: wrote {}", dest.display());
                Ok(())
            }
            Err(e) => {
                // Discard the partial output; the final name was never touched.
                let _ = fs::remove_file(&partial);
                Err(BackupError::CompressionFailed {
                    dest: dest.to_path_buf(),
                    source: e,
                })
            }
        }
    }
}

fn write_archive(codec: ArchiveCodec, src: &Path, out: &Path) -> std::io::Result<()> {
    let file = File::create(out)?;
    match codec {
        ArchiveCodec::Gzip => {
            let enc = GzEncoder::new(file, Compression::default());
            let mut builder = tar::Builder::new(enc);
            builder.append_dir_all(".", src)?;
            let enc = builder.into_inner()?;
            enc.finish()?;
        }
        ArchiveCodec::Zstd => {
            let enc = zstd::stream::write::Encoder::new(file, 0)?;
            let mut builder = tar::Builder::new(enc);
            builder.append_dir_all(".", src)?;
            let enc = builder.into_inner()?;
            enc.finish()?;
        }
    }
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_os_string();
    s.push(".partial");
    PathBuf::from(s)
}

/// Archive file name: `{name}_backup_{MM-dd-yyyy-HHmm-ss}.{ext}`.
///
/// The timestamp is taken from one clock read at run start and renders real
/// seconds, so two sequential runs get distinct names.
pub fn archive_file_name(
    config_name: &str,
    started_at: DateTime<Local>,
    codec: ArchiveCodec,
) -> String {
    format!(
        "{}_backup_{}.{}",
        config_name,
        started_at.format("%m-%d-%Y-%H%M-%S"),
        codec.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn archive_name_format() {
        let ts = Local.with_ymd_and_hms(2026, 3, 7, 14, 5, 9).unwrap();
        let name = archive_file_name("world", ts, ArchiveCodec::Gzip);
        assert_eq!(name, "world_backup_03-07-2026-1405-09.tar.gz");
    }

    #[test]
    fn archive_name_zstd_extension() {
        let ts = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let name = archive_file_name("w", ts, ArchiveCodec::Zstd);
        assert!(name.ends_with(".tar.zst"));
    }

    #[test]
    fn codec_parse() {
        assert_eq!(ArchiveCodec::parse("gzip"), Some(ArchiveCodec::Gzip));
        assert_eq!(ArchiveCodec::parse(" ZSTD "), Some(ArchiveCodec::Zstd));
        assert_eq!(ArchiveCodec::parse("lz4"), None);
    }

    #[test]
    fn partial_name_appends_suffix() {
        let p = partial_path(Path::new("/tmp/a.tar.gz"));
        assert_eq!(p, PathBuf::from("/tmp/a.tar.gz.partial"));
    }
}
