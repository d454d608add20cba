//! One-shot backup runner.
//!
//! Configuration comes from SB_* environment variables; flags override.
//! Exit code 1 when the run raised an alert.

use std::cell::Cell;
use std::path::PathBuf;

use clap::Parser;

use shadowbak::{
    perform_backup, AlertSink, ArchiveCodec, BackupConfig, FrozenDirProvider, LiveViewProvider,
    TarArchiver,
};

#[derive(Parser, Debug)]
#[command(name = "shadowbak", version, about = "Run one crash-consistent backup")]
struct Args {
    /// Source directory to back up (overrides SB_SAVE_PATH).
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// Destination root for staging and archives (overrides SB_BACKUP_PATH).
    #[arg(long)]
    backup_path: Option<PathBuf>,

    /// Archive base name (overrides SB_CONFIG_NAME).
    #[arg(long)]
    name: Option<String>,

    /// Volume root to enroll instead of the filesystem root of the source.
    #[arg(long)]
    volume_root: Option<PathBuf>,

    /// Compress with zstd instead of gzip.
    #[arg(long)]
    zstd: bool,

    /// Use the freezing simulation provider instead of the live-view
    /// fallback (copies the enrolled volume root at commit).
    #[arg(long)]
    frozen: bool,
}

/// Alert sink for a terminal run: print and remember that something fired.
struct StderrAlert {
    fired: Cell<bool>,
}

impl AlertSink for StderrAlert {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
        self.fired.set(true);
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = BackupConfig::from_env();
    if let Some(p) = args.save_path {
        cfg = cfg.with_save_path(p);
    }
    if let Some(p) = args.backup_path {
        cfg = cfg.with_backup_path(p);
    }
    if let Some(n) = args.name {
        cfg = cfg.with_config_name(n);
    }
    if args.volume_root.is_some() {
        cfg = cfg.with_volume_root(args.volume_root);
    }
    if args.zstd {
        cfg = cfg.with_codec(ArchiveCodec::Zstd);
    }
    log::info!("{cfg}");

    let archiver = TarArchiver::new(cfg.codec);
    let alerts = StderrAlert {
        fired: Cell::new(false),
    };

    if args.frozen {
        let scratch = cfg.backup_path.join(".shadowbak-scratch");
        perform_backup(&cfg, FrozenDirProvider::new(scratch), &archiver, &alerts);
    } else {
        perform_backup(&cfg, LiveViewProvider::new(), &archiver, &alerts);
    }

    if alerts.fired.get() {
        std::process::exit(1);
    }
}
