// tests/copy_tree.rs
//
// Run only this file:
//   cargo test --test copy_tree -- --nocapture
//
// Covers:
// 1) Structure and content preservation across nested directories.
// 2) Copy-once: a second copy never overwrites existing destination files.
// 3) Missing source is a typed failure.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use shadowbak::{copy_tree, BackupError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("sbtest-copy-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn copies_structure_and_content() -> Result<()> {
    let root = unique_root("structure");
    let src = root.join("src");
    let dst = root.join("dst");
    fs::create_dir_all(src.join("sub/deep"))?;
    fs::write(src.join("a.txt"), b"alpha")?;
    fs::write(src.join("sub/b.txt"), b"beta")?;
    fs::write(src.join("sub/deep/c.bin"), vec![0xA5u8; 4096])?;

    let stats = copy_tree(&src, &dst)?;

    assert_eq!(fs::read(dst.join("a.txt"))?, b"alpha");
    assert_eq!(fs::read(dst.join("sub/b.txt"))?, b"beta");
    assert_eq!(fs::read(dst.join("sub/deep/c.bin"))?, vec![0xA5u8; 4096]);
    assert_eq!(stats.files, 3);
    // src itself + sub + sub/deep
    assert_eq!(stats.dirs, 3);
    assert_eq!(stats.bytes, 5 + 4 + 4096);

    Ok(())
}

#[test]
fn second_copy_leaves_existing_files_untouched() -> Result<()> {
    let root = unique_root("noclobber");
    let src = root.join("src");
    let dst = root.join("dst");
    fs::create_dir_all(src.join("sub"))?;
    fs::write(src.join("a.txt"), b"from-source")?;
    fs::write(src.join("sub/b.txt"), b"beta")?;

    copy_tree(&src, &dst)?;

    // Locally diverge the destination copy, then copy again.
    fs::write(dst.join("a.txt"), b"locally-changed")?;
    let stats = copy_tree(&src, &dst)?;

    // The existing file must not be overwritten and the copy must not fail.
    assert_eq!(fs::read(dst.join("a.txt"))?, b"locally-changed");
    assert_eq!(fs::read(dst.join("sub/b.txt"))?, b"beta");
    assert_eq!(stats.files, 0);

    Ok(())
}

#[test]
fn missing_source_is_directory_not_found() {
    let root = unique_root("missing");
    let err = copy_tree(&root.join("nope"), &root.join("dst")).unwrap_err();
    assert!(matches!(err, BackupError::DirectoryNotFound(_)));
    // Nothing created on the failure path.
    assert!(!root.join("dst").exists());
}

#[test]
fn empty_source_copies_no_files() -> Result<()> {
    let root = unique_root("empty");
    let src = root.join("src");
    let dst = root.join("dst");
    fs::create_dir_all(&src)?;

    let stats = copy_tree(&src, &dst)?;

    assert!(dst.is_dir());
    assert_eq!(stats.files, 0);
    assert_eq!(stats.dirs, 1);

    Ok(())
}
