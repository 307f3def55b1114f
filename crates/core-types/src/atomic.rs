//! Shared atomic-write primitive (§4.3, §4.7): serialize to a temporary
//! file in the target directory, flush it to stable storage, then
//! rename over the final path. The rename is the commit point — a
//! reader can never observe a half-written final file.
//!
//! Used by both `traversal-store` (C3) and `run-history` (C7), mirroring
//! how the teacher workspace factors this concern into a single helper
//! shared by `snapshot-store` and `event-store`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `data` to `path` atomically. Creates parent directories as
/// needed. The temporary file lives alongside the final path so the
/// rename stays within a single filesystem.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path_for(path);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{file_name}.tmp"))
}
