// ABOUTME: Atomic save and load of the whole table set to a single JSON file.
// ABOUTME: Writes to a .tmp sibling, fsyncs, and renames over the target for crash safety.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use taskd_core::TableSet;
use thiserror::Error;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save the table set using atomic write (write to .tmp, fsync, rename).
/// Creates the parent directory if it does not exist.
pub fn save_snapshot(path: &Path, tables: &TableSet) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(tables)?;
    let tmp = tmp_path(path);

    let mut file = File::create(&tmp)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;

    // Best-effort: the rename already succeeded, so a failed directory fsync
    // leaves consistent data behind.
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Load the table set from disk. Returns None if the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<TableSet>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let tables: TableSet = serde_json::from_str(&contents)?;
    Ok(Some(tables))
}
