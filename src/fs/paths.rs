//! Path and directory management.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};

/// Ledger file name inside the data directory.
pub const DATABASE_FILE_NAME: &str = "archive.db";

/// Per-user application data directory.
pub fn data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::Config("Could not determine a home directory for the ledger".into()))
}

/// Default ledger location.
pub fn default_database_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DATABASE_FILE_NAME))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Hidden temporary sibling for an in-progress write to `target`.
pub fn temp_path_for(target: &Path) -> PathBuf {
    let parent = target.parent().unwrap_or(Path::new("."));
    parent.join(format!(".{}.part", uuid::Uuid::new_v4()))
}
