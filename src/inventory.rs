use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::error::{LvlupError, Result};

/// Lists the tools currently present in the bin directory.
///
/// Every non-directory entry directly inside `bin_dir` counts as a tool,
/// named after its file name. A missing directory is an empty set. Entries
/// whose name is not valid UTF-8 cannot be declared or addressed by name, so
/// they are skipped with a warning.
///
/// # Errors
/// Returns [`LvlupError::DirectoryIo`] if `bin_dir` exists but is not a
/// readable directory.
pub fn list_installed<P: AsRef<Path>>(bin_dir: P) -> Result<BTreeSet<String>> {
    let bin_dir = bin_dir.as_ref();
    let mut installed = BTreeSet::new();
    if !bin_dir.exists() {
        log::debug!("Bin directory {} does not exist yet", bin_dir.display());
        return Ok(installed);
    }
    if !bin_dir.is_dir() {
        let source = io::Error::new(io::ErrorKind::NotADirectory, "not a directory");
        return Err(LvlupError::directory_io(bin_dir, source));
    }
    for entry in WalkDir::new(bin_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| LvlupError::directory_io(bin_dir, io::Error::from(e)))?;
        if entry.file_type().is_dir() {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => {
                installed.insert(name.to_string());
            }
            None => log::warn!(
                "Ignoring {}: file name is not valid UTF-8",
                entry.path().display()
            ),
        }
    }
    log::debug!("Found {} installed tools in {}", installed.len(), bin_dir.display());
    Ok(installed)
}

/// Returns the path the binary of `tool` lives at.
pub fn binary_path<P: AsRef<Path>>(bin_dir: P, tool: &str) -> PathBuf {
    bin_dir.as_ref().join(tool)
}

/// Checks whether a binary for `tool` is present right now.
pub fn is_installed<P: AsRef<Path>>(bin_dir: P, tool: &str) -> bool {
    std::fs::symlink_metadata(binary_path(bin_dir, tool))
        .map(|meta| !meta.is_dir())
        .unwrap_or(false)
}

/// Deletes the binary of `tool` from the bin directory.
///
/// Returns `Ok(true)` if a file was deleted and `Ok(false)` if there was
/// nothing to delete.
///
/// # Errors
/// Returns [`LvlupError::RemovalIo`] for any failure other than the file being absent.
pub fn remove_binary<P: AsRef<Path>>(bin_dir: P, tool: &str) -> Result<bool> {
    let path = binary_path(bin_dir, tool);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            log::debug!("Deleted {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(LvlupError::RemovalIo { path, source }),
    }
}
