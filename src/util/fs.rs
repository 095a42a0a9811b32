//! Filesystem utilities.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Source of file modification times.
///
/// The orchestrator asks this instead of the filesystem directly so tests can
/// simulate an edited project descriptor without sleeping across seconds.
pub trait FileTimes {
    /// Modification time of `path`, or `None` if it cannot be read.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}

/// [`FileTimes`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFileTimes;

impl FileTimes for DiskFileTimes {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
///
/// The contents go to a temporary file in the same directory first and are
/// renamed into place, so a concurrent reader never sees a half-written file.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(())
}

/// Render a path with forward slashes, as CMake expects.
pub fn to_cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}
