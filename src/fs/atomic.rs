//! Atomic file writes for generated artifacts.
//!
//! Every artifact reaches the target directory the same way:
//! 1. Write content to `.{filename}.tmp` in the destination directory
//! 2. Sync the temp file to disk
//! 3. Rename it over the destination
//!
//! Rename within one directory is atomic on POSIX and replaces an existing
//! file on Windows, so a reader sees either the old file or the complete new
//! one. On crash a `.tmp` sibling may remain; it is overwritten next run.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Atomically write `content` to `path`, creating parent directories.
///
/// With `executable` set the file gets mode `0o755` on Unix before it becomes
/// visible under its final name.
pub fn atomic_write(path: &Path, content: &[u8], executable: bool) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path)?;

    if let Err(e) = write_and_sync(&temp_path, content, executable) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    sync_parent_dir(path);
    Ok(())
}

/// Atomically write a string to a regular (non-executable) file.
pub fn atomic_write_file(path: &Path, content: &str) -> io::Result<()> {
    atomic_write(path, content.as_bytes(), false)
}

fn temp_path_for(target: &Path) -> io::Result<PathBuf> {
    let filename = target.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid file path '{}'", target.display()),
        )
    })?;
    let parent = target.parent().unwrap_or(Path::new("."));
    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8], executable: bool) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    if executable {
        mark_executable(&file)?;
    }
    file.sync_all()
}

#[cfg(unix)]
fn mark_executable(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_file: &File) -> io::Result<()> {
    Ok(())
}

/// Persist the directory entry after a rename.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
