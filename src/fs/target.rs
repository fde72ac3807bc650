//! The target directory and per-generator write scopes.
//!
//! `TargetDir` is acquired once per run. Each generator gets an `OutputScope`
//! that only accepts the relative paths the generator declared up front, each
//! at most once, so generators sharing the directory cannot clobber each
//! other or escape it.

use super::atomic::atomic_write;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Whether a relative path stays inside the directory it is joined to.
///
/// Rejects empty paths, absolute paths, and any `..` component.
pub fn is_safe_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}

/// Failures acquiring the target or writing inside it.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("target '{path}' exists and is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("invalid preserve glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{generator} tried to write '{path}', which it did not declare")]
    Undeclared { generator: String, path: PathBuf },

    #[error("{generator} wrote '{path}' more than once")]
    AlreadyWritten { generator: String, path: PathBuf },

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What happened to an artifact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    /// Content was written (new file or changed content).
    Written,
    /// The file already held exactly this content.
    Unchanged,
    /// An existing file matched a preserve glob and was left alone.
    Preserved,
    /// Dry run; nothing touched.
    DryRun,
}

impl fmt::Display for WriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriteStatus::Written => "written",
            WriteStatus::Unchanged => "unchanged",
            WriteStatus::Preserved => "preserved",
            WriteStatus::DryRun => "dry-run",
        };
        f.write_str(s)
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    /// Path relative to the target directory.
    pub path: PathBuf,
    /// Final content (what was or would have been written).
    pub content: String,
    pub status: WriteStatus,
}

impl FileArtifact {
    pub fn is_written(&self) -> bool {
        self.status == WriteStatus::Written
    }
}

/// Options for acquiring a target directory.
#[derive(Debug, Clone, Default)]
pub struct TargetOptions {
    pub dry_run: bool,
    /// Globs, relative to the target, of existing files never to overwrite.
    pub preserve: Vec<String>,
}

/// The directory a run writes into.
#[derive(Debug, Clone)]
pub struct TargetDir {
    root: PathBuf,
    dry_run: bool,
    preserve: GlobSet,
}

impl TargetDir {
    /// Create (if needed) and claim the target directory.
    ///
    /// In dry-run mode the directory is not created.
    pub fn acquire(root: impl Into<PathBuf>, options: TargetOptions) -> Result<Self, OutputError> {
        let root = root.into();

        if root.exists() && !root.is_dir() {
            return Err(OutputError::NotADirectory { path: root });
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &options.preserve {
            let glob = Glob::new(pattern).map_err(|source| OutputError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let preserve = builder.build().map_err(|source| OutputError::InvalidGlob {
            pattern: options.preserve.join(", "),
            source,
        })?;

        if !options.dry_run {
            std::fs::create_dir_all(&root).map_err(|source| OutputError::Io {
                path: root.clone(),
                source,
            })?;
        }

        Ok(Self {
            root,
            dry_run: options.dry_run,
            preserve,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn is_preserved(&self, relative: &Path) -> bool {
        self.preserve.is_match(relative)
    }
}

/// Write access for one generator, limited to its declared outputs.
#[derive(Debug)]
pub struct OutputScope {
    target: Arc<TargetDir>,
    generator: String,
    declared: BTreeSet<PathBuf>,
    written: Mutex<HashSet<PathBuf>>,
}

impl OutputScope {
    pub fn new(
        target: Arc<TargetDir>,
        generator: impl Into<String>,
        declared: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            target,
            generator: generator.into(),
            declared: declared.into_iter().collect(),
            written: Mutex::new(HashSet::new()),
        }
    }

    pub fn target(&self) -> &TargetDir {
        &self.target
    }

    pub fn declared(&self) -> &BTreeSet<PathBuf> {
        &self.declared
    }

    /// Write a regular file.
    pub fn write(
        &self,
        relative: impl AsRef<Path>,
        content: &str,
    ) -> Result<FileArtifact, OutputError> {
        self.write_with_mode(relative.as_ref(), content, false)
    }

    /// Write a file with the executable bit set.
    pub fn write_executable(
        &self,
        relative: impl AsRef<Path>,
        content: &str,
    ) -> Result<FileArtifact, OutputError> {
        self.write_with_mode(relative.as_ref(), content, true)
    }

    fn write_with_mode(
        &self,
        relative: &Path,
        content: &str,
        executable: bool,
    ) -> Result<FileArtifact, OutputError> {
        if !self.declared.contains(relative) {
            return Err(OutputError::Undeclared {
                generator: self.generator.clone(),
                path: relative.to_path_buf(),
            });
        }

        {
            let mut written = self.written.lock().unwrap_or_else(|e| e.into_inner());
            if !written.insert(relative.to_path_buf()) {
                return Err(OutputError::AlreadyWritten {
                    generator: self.generator.clone(),
                    path: relative.to_path_buf(),
                });
            }
        }

        let status = self.place(relative, content, executable)?;
        debug!(
            generator = %self.generator,
            path = %relative.display(),
            status = %status,
            "artifact placed"
        );

        Ok(FileArtifact {
            path: relative.to_path_buf(),
            content: content.to_string(),
            status,
        })
    }

    fn place(
        &self,
        relative: &Path,
        content: &str,
        executable: bool,
    ) -> Result<WriteStatus, OutputError> {
        if self.target.dry_run {
            return Ok(WriteStatus::DryRun);
        }

        let full = self.target.root.join(relative);
        let io_err = |source| OutputError::Io {
            path: relative.to_path_buf(),
            source,
        };

        if full.exists() {
            if self.target.is_preserved(relative) {
                return Ok(WriteStatus::Preserved);
            }
            if std::fs::read(&full).map_err(io_err)? == content.as_bytes() {
                return Ok(WriteStatus::Unchanged);
            }
        }

        atomic_write(&full, content.as_bytes(), executable).map_err(io_err)?;
        Ok(WriteStatus::Written)
    }
}
