//! Filesystem utilities for qualforge.
//!
//! Atomic writes plus the scoped target directory every generator writes
//! through.

pub mod atomic;
mod target;

pub use atomic::{atomic_write, atomic_write_file};
pub use target::{
    FileArtifact, OutputError, OutputScope, TargetDir, TargetOptions, WriteStatus,
    is_safe_relative,
};
