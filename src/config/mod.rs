//! Configuration model for qualforge.
//!
//! This module defines the Config struct that represents `qualforge.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::{Config, ModelSettings, PipelineSettings, ProjectConfig, RetrySettings};
pub use types::{Criticality, ExecutionMode, Language, Toolchain};
