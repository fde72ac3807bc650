//! Application-level error type for the qualforge CLI.
//!
//! Layer-specific errors (templates, model calls, generators, plans) live next
//! to the code that raises them. This type is what commands return, and each
//! variant maps to a process exit code.

use crate::exit_codes;
use crate::pipeline::PlanError;
use thiserror::Error;

/// Main error type for qualforge commands.
#[derive(Error, Debug)]
pub enum QualforgeError {
    /// User provided invalid arguments or the environment is unusable.
    #[error("{0}")]
    UserError(String),

    /// The configuration file could not be read, parsed, or validated.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The pipeline plan was rejected before any generator ran.
    #[error("invalid pipeline: {0}")]
    PlanError(#[from] PlanError),

    /// A critical generator failed (or a single generation call failed).
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// The run finished but optional artifacts are missing.
    #[error("generation incomplete: {0}")]
    Incomplete(String),

    /// The run was cancelled by the caller.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl QualforgeError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            QualforgeError::UserError(_) => exit_codes::USER_ERROR,
            QualforgeError::ConfigError(_) => exit_codes::USER_ERROR,
            QualforgeError::PlanError(_) => exit_codes::USER_ERROR,
            QualforgeError::GenerationFailed(_) => exit_codes::GENERATION_ABORTED,
            QualforgeError::Incomplete(_) => exit_codes::INCOMPLETE,
            QualforgeError::Cancelled(_) => exit_codes::CANCELLED,
        }
    }
}

/// Result type alias for qualforge commands.
pub type Result<T> = std::result::Result<T, QualforgeError>;
