//! Error types for the generation layer.

use super::format::OutputFormat;
use crate::llm::ModelError;
use crate::prompt::TemplateError;
use thiserror::Error;

/// A generation call that did not produce usable text.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ModelError,
    },

    #[error("model call failed: {0}")]
    Model(#[source] ModelError),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model response was cut off at the {max_tokens}-token limit")]
    Truncated { max_tokens: u32 },

    #[error("unsupported output format '{0}' (expected yaml, json, markdown or bash)")]
    UnsupportedFormat(String),

    #[error("invalid generation options: {0}")]
    InvalidRequest(String),
}

/// Model output that is text but not a well-formed document of its format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{format} output failed validation: {message}")]
pub struct ValidationError {
    pub format: OutputFormat,
    pub message: String,
}

/// The caller cancelled the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct CancelledError;

/// Everything `GenerationOrchestrator` can fail with.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("prompt template error: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Cancelled(#[from] CancelledError),
}

impl GenerationFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GenerationFailure::Cancelled(_))
    }
}
