//! The uniform generator interface.

use crate::config::ProjectConfig;
use crate::fs::{FileArtifact, OutputError, OutputScope};
use crate::generation::{CancelledError, GenerationError, GenerationFailure, ValidationError};
use crate::prompt::{ProjectContext, TemplateError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How a generator produces content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Renders static templates from project fields only. No network.
    Template,
    /// Asks the model through the orchestrator and validates the answer.
    ModelAssisted,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Template => f.write_str("template"),
            GeneratorKind::ModelAssisted => f.write_str("model"),
        }
    }
}

/// Why a generator failed.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cancelled(#[from] CancelledError),

    #[error(transparent)]
    Output(#[from] OutputError),

    /// The generator's task ended without reporting (e.g. it panicked).
    #[error("generator task ended abnormally: {0}")]
    TaskFailed(String),
}

impl GeneratorError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GeneratorError::Cancelled(_))
    }
}

impl From<GenerationFailure> for GeneratorError {
    fn from(failure: GenerationFailure) -> Self {
        match failure {
            GenerationFailure::Template(e) => GeneratorError::Template(e),
            GenerationFailure::Generation(e) => GeneratorError::Generation(e),
            GenerationFailure::Cancelled(e) => GeneratorError::Cancelled(e),
        }
    }
}

/// Everything a generator may read besides the project config.
#[derive(Debug, Clone, Default)]
pub struct GeneratorContext {
    /// Template variables for the project, with external entries merged.
    pub project: ProjectContext,
    /// Artifacts produced by the generators this one depends on.
    pub upstream: Vec<FileArtifact>,
    pub cancel: CancellationToken,
}

impl GeneratorContext {
    /// Upstream artifacts as a prompt-ready listing, or `"(none)"`.
    pub fn upstream_summary(&self) -> String {
        if self.upstream.is_empty() {
            return "(none)".to_string();
        }
        self.upstream
            .iter()
            .map(|a| format!("--- {} ---\n{}", a.path.display(), a.content.trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// An artifact producer in the pipeline.
///
/// # Contract
///
/// - `outputs` lists every relative path `generate` may write, before any
///   generator runs. Writes go through the `OutputScope`, which rejects
///   anything else.
/// - Idempotence is structural: running twice with an identical
///   `ProjectConfig` yields artifacts that pass the same validation both
///   times. Template generators are also byte-identical across runs; model
///   generators may differ in wording.
/// - `generate` must observe `ctx.cancel` at its suspension points.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Unique name within a pipeline.
    fn name(&self) -> &str;

    fn kind(&self) -> GeneratorKind;

    /// Relative paths this generator writes for `config`.
    fn outputs(&self, config: &ProjectConfig) -> Vec<PathBuf>;

    async fn generate(
        &self,
        config: &ProjectConfig,
        scope: &OutputScope,
        ctx: &GeneratorContext,
    ) -> Result<Vec<FileArtifact>, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::WriteStatus;

    #[test]
    fn failure_maps_to_generator_error() {
        let err = GeneratorError::from(GenerationFailure::Cancelled(CancelledError));
        assert!(err.is_cancelled());

        let err = GeneratorError::from(GenerationFailure::Generation(
            GenerationError::EmptyResponse,
        ));
        assert_eq!(err.to_string(), "model returned an empty response");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn upstream_summary() {
        let mut ctx = GeneratorContext::default();
        assert_eq!(ctx.upstream_summary(), "(none)");

        ctx.upstream.push(FileArtifact {
            path: PathBuf::from(".github/workflows/ci.yml"),
            content: "name: CI\n".to_string(),
            status: WriteStatus::Written,
        });
        assert_eq!(
            ctx.upstream_summary(),
            "--- .github/workflows/ci.yml ---\nname: CI"
        );
    }
}
