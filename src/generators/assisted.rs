//! Model-assisted generators.
//!
//! Each one renders a named prompt, asks the orchestrator for content of a
//! declared format, runs the format validator plus its own structural check,
//! and writes a single file. A response that fails validation is re-requested
//! with the validator's message appended to the prompt, up to
//! `regenerate_on_invalid` times.

use super::contract::{Generator, GeneratorContext, GeneratorError, GeneratorKind};
use crate::config::ProjectConfig;
use crate::fs::{FileArtifact, OutputScope};
use crate::generation::{
    GenerationOptions, GenerationOrchestrator, GenerationRequest, GenerationResult, OutputFormat,
    ValidationError,
};
use crate::prompt::library::VALIDATION_FEEDBACK;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extra structural check beyond the format validator. Returns a message on
/// failure.
pub type ContentCheck = fn(&str) -> Result<(), String>;

/// Shared access to the model for every assisted generator in a run.
#[derive(Clone)]
pub struct Assistant {
    orchestrator: Arc<GenerationOrchestrator>,
    options: GenerationOptions,
    regenerate_on_invalid: u32,
}

impl Assistant {
    pub fn new(
        orchestrator: Arc<GenerationOrchestrator>,
        options: GenerationOptions,
        regenerate_on_invalid: u32,
    ) -> Self {
        Self {
            orchestrator,
            options,
            regenerate_on_invalid,
        }
    }

    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    /// Generate content that passes `format` validation and `check`.
    pub async fn produce(
        &self,
        generator: &str,
        prompt_name: &str,
        format: OutputFormat,
        check: Option<ContentCheck>,
        mut vars: HashMap<String, String>,
        ctx: &GeneratorContext,
    ) -> Result<GenerationResult, GeneratorError> {
        let base = self.orchestrator.prompts().template(prompt_name)?.to_string();
        let mut template = base.clone();

        let mut attempt = 0u32;
        loop {
            let request = GenerationRequest::new(template.clone(), vars.clone(), format);
            let result = self
                .orchestrator
                .generate(&request, &self.options, &ctx.cancel)
                .await?;

            let verdict = format.validate(result.content()).and_then(|()| match check {
                Some(check) => check(result.content()).map_err(|message| ValidationError {
                    format,
                    message,
                }),
                None => Ok(()),
            });

            let err = match verdict {
                Ok(()) => {
                    debug!(generator, attempt, "model output accepted");
                    return Ok(result);
                }
                Err(err) => err,
            };

            if attempt >= self.regenerate_on_invalid {
                warn!(generator, attempt, error = %err, "model output rejected");
                return Err(err.into());
            }

            attempt += 1;
            warn!(generator, attempt, error = %err, "model output rejected, regenerating");
            template = format!("{}\n\n{}", base.trim_end(), VALIDATION_FEEDBACK);
            vars.insert("validation_feedback".to_string(), err.to_string());
        }
    }
}

/// A generator that writes one model-produced file.
pub struct AssistedGenerator {
    name: &'static str,
    prompt: &'static str,
    format: OutputFormat,
    output: &'static str,
    executable: bool,
    check: Option<ContentCheck>,
    assistant: Assistant,
}

impl AssistedGenerator {
    pub fn new(
        name: &'static str,
        prompt: &'static str,
        format: OutputFormat,
        output: &'static str,
        assistant: Assistant,
    ) -> Self {
        Self {
            name,
            prompt,
            format,
            output,
            executable: false,
            check: None,
            assistant,
        }
    }

    pub fn executable(mut self) -> Self {
        self.executable = true;
        self
    }

    pub fn with_check(mut self, check: ContentCheck) -> Self {
        self.check = Some(check);
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

#[async_trait]
impl Generator for AssistedGenerator {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::ModelAssisted
    }

    fn outputs(&self, _config: &ProjectConfig) -> Vec<PathBuf> {
        vec![PathBuf::from(self.output)]
    }

    async fn generate(
        &self,
        _config: &ProjectConfig,
        scope: &OutputScope,
        ctx: &GeneratorContext,
    ) -> Result<Vec<FileArtifact>, GeneratorError> {
        let mut vars = ctx.project.to_template_vars();
        vars.insert(
            "repository_context".to_string(),
            ctx.project.external_summary(),
        );
        vars.insert("upstream_artifacts".to_string(), ctx.upstream_summary());

        let result = self
            .assistant
            .produce(self.name, self.prompt, self.format, self.check, vars, ctx)
            .await?;

        let artifact = if self.executable {
            scope.write_executable(self.output, result.content())?
        } else {
            scope.write(self.output, result.content())?
        };
        Ok(vec![artifact])
    }
}
