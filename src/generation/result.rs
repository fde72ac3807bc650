//! Request, option and result types for generation calls.

use super::error::GenerationError;
use super::format::OutputFormat;
use crate::config::ModelSettings;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::{Add, AddAssign};

/// Token counts for one or more model calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    input: u64,
    output: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    pub fn input(&self) -> u64 {
        self.input
    }

    pub fn output(&self) -> u64 {
        self.output
    }

    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input: self.input + rhs.input,
            output: self.output + rhs.output,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

/// One generation call: what to ask and what shape the answer must have.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template: String,
    pub context: HashMap<String, String>,
    pub format: OutputFormat,
}

impl GenerationRequest {
    pub fn new(
        template: impl Into<String>,
        context: HashMap<String, String>,
        format: OutputFormat,
    ) -> Self {
        Self {
            template: template.into(),
            context,
            format,
        }
    }
}

/// Model selection and sampling for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationOptions {
    /// Options for artifact generation.
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    /// Options for `tune`: the cheaper tune model unless overridden.
    pub fn for_tune(settings: &ModelSettings, model_override: Option<&str>) -> Self {
        Self {
            model: model_override
                .map(str::to_string)
                .unwrap_or_else(|| settings.tune_model.clone()),
            ..Self::from_settings(settings)
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.model.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "model must not be empty".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(GenerationError::InvalidRequest(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(GenerationError::InvalidRequest(format!(
                "temperature must be between 0.0 and 1.0 (found {})",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Accepted output of one generation call.
///
/// Only the orchestrator constructs these, after the response passed its
/// checks; the format always equals the request's declared format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    content: String,
    format: OutputFormat,
    usage: TokenUsage,
    model: String,
    message_id: String,
}

impl GenerationResult {
    pub(crate) fn new(
        content: String,
        format: OutputFormat,
        usage: TokenUsage,
        model: String,
        message_id: String,
    ) -> Self {
        Self {
            content,
            format,
            usage,
            model,
            message_id,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn into_content(self) -> String {
        self.content
    }
}
