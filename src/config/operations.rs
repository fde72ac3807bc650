//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::KNOWN_FEATURES;
use crate::error::{QualforgeError, Result};
use crate::fs::is_safe_relative;
use crate::generators::STANDARD_GENERATORS;
use crate::prompt::{BUILTIN_PROMPTS, placeholders};
use globset::Glob;
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(QualforgeError::ConfigError)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            QualforgeError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| QualforgeError::ConfigError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            QualforgeError::ConfigError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `project.name` must be non-empty and on one line
    /// - `project.features` may only name known features
    /// - `model.max_tokens` must be positive, `model.temperature` within 0.0-1.0
    /// - `retry.initial_delay_ms` must be positive and not exceed `retry.max_delay_ms`
    /// - `pipeline.criticality` may only name standard generators
    /// - `pipeline.preserve` entries must be valid globs
    /// - `pipeline.journal_path` must be relative and stay inside the target
    /// - `prompts` may only override built-in template names, with valid syntax
    pub fn validate(&self) -> Result<()> {
        if self.project.name().trim().is_empty() {
            return Err(invalid("project.name must not be empty"));
        }

        if self.project.name().chars().any(char::is_control) {
            return Err(invalid("project.name must not contain control characters"));
        }

        for name in self.project.features().keys() {
            if !KNOWN_FEATURES.iter().any(|(known, _)| known == name) {
                let known: Vec<&str> = KNOWN_FEATURES.iter().map(|(k, _)| *k).collect();
                return Err(invalid(&format!(
                    "unknown feature '{}' (known features: {})",
                    name,
                    known.join(", ")
                )));
            }
        }

        if self.model.model.trim().is_empty() || self.model.tune_model.trim().is_empty() {
            return Err(invalid("model.model and model.tune_model must not be empty"));
        }

        if self.model.max_tokens == 0 {
            return Err(invalid("model.max_tokens must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err(invalid(&format!(
                "model.temperature must be between 0.0 and 1.0 (found {})",
                self.model.temperature
            )));
        }

        if self.model.timeout_seconds == 0 {
            return Err(invalid("model.timeout_seconds must be greater than 0"));
        }

        if self.retry.initial_delay_ms == 0 {
            return Err(invalid("retry.initial_delay_ms must be greater than 0"));
        }

        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(invalid(&format!(
                "retry.max_delay_ms ({}) must not be less than retry.initial_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.initial_delay_ms
            )));
        }

        for name in self.pipeline.criticality.keys() {
            if !STANDARD_GENERATORS.contains(&name.as_str()) {
                return Err(invalid(&format!(
                    "pipeline.criticality names unknown generator '{}' (known generators: {})",
                    name,
                    STANDARD_GENERATORS.join(", ")
                )));
            }
        }

        for pattern in &self.pipeline.preserve {
            Glob::new(pattern).map_err(|e| {
                invalid(&format!("pipeline.preserve pattern '{}' is invalid: {}", pattern, e))
            })?;
        }

        if self.pipeline.journal && !is_safe_relative(Path::new(&self.pipeline.journal_path)) {
            return Err(invalid(&format!(
                "pipeline.journal_path must be a relative path inside the target (found '{}')",
                self.pipeline.journal_path
            )));
        }

        for (name, template) in &self.prompts {
            if !BUILTIN_PROMPTS.iter().any(|(builtin, _)| builtin == name) {
                return Err(invalid(&format!(
                    "prompts.{} does not override a built-in prompt template",
                    name
                )));
            }
            if template.trim().is_empty() {
                return Err(invalid(&format!("prompts.{} must not be empty", name)));
            }
            placeholders(template)
                .map_err(|e| invalid(&format!("prompts.{} is malformed: {}", name, e)))?;
        }

        Ok(())
    }
}

fn invalid(message: &str) -> QualforgeError {
    QualforgeError::ConfigError(format!("config validation failed: {}", message))
}
