//! Config struct definitions and default implementations.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for one qualforge run.
///
/// This struct represents the contents of `qualforge.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The project being scaffolded.
    pub project: ProjectConfig,

    /// LLM provider and sampling settings.
    pub model: ModelSettings,

    /// Retry/backoff policy for model calls.
    pub retry: RetrySettings,

    /// Pipeline scheduling and output settings.
    pub pipeline: PipelineSettings,

    /// Static context entries merged into every prompt (e.g. `default_branch`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,

    /// Replacements for built-in prompt templates, keyed by template name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompts: BTreeMap<String, String>,
}

/// Declarative description of the project to scaffold.
///
/// Read by every generator and never mutated once loaded; generators receive
/// it by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,

    language: Language,

    target_dir: PathBuf,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    features: BTreeMap<String, bool>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            description: String::new(),
            language: Language::default(),
            target_dir: default_target_dir(),
            features: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Create a project config with all features at their defaults.
    pub fn new(name: impl Into<String>, language: Language, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            language,
            target_dir: target_dir.into(),
            features: BTreeMap::new(),
        }
    }

    /// Set a one-line project description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Explicitly enable or disable a feature.
    pub fn with_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    /// Replace the target directory (e.g., from a CLI override).
    pub fn with_target_dir(mut self, target_dir: impl Into<PathBuf>) -> Self {
        self.target_dir = target_dir.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Features explicitly set in the config (defaults are not included).
    pub fn features(&self) -> &BTreeMap<String, bool> {
        &self.features
    }

    /// Whether a feature is enabled, falling back to its default.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features
            .get(name)
            .copied()
            .unwrap_or_else(|| feature_default(name))
    }

    /// Names of all enabled known features, in declaration order.
    pub fn enabled_features(&self) -> Vec<&'static str> {
        KNOWN_FEATURES
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| self.feature_enabled(name))
            .collect()
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of the Anthropic-compatible Messages API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for artifact generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Cheaper/faster model used by `tune`.
    #[serde(default = "default_tune_model")]
    pub tune_model: String,

    /// Maximum output tokens per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            tune_model: default_tune_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Retry/backoff settings for retryable model errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt (total attempts = max_retries + 1).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound on any single backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Pipeline scheduling and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Sequential (default) or concurrent dispatch.
    #[serde(default)]
    pub mode: ExecutionMode,

    /// How many times a model-assisted generator re-requests after its
    /// output fails format validation.
    #[serde(default = "default_regenerate_on_invalid")]
    pub regenerate_on_invalid: u32,

    /// Per-generator criticality overrides, keyed by generator name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub criticality: BTreeMap<String, Criticality>,

    /// Globs (relative to the target) of existing files never to overwrite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preserve: Vec<String>,

    /// Whether to append a record of each run to the journal.
    #[serde(default = "default_true")]
    pub journal: bool,

    /// Journal location, relative to the target directory.
    #[serde(default = "default_journal_path")]
    pub journal_path: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            regenerate_on_invalid: default_regenerate_on_invalid(),
            criticality: BTreeMap::new(),
            preserve: Vec::new(),
            journal: default_true(),
            journal_path: default_journal_path(),
        }
    }
}
