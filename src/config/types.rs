//! Configuration enums, feature names, and serde default functions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature toggle: generate a CI workflow.
pub const FEATURE_CI: &str = "ci";
/// Feature toggle: generate a test script and wire tests into CI.
pub const FEATURE_TESTS: &str = "tests";
/// Feature toggle: generate CONTRIBUTING/SECURITY policy documents.
pub const FEATURE_POLICY_DOCS: &str = "policy_docs";
/// Feature toggle: generate a quality metrics configuration.
pub const FEATURE_METRICS: &str = "metrics";
/// Feature toggle: generate a pre-commit hook script.
pub const FEATURE_HOOKS: &str = "hooks";
/// Feature toggle: generate the narrative quality guide.
pub const FEATURE_DOCS: &str = "docs";

/// Every feature name the generators understand, with its default state.
pub const KNOWN_FEATURES: &[(&str, bool)] = &[
    (FEATURE_CI, true),
    (FEATURE_TESTS, true),
    (FEATURE_POLICY_DOCS, true),
    (FEATURE_METRICS, true),
    (FEATURE_HOOKS, false),
    (FEATURE_DOCS, true),
];

/// Default state of a feature when the config does not mention it.
pub fn feature_default(name: &str) -> bool {
    KNOWN_FEATURES
        .iter()
        .find(|(known, _)| *known == name)
        .is_some_and(|(_, enabled)| *enabled)
}

/// Primary language of the target project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Rust,
    Python,
    Typescript,
    Go,
}

/// Toolchain commands the build scripts and prompts refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toolchain {
    pub build: &'static str,
    pub test: &'static str,
    pub lint: &'static str,
    pub format_check: &'static str,
}

impl Language {
    /// The canonical lowercase name, as written in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::Typescript => "typescript",
            Language::Go => "go",
        }
    }

    /// Toolchain commands for this language.
    pub fn toolchain(&self) -> Toolchain {
        match self {
            Language::Rust => Toolchain {
                build: "cargo build --all-targets",
                test: "cargo test --all",
                lint: "cargo clippy --all-targets -- -D warnings",
                format_check: "cargo fmt --all -- --check",
            },
            Language::Python => Toolchain {
                build: "python -m build",
                test: "python -m pytest",
                lint: "ruff check .",
                format_check: "ruff format --check .",
            },
            Language::Typescript => Toolchain {
                build: "npm run build",
                test: "npm test",
                lint: "npx eslint .",
                format_check: "npx prettier --check .",
            },
            Language::Go => Toolchain {
                build: "go build ./...",
                test: "go test ./...",
                lint: "go vet ./...",
                format_check: "test -z \"$(gofmt -l .)\"",
            },
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a generator's failure aborts the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Failure aborts the run; later generators are not attempted.
    Critical,
    /// Failure is recorded and the run continues.
    Optional,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criticality::Critical => f.write_str("critical"),
            Criticality::Optional => f.write_str("optional"),
        }
    }
}

/// How the pipeline dispatches generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One generator at a time, in registration order (default).
    #[default]
    Sequential,
    /// Independent generators run as parallel tasks in dependency waves.
    Concurrent,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Concurrent => f.write_str("concurrent"),
        }
    }
}

// Default value functions for serde
pub(crate) fn default_project_name() -> String {
    "my-project".to_string()
}
pub(crate) fn default_target_dir() -> std::path::PathBuf {
    std::path::PathBuf::from(".")
}
pub(crate) fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
pub(crate) fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}
pub(crate) fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
pub(crate) fn default_tune_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}
pub(crate) fn default_max_tokens() -> u32 {
    4096
}
pub(crate) fn default_temperature() -> f32 {
    0.2
}
pub(crate) fn default_timeout_seconds() -> u64 {
    120
}
pub(crate) fn default_max_retries() -> u32 {
    3
}
pub(crate) fn default_initial_delay_ms() -> u64 {
    1_000
}
pub(crate) fn default_max_delay_ms() -> u64 {
    60_000
}
pub(crate) fn default_regenerate_on_invalid() -> u32 {
    1
}
pub(crate) fn default_journal_path() -> String {
    ".qualforge/runs.ndjson".to_string()
}
pub(crate) fn default_true() -> bool {
    true
}
