//! Project context extraction for prompt and file templates.
//!
//! `ProjectContext` flattens a `ProjectConfig` into the string variables that
//! templates reference. Extra read-only entries (for example repository
//! metadata from a hosting API) arrive through a `ContextSource` and are
//! merged in without overriding project fields.
//!
//! # Variables
//!
//! - `{project_name}`, `{description}`, `{language}`
//! - `{build_command}`, `{test_command}`, `{lint_command}`, `{format_check_command}`
//! - `{features}` - comma-separated enabled features
//! - `{tests_enabled}` - `"true"` or `"false"`

use crate::config::ProjectConfig;
use crate::config::types::FEATURE_TESTS;
use std::collections::{BTreeMap, HashMap};

/// Read-only key-value provider of additional prompt context.
///
/// Implementations must be cheap to query and side-effect free; the pipeline
/// snapshots the entries once per run.
pub trait ContextSource: Send + Sync {
    /// All entries this source provides.
    fn entries(&self) -> BTreeMap<String, String>;
}

/// A context source backed by a fixed map (the `context:` config section).
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    entries: BTreeMap<String, String>,
}

impl StaticContext {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl ContextSource for StaticContext {
    fn entries(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }
}

/// Extracted template variables for one project.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    /// Project name.
    pub project_name: String,
    /// One-line description (may be empty).
    pub description: String,
    /// Primary language name.
    pub language: String,
    /// Toolchain build command.
    pub build_command: String,
    /// Toolchain test command.
    pub test_command: String,
    /// Toolchain lint command.
    pub lint_command: String,
    /// Toolchain format check command.
    pub format_check_command: String,
    /// Enabled feature names.
    pub features: Vec<String>,
    /// Whether the tests feature is on.
    pub tests_enabled: bool,
    /// Extra entries from a `ContextSource`.
    pub external: BTreeMap<String, String>,
}

impl ProjectContext {
    /// Extract context from a project config.
    pub fn from_project(project: &ProjectConfig) -> Self {
        let toolchain = project.language().toolchain();

        let description = if project.description().trim().is_empty() {
            format!("A {} project", project.language())
        } else {
            project.description().trim().to_string()
        };

        Self {
            project_name: project.name().to_string(),
            description,
            language: project.language().to_string(),
            build_command: toolchain.build.to_string(),
            test_command: toolchain.test.to_string(),
            lint_command: toolchain.lint.to_string(),
            format_check_command: toolchain.format_check.to_string(),
            features: project
                .enabled_features()
                .into_iter()
                .map(String::from)
                .collect(),
            tests_enabled: project.feature_enabled(FEATURE_TESTS),
            external: BTreeMap::new(),
        }
    }

    /// Attach entries from an external context source.
    pub fn with_source(mut self, source: &dyn ContextSource) -> Self {
        self.external.extend(source.entries());
        self
    }

    /// Convert the context to template variables.
    ///
    /// External entries never shadow project fields.
    pub fn to_template_vars(&self) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = self
            .external
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        vars.insert("project_name".to_string(), self.project_name.clone());
        vars.insert("description".to_string(), self.description.clone());
        vars.insert("language".to_string(), self.language.clone());
        vars.insert("build_command".to_string(), self.build_command.clone());
        vars.insert("test_command".to_string(), self.test_command.clone());
        vars.insert("lint_command".to_string(), self.lint_command.clone());
        vars.insert(
            "format_check_command".to_string(),
            self.format_check_command.clone(),
        );
        vars.insert("features".to_string(), self.features.join(", "));
        vars.insert("tests_enabled".to_string(), self.tests_enabled.to_string());

        vars
    }

    /// Render the external entries as a bullet list for prompts.
    ///
    /// Returns `"(none)"` when there are no entries so templates can always
    /// reference `{repository_context}`.
    pub fn external_summary(&self) -> String {
        if self.external.is_empty() {
            return "(none)".to_string();
        }
        self.external
            .iter()
            .map(|(k, v)| format!("- {}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
