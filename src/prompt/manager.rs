//! Prompt rendering front door.

use super::library::BUILTIN_PROMPTS;
use super::template::{TemplateError, placeholders, render_template};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Renders prompt templates against a context map.
///
/// Holds the registry of named templates: the built-ins, optionally replaced
/// by config overrides. Rendering is pure and the manager is immutable after
/// construction, so one instance is shared across concurrent generators.
#[derive(Debug, Clone)]
pub struct PromptManager {
    templates: BTreeMap<String, String>,
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptManager {
    /// A manager holding the built-in templates.
    pub fn new() -> Self {
        let templates = BUILTIN_PROMPTS
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect();
        Self { templates }
    }

    /// Replace built-in templates with the given overrides.
    ///
    /// Names that are not registered are rejected.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, TemplateError> {
        for (name, body) in overrides {
            let Some(slot) = self.templates.get_mut(name) else {
                return Err(TemplateError::UnknownTemplate { name: name.clone() });
            };
            placeholders(body)?;
            *slot = body.clone();
        }
        Ok(self)
    }

    /// Render `template` against `context`.
    pub fn render(
        &self,
        template: &str,
        context: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        render_template(template, context)
    }

    /// Render a registered template by name.
    pub fn render_named(
        &self,
        name: &str,
        context: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        self.render(self.template(name)?, context)
    }

    /// The body of a registered template.
    pub fn template(&self, name: &str) -> Result<&str, TemplateError> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::UnknownTemplate {
                name: name.to_string(),
            })
    }

    /// Variables a template references.
    pub fn placeholders(&self, template: &str) -> Result<BTreeSet<String>, TemplateError> {
        placeholders(template)
    }

    /// Variables a template references that `context` does not provide.
    pub fn missing_variables(
        &self,
        template: &str,
        context: &HashMap<String, String>,
    ) -> Result<Vec<String>, TemplateError> {
        Ok(placeholders(template)?
            .into_iter()
            .filter(|name| !context.contains_key(name))
            .collect())
    }
}
