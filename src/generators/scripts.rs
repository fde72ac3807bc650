//! `build_scripts`: language-specific build, lint and test scripts.

use super::contract::{Generator, GeneratorContext, GeneratorError, GeneratorKind};
use super::templates::{BUILD_SCRIPT, LINT_SCRIPT, TEST_SCRIPT};
use crate::config::ProjectConfig;
use crate::config::types::FEATURE_TESTS;
use crate::fs::{FileArtifact, OutputScope};
use crate::prompt::render_template;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

pub const BUILD_SCRIPTS: &str = "build_scripts";

const BUILD_PATH: &str = "scripts/build.sh";
const LINT_PATH: &str = "scripts/lint.sh";
const TEST_PATH: &str = "scripts/test.sh";

/// Template generator for `scripts/*.sh`.
#[derive(Debug, Default)]
pub struct BuildScriptsGenerator;

impl BuildScriptsGenerator {
    fn scripts(config: &ProjectConfig) -> Vec<(&'static str, &'static str)> {
        let mut scripts = vec![(BUILD_PATH, BUILD_SCRIPT), (LINT_PATH, LINT_SCRIPT)];
        if config.feature_enabled(FEATURE_TESTS) {
            scripts.push((TEST_PATH, TEST_SCRIPT));
        }
        scripts
    }

    /// Template variables plus `project_name_sh`: the project name on one
    /// line, quoted as a single shell word.
    fn script_vars(ctx: &GeneratorContext) -> HashMap<String, String> {
        let mut vars = ctx.project.to_template_vars();
        let single_line: String = ctx
            .project
            .project_name
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();
        vars.insert(
            "project_name_sh".to_string(),
            shell_words::quote(&single_line).into_owned(),
        );
        vars
    }
}

#[async_trait]
impl Generator for BuildScriptsGenerator {
    fn name(&self) -> &str {
        BUILD_SCRIPTS
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Template
    }

    fn outputs(&self, config: &ProjectConfig) -> Vec<PathBuf> {
        Self::scripts(config)
            .into_iter()
            .map(|(path, _)| PathBuf::from(path))
            .collect()
    }

    async fn generate(
        &self,
        config: &ProjectConfig,
        scope: &OutputScope,
        ctx: &GeneratorContext,
    ) -> Result<Vec<FileArtifact>, GeneratorError> {
        let vars = Self::script_vars(ctx);

        // Render everything first so a template error leaves no files behind.
        let rendered = Self::scripts(config)
            .into_iter()
            .map(|(path, template)| Ok((path, render_template(template, &vars)?)))
            .collect::<Result<Vec<_>, GeneratorError>>()?;

        rendered
            .into_iter()
            .map(|(path, content)| Ok(scope.write_executable(path, &content)?))
            .collect()
    }
}
