//! `policy_docs`: CONTRIBUTING.md and SECURITY.md.

use super::contract::{Generator, GeneratorContext, GeneratorError, GeneratorKind};
use super::templates::{CONTRIBUTING, SECURITY};
use crate::config::ProjectConfig;
use crate::config::types::FEATURE_TESTS;
use crate::fs::{FileArtifact, OutputScope};
use crate::prompt::render_template;
use async_trait::async_trait;
use std::path::PathBuf;

pub const POLICY_DOCS: &str = "policy_docs";

const CONTRIBUTING_PATH: &str = "CONTRIBUTING.md";
const SECURITY_PATH: &str = "SECURITY.md";

/// Template generator for contributor and security policies.
///
/// Reads `default_branch` and `security_contact` from the external context
/// when present.
#[derive(Debug, Default)]
pub struct PolicyDocsGenerator;

fn local_checks(config: &ProjectConfig) -> String {
    let mut checks = vec!["./scripts/build.sh", "./scripts/lint.sh"];
    if config.feature_enabled(FEATURE_TESTS) {
        checks.push("./scripts/test.sh");
    }
    checks.join("\n")
}

#[async_trait]
impl Generator for PolicyDocsGenerator {
    fn name(&self) -> &str {
        POLICY_DOCS
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Template
    }

    fn outputs(&self, _config: &ProjectConfig) -> Vec<PathBuf> {
        vec![PathBuf::from(CONTRIBUTING_PATH), PathBuf::from(SECURITY_PATH)]
    }

    async fn generate(
        &self,
        config: &ProjectConfig,
        scope: &OutputScope,
        ctx: &GeneratorContext,
    ) -> Result<Vec<FileArtifact>, GeneratorError> {
        let mut vars = ctx.project.to_template_vars();
        vars.entry("default_branch".to_string())
            .or_insert_with(|| "main".to_string());
        vars.entry("security_contact".to_string())
            .or_insert_with(|| "the maintainers".to_string());
        vars.insert("local_checks".to_string(), local_checks(config));

        let contributing = render_template(CONTRIBUTING, &vars)?;
        let security = render_template(SECURITY, &vars)?;

        Ok(vec![
            scope.write(CONTRIBUTING_PATH, &contributing)?,
            scope.write(SECURITY_PATH, &security)?,
        ])
    }
}
