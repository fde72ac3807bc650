//! The model-assisted generators of the standard pipeline.

use super::assisted::{AssistedGenerator, Assistant};
use crate::generation::OutputFormat;

pub const CI_CONFIG: &str = "ci_config";
pub const METRICS_CONFIG: &str = "metrics_config";
pub const PRE_COMMIT_HOOK: &str = "pre_commit_hook";
pub const QUALITY_GUIDE: &str = "quality_guide";

/// `.github/workflows/ci.yml`
pub fn ci_config(assistant: Assistant) -> AssistedGenerator {
    AssistedGenerator::new(
        CI_CONFIG,
        "ci_workflow",
        OutputFormat::Yaml,
        ".github/workflows/ci.yml",
        assistant,
    )
    .with_check(check_workflow)
}

/// `.quality/metrics.json`
pub fn metrics_config(assistant: Assistant) -> AssistedGenerator {
    AssistedGenerator::new(
        METRICS_CONFIG,
        "metrics_config",
        OutputFormat::Json,
        ".quality/metrics.json",
        assistant,
    )
    .with_check(check_metrics)
}

/// `scripts/pre-commit.sh`
pub fn pre_commit_hook(assistant: Assistant) -> AssistedGenerator {
    AssistedGenerator::new(
        PRE_COMMIT_HOOK,
        "pre_commit_hook",
        OutputFormat::Bash,
        "scripts/pre-commit.sh",
        assistant,
    )
    .executable()
}

/// `docs/QUALITY.md`
pub fn quality_guide(assistant: Assistant) -> AssistedGenerator {
    AssistedGenerator::new(
        QUALITY_GUIDE,
        "quality_guide",
        OutputFormat::Markdown,
        "docs/QUALITY.md",
        assistant,
    )
}

/// A workflow must define at least one job.
fn check_workflow(content: &str) -> Result<(), String> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    match doc.get("jobs") {
        Some(serde_yaml::Value::Mapping(jobs)) if !jobs.is_empty() => Ok(()),
        _ => Err("workflow has no `jobs` mapping".to_string()),
    }
}

/// Metrics must be a JSON object with a `thresholds` object.
fn check_metrics(content: &str) -> Result<(), String> {
    let doc: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    match doc.get("thresholds") {
        Some(serde_json::Value::Object(_)) => Ok(()),
        _ => Err("metrics document has no `thresholds` object".to_string()),
    }
}
