//! Tests for model-assisted generators and the standard registry.

use super::*;
use crate::config::types::{FEATURE_CI, FEATURE_DOCS, FEATURE_HOOKS, FEATURE_METRICS};
use crate::config::{Config, Criticality};
use crate::fs::{FileArtifact, OutputScope, TargetDir, TargetOptions, WriteStatus};
use crate::generation::OutputFormat;
use crate::prompt::ProjectContext;
use crate::test_support::{
    ScriptedClient, VALID_CI_YAML, VALID_GUIDE, VALID_HOOK, VALID_METRICS_JSON, assistant,
    completion, project_config,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

async fn run_generator(
    generator: &dyn Generator,
    dir: &Path,
    upstream: Vec<FileArtifact>,
) -> Result<Vec<FileArtifact>, GeneratorError> {
    let config = project_config(dir);
    let target = Arc::new(TargetDir::acquire(dir, TargetOptions::default()).unwrap());
    let scope = OutputScope::new(target, generator.name(), generator.outputs(&config));
    let ctx = GeneratorContext {
        project: ProjectContext::from_project(&config),
        upstream,
        ..Default::default()
    };
    generator.generate(&config, &scope, &ctx).await
}

#[tokio::test]
async fn ci_config_writes_validated_workflow() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Ok(completion(VALID_CI_YAML))));
    let generator = ci_config(assistant(client.clone(), 1));

    let artifacts = run_generator(&generator, temp.path(), vec![]).await.unwrap();

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].path, PathBuf::from(".github/workflows/ci.yml"));
    assert_eq!(artifacts[0].status, WriteStatus::Written);
    let on_disk = std::fs::read_to_string(temp.path().join(".github/workflows/ci.yml")).unwrap();
    assert_eq!(on_disk, VALID_CI_YAML);

    let prompt = &client.requests()[0].prompt;
    assert!(prompt.contains("\"acme\""));
    assert!(prompt.contains("cargo build"));
    assert_eq!(generator.kind(), GeneratorKind::ModelAssisted);
}

#[tokio::test]
async fn invalid_output_is_regenerated_with_feedback() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new([
        Ok(completion("just some prose")),
        Ok(completion(VALID_CI_YAML)),
    ]));
    let generator = ci_config(assistant(client.clone(), 1));

    let artifacts = run_generator(&generator, temp.path(), vec![]).await.unwrap();

    assert_eq!(client.call_count(), 2);
    assert_eq!(artifacts[0].content, VALID_CI_YAML);
    let retry_prompt = &client.requests()[1].prompt;
    assert!(retry_prompt.contains("was rejected"));
    assert!(retry_prompt.contains("yaml output failed validation"));
    assert!(!client.requests()[0].prompt.contains("was rejected"));
}

#[tokio::test]
async fn persistent_invalid_output_fails_without_writing() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Ok(completion("name: CI\n"))));
    let generator = ci_config(assistant(client.clone(), 1));

    let err = run_generator(&generator, temp.path(), vec![])
        .await
        .unwrap_err();

    assert!(matches!(err, GeneratorError::Validation(_)));
    assert!(err.to_string().contains("jobs"));
    assert_eq!(client.call_count(), 2);
    assert!(!temp.path().join(".github/workflows/ci.yml").exists());
}

#[tokio::test]
async fn no_regeneration_when_disabled() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Ok(completion("{}"))));
    let generator = metrics_config(assistant(client.clone(), 0));

    let err = run_generator(&generator, temp.path(), vec![])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("thresholds"));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn metrics_config_accepts_thresholds() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Ok(completion(VALID_METRICS_JSON))));
    let generator = metrics_config(assistant(client, 0));

    let artifacts = run_generator(&generator, temp.path(), vec![]).await.unwrap();

    assert_eq!(artifacts[0].path, PathBuf::from(".quality/metrics.json"));
    assert_eq!(generator.format(), OutputFormat::Json);
}

#[cfg(unix)]
#[tokio::test]
async fn pre_commit_hook_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Ok(completion(VALID_HOOK))));
    let generator = pre_commit_hook(assistant(client, 0));

    run_generator(&generator, temp.path(), vec![]).await.unwrap();

    let mode = std::fs::metadata(temp.path().join("scripts/pre-commit.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[tokio::test]
async fn quality_guide_sees_upstream_artifacts() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Ok(completion(VALID_GUIDE))));
    let generator = quality_guide(assistant(client.clone(), 0));
    let upstream = vec![FileArtifact {
        path: PathBuf::from(".github/workflows/ci.yml"),
        content: VALID_CI_YAML.to_string(),
        status: WriteStatus::Written,
    }];

    run_generator(&generator, temp.path(), upstream).await.unwrap();

    let prompt = &client.requests()[0].prompt;
    assert!(prompt.contains("--- .github/workflows/ci.yml ---"));
    assert!(prompt.contains("runs-on: ubuntu-latest"));
}

#[tokio::test]
async fn reruns_with_different_wording_both_validate() {
    let reworded = VALID_CI_YAML.replace("name: CI", "name: Continuous Integration");
    let client = Arc::new(ScriptedClient::new([
        Ok(completion(VALID_CI_YAML)),
        Ok(completion(&reworded)),
    ]));
    let generator = ci_config(assistant(client, 0));

    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let first = run_generator(&generator, first_dir.path(), vec![])
        .await
        .unwrap();
    let second = run_generator(&generator, second_dir.path(), vec![])
        .await
        .unwrap();

    assert_ne!(first[0].content, second[0].content);
    for artifact in first.iter().chain(second.iter()) {
        OutputFormat::Yaml.validate(&artifact.content).unwrap();
    }
}

#[tokio::test]
async fn cancelled_context_stops_before_calling_model() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Ok(completion(VALID_CI_YAML))));
    let generator = ci_config(assistant(client.clone(), 1));
    let config = project_config(temp.path());
    let target = Arc::new(TargetDir::acquire(temp.path(), TargetOptions::default()).unwrap());
    let scope = OutputScope::new(target, generator.name(), generator.outputs(&config));
    let ctx = GeneratorContext {
        project: ProjectContext::from_project(&config),
        ..Default::default()
    };
    ctx.cancel.cancel();

    let err = generator.generate(&config, &scope, &ctx).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(client.call_count(), 0);
}

fn names(entries: &[crate::pipeline::PipelineEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name()).collect()
}

#[test]
fn standard_pipeline_follows_feature_toggles() {
    let assistant = assistant(Arc::new(ScriptedClient::standard()), 1);
    let config = Config::default();

    let entries = standard_pipeline(&config, &assistant);
    assert_eq!(
        names(&entries),
        vec![
            BUILD_SCRIPTS,
            POLICY_DOCS,
            CI_CONFIG,
            METRICS_CONFIG,
            QUALITY_GUIDE
        ]
    );
    let guide = entries.last().unwrap();
    assert_eq!(guide.dependencies(), &[CI_CONFIG, METRICS_CONFIG]);
    assert_eq!(entries[0].criticality(), Criticality::Critical);
    assert_eq!(entries[2].criticality(), Criticality::Critical);
    assert_eq!(entries[3].criticality(), Criticality::Optional);

    let mut config = Config::default();
    config.project = config
        .project
        .clone()
        .with_feature(FEATURE_CI, false)
        .with_feature(FEATURE_METRICS, false)
        .with_feature(FEATURE_HOOKS, true);
    let entries = standard_pipeline(&config, &assistant);
    assert_eq!(
        names(&entries),
        vec![BUILD_SCRIPTS, POLICY_DOCS, PRE_COMMIT_HOOK, QUALITY_GUIDE]
    );
    assert!(entries.last().unwrap().dependencies().is_empty());
}

#[test]
fn standard_pipeline_applies_criticality_overrides() {
    let assistant = assistant(Arc::new(ScriptedClient::standard()), 1);
    let mut config = Config::default();
    config.project = config.project.clone().with_feature(FEATURE_DOCS, false);
    config
        .pipeline
        .criticality
        .insert(CI_CONFIG.to_string(), Criticality::Optional);
    config
        .pipeline
        .criticality
        .insert(METRICS_CONFIG.to_string(), Criticality::Critical);

    let entries = standard_pipeline(&config, &assistant);

    let get = |name: &str| entries.iter().find(|e| e.name() == name).unwrap();
    assert_eq!(get(CI_CONFIG).criticality(), Criticality::Optional);
    assert_eq!(get(METRICS_CONFIG).criticality(), Criticality::Critical);
    assert!(entries.iter().all(|e| e.name() != QUALITY_GUIDE));
}

#[test]
fn standard_generator_names_are_known_to_registry() {
    let assistant = assistant(Arc::new(ScriptedClient::standard()), 1);
    let mut config = Config::default();
    config.project = config.project.clone().with_feature(FEATURE_HOOKS, true);

    let entries = standard_pipeline(&config, &assistant);

    assert_eq!(names(&entries), STANDARD_GENERATORS.to_vec());
}
