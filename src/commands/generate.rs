//! Implementation of the `qualforge generate` command.
//!
//! 1. Loads the config and applies command-line overrides
//! 2. Builds the model client, orchestrator and standard pipeline
//! 3. Runs the pipeline against the target directory
//! 4. Prints a summary and appends a journal record
//! 5. Maps the report status to an exit code

use super::{build_client, build_orchestrator, build_pipeline, load_config, project_context};
use crate::cli::GenerateArgs;
use crate::config::{Config, ExecutionMode};
use crate::error::{QualforgeError, Result};
use crate::fs::{TargetDir, TargetOptions};
use crate::generation::TokenUsage;
use crate::journal::{JournalRecord, append_record};
use crate::llm::ModelClient;
use crate::pipeline::{GeneratorOutcome, PipelineReport, PipelineStatus};
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub(crate) const JOURNAL_OWNER: &str = "run journal";

/// Execute the `qualforge generate` command.
pub async fn cmd_generate(args: GenerateArgs, cancel: &CancellationToken) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(target) = args.target {
        config.project = config.project.clone().with_target_dir(target);
    }
    if args.concurrent {
        config.pipeline.mode = ExecutionMode::Concurrent;
    }
    if args.no_journal {
        config.pipeline.journal = false;
    }

    let client = build_client(&config.model)?;
    let (report, usage) = run_generate(&config, client, args.dry_run, cancel).await?;

    print!("{}", render_summary(&config, &report, usage, args.dry_run));
    status_result(&report)
}

/// Run the pipeline for `config` and journal the outcome.
pub(crate) async fn run_generate(
    config: &Config,
    client: Arc<dyn ModelClient>,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<(PipelineReport, TokenUsage)> {
    let orchestrator = build_orchestrator(config, client)?;
    let pipeline = build_pipeline(config, Arc::clone(&orchestrator));

    // Reject the plan before the target directory is created.
    let plan = pipeline.plan(&config.project)?;
    if config.pipeline.journal {
        plan.check_reserved(JOURNAL_OWNER, Path::new(&config.pipeline.journal_path))?;
    }

    let target = TargetDir::acquire(
        config.project.target_dir(),
        TargetOptions {
            dry_run,
            preserve: config.pipeline.preserve.clone(),
        },
    )
    .map_err(|e| QualforgeError::UserError(e.to_string()))?;
    let target = Arc::new(target);

    let context = project_context(config);
    let report = pipeline
        .run(&config.project, Arc::clone(&target), &context, cancel)
        .await?;
    let usage = orchestrator.usage_totals();

    if config.pipeline.journal && !dry_run {
        let record = JournalRecord::from_report(&report, usage).with_details(json!({
            "project": config.project.name(),
            "mode": config.pipeline.mode.to_string(),
        }));
        let path = target.root().join(&config.pipeline.journal_path);
        // A journal failure must not hide the run's own outcome.
        if let Err(e) = append_record(&path, &record) {
            warn!(error = %e, "failed to append run journal");
        }
    }

    Ok((report, usage))
}

/// Human-readable per-generator summary.
pub(crate) fn render_summary(
    config: &Config,
    report: &PipelineReport,
    usage: TokenUsage,
    dry_run: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "qualforge: {} -> {}{}",
        config.project.name(),
        config.project.target_dir().display(),
        if dry_run { " (dry run)" } else { "" }
    );
    let _ = writeln!(out);

    for record in report.records() {
        match &record.outcome {
            GeneratorOutcome::Succeeded { artifacts } => {
                let _ = writeln!(
                    out,
                    "  ok       {:<16} [{}] {} file(s) in {}ms",
                    record.name,
                    record.kind,
                    artifacts.len(),
                    record.elapsed.as_millis()
                );
                for artifact in artifacts {
                    let _ = writeln!(
                        out,
                        "             {:<10} {}",
                        artifact.status.to_string(),
                        artifact.path.display()
                    );
                }
            }
            GeneratorOutcome::Failed { error } => {
                let _ = writeln!(
                    out,
                    "  FAILED   {:<16} [{}] ({}) {}",
                    record.name, record.kind, record.criticality, error
                );
            }
            GeneratorOutcome::NotAttempted { reason } => {
                let _ = writeln!(
                    out,
                    "  skipped  {:<16} [{}] {}",
                    record.name, record.kind, reason
                );
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Status: {}", report.status());
    let _ = writeln!(
        out,
        "Tokens: {} in / {} out",
        usage.input(),
        usage.output()
    );
    out
}

/// Map the report status onto the command result (and so the exit code).
pub(crate) fn status_result(report: &PipelineReport) -> Result<()> {
    match report.status() {
        PipelineStatus::Complete => Ok(()),
        PipelineStatus::CompleteWithGaps => {
            let missing: Vec<&str> = report
                .records()
                .iter()
                .filter(|r| !r.outcome.is_success())
                .map(|r| r.name.as_str())
                .collect();
            Err(QualforgeError::Incomplete(format!(
                "optional generators did not succeed: {}",
                missing.join(", ")
            )))
        }
        PipelineStatus::Aborted => Err(QualforgeError::GenerationFailed(format!(
            "critical generator '{}' did not succeed",
            report.aborted_by().unwrap_or("unknown")
        ))),
        PipelineStatus::Cancelled => Err(QualforgeError::Cancelled(
            "run cancelled before all generators finished".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::FEATURE_METRICS;
    use crate::exit_codes;
    use crate::journal::read_records;
    use crate::llm::ModelError;
    use crate::pipeline::PlanError;
    use crate::test_support::{ScriptedClient, completion, project_config};
    use tempfile::TempDir;

    fn config_for(target: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.project = project_config(target);
        config
    }

    #[tokio::test]
    async fn full_run_writes_artifacts_and_journal() {
        let temp = TempDir::new().unwrap();
        let config = config_for(temp.path());
        let client = Arc::new(ScriptedClient::standard());

        let (report, usage) = run_generate(&config, client, false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status(), PipelineStatus::Complete);
        assert!(status_result(&report).is_ok());
        // ci, metrics and guide: one call each
        assert_eq!(usage.total(), 3 * 150);
        assert!(temp.path().join("scripts/build.sh").is_file());
        assert!(temp.path().join("SECURITY.md").is_file());

        let records = read_records(&temp.path().join(".qualforge/runs.ndjson")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "complete");
        assert_eq!(records[0].usage.input_tokens, 300);
        assert_eq!(records[0].details["project"], "acme");
        assert_eq!(records[0].details["mode"], "sequential");

        let summary = render_summary(&config, &report, usage, false);
        assert!(summary.contains("ok       build_scripts"));
        assert!(summary.contains("Status: complete"));
        assert!(summary.contains("Tokens: 300 in / 150 out"));
    }

    #[tokio::test]
    async fn optional_gap_maps_to_incomplete_exit_code() {
        let temp = TempDir::new().unwrap();
        let config = config_for(temp.path());
        let client = Arc::new(ScriptedClient::routed([
            ("short quality guide", Ok(completion(crate::test_support::VALID_GUIDE))),
            (
                "GitHub Actions",
                Ok(completion(crate::test_support::VALID_CI_YAML)),
            ),
            (
                "quality metrics",
                Err(ModelError::Authentication("bad key".to_string())),
            ),
        ]));

        let (report, _) = run_generate(&config, client, false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status(), PipelineStatus::CompleteWithGaps);
        let err = status_result(&report).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::INCOMPLETE);
        assert!(err.to_string().contains(crate::generators::METRICS_CONFIG));

        let summary = render_summary(&config, &report, TokenUsage::default(), false);
        assert!(summary.contains("FAILED   metrics_config"));
    }

    #[tokio::test]
    async fn critical_failure_maps_to_aborted_exit_code() {
        let temp = TempDir::new().unwrap();
        let config = config_for(temp.path());
        let client = Arc::new(ScriptedClient::always(Ok(completion("not a workflow"))));

        let (report, _) = run_generate(&config, client, false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status(), PipelineStatus::Aborted);
        let err = status_result(&report).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::GENERATION_ABORTED);
        assert!(err.to_string().contains("ci_config"));
    }

    #[tokio::test]
    async fn cancelled_run_maps_to_cancelled_exit_code() {
        let temp = TempDir::new().unwrap();
        let config = config_for(temp.path());
        let client = Arc::new(ScriptedClient::standard());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (report, usage) = run_generate(&config, client, false, &cancel).await.unwrap();

        assert_eq!(report.status(), PipelineStatus::Cancelled);
        assert_eq!(usage.total(), 0);
        let err = status_result(&report).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::CANCELLED);
    }

    #[tokio::test]
    async fn dry_run_skips_target_and_journal() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("new-project");
        let mut config = config_for(&root);
        config.project = config.project.clone().with_feature(FEATURE_METRICS, false);
        let client = Arc::new(ScriptedClient::standard());

        let (report, _) = run_generate(&config, client, true, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status(), PipelineStatus::Complete);
        assert!(!root.exists());
        assert!(
            render_summary(&config, &report, TokenUsage::default(), true).contains("(dry run)")
        );
    }

    #[tokio::test]
    async fn journal_path_colliding_with_outputs_is_rejected_before_writing() {
        for journal_path in ["scripts/build.sh", "docs", "./.github"] {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("project");
            let mut config = config_for(&root);
            config.pipeline.journal_path = journal_path.to_string();
            let client = Arc::new(ScriptedClient::standard());

            let err = run_generate(&config, client.clone(), false, &CancellationToken::new())
                .await
                .unwrap_err();

            assert!(matches!(
                err,
                QualforgeError::PlanError(PlanError::ReservedPath { .. })
            ));
            assert!(err.to_string().contains("run journal"));
            assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
            assert_eq!(client.call_count(), 0);
            assert!(!root.exists());
        }

        // A disabled journal cannot collide.
        let temp = TempDir::new().unwrap();
        let mut config = config_for(temp.path());
        config.pipeline.journal = false;
        config.pipeline.journal_path = "scripts/build.sh".to_string();
        let (report, _) = run_generate(
            &config,
            Arc::new(ScriptedClient::standard()),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(report.status(), PipelineStatus::Complete);
        assert!(
            std::fs::read_to_string(temp.path().join("scripts/build.sh"))
                .unwrap()
                .starts_with("#!/usr/bin/env bash")
        );
    }

    #[tokio::test]
    async fn preserved_files_are_left_alone() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("SECURITY.md"), "# Our own policy\n").unwrap();
        let mut config = config_for(temp.path());
        config.pipeline.preserve = vec!["SECURITY.md".to_string()];
        config.pipeline.journal = false;
        let client = Arc::new(ScriptedClient::standard());

        let (report, _) = run_generate(&config, client, false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status(), PipelineStatus::Complete);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("SECURITY.md")).unwrap(),
            "# Our own policy\n"
        );
        assert!(!temp.path().join(".qualforge").exists());
    }
}
