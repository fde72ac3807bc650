//! Implementation of the `qualforge tune` command.
//!
//! Adapts one existing file to a free-text target context with a single
//! model call. The result is printed, or written back with `--write`.

use super::{build_client, build_orchestrator, load_config_or_default};
use crate::cli::TuneArgs;
use crate::config::Config;
use crate::error::{QualforgeError, Result};
use crate::fs::atomic_write_file;
use crate::generation::{GenerationOptions, TokenUsage};
use crate::journal::{JournalAction, JournalRecord, append_record};
use crate::llm::ModelClient;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Execute the `qualforge tune` command.
pub async fn cmd_tune(args: TuneArgs, cancel: &CancellationToken) -> Result<()> {
    let config = load_config_or_default(&args.config)?;
    let content = std::fs::read_to_string(&args.file).map_err(|e| {
        QualforgeError::UserError(format!("failed to read '{}': {}", args.file.display(), e))
    })?;

    let client = build_client(&config.model)?;
    let options = GenerationOptions::for_tune(&config.model, args.model.as_deref());
    let (tuned, usage) = run_tune(
        &config,
        client,
        &content,
        &args.target_context,
        &options,
        cancel,
    )
    .await?;

    if !args.write {
        print!("{}", tuned);
        if !tuned.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    atomic_write_file(&args.file, &tuned).map_err(|e| {
        QualforgeError::UserError(format!("failed to write '{}': {}", args.file.display(), e))
    })?;
    info!(file = %args.file.display(), model = %options.model, "tuned file written");
    println!("Tuned {}", args.file.display());

    if config.pipeline.journal {
        let record = JournalRecord::new(JournalAction::Tune, "complete")
            .with_usage(usage)
            .with_details(json!({
                "file": args.file.display().to_string(),
                "model": options.model,
                "target_context": args.target_context,
            }));
        let path = config
            .project
            .target_dir()
            .join(&config.pipeline.journal_path);
        if let Err(e) = append_record(&path, &record) {
            warn!(error = %e, "failed to append run journal");
        }
    }

    Ok(())
}

/// One tune call through an orchestrator built from `config`.
pub(crate) async fn run_tune(
    config: &Config,
    client: Arc<dyn ModelClient>,
    content: &str,
    target_context: &str,
    options: &GenerationOptions,
    cancel: &CancellationToken,
) -> Result<(String, TokenUsage)> {
    let orchestrator = build_orchestrator(config, client)?;
    let tuned = orchestrator
        .tune(content, target_context, options, cancel)
        .await
        .map_err(|e| {
            if e.is_cancelled() {
                QualforgeError::Cancelled(e.to_string())
            } else {
                QualforgeError::GenerationFailed(format!("tune failed: {}", e))
            }
        })?;
    Ok((tuned, orchestrator.usage_totals()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelSettings;
    use crate::exit_codes;
    use crate::llm::ModelError;
    use crate::test_support::{ScriptedClient, completion, rate_limited};

    fn options() -> GenerationOptions {
        GenerationOptions::for_tune(&ModelSettings::default(), None)
    }

    #[tokio::test]
    async fn tune_uses_tune_model_and_returns_adapted_text() {
        let client = Arc::new(ScriptedClient::always(Ok(completion(
            "```yaml\nname: GitLab CI\n```",
        ))));

        let (tuned, usage) = run_tune(
            &Config::default(),
            client.clone(),
            "name: CI\n",
            "a Go monorepo on GitLab",
            &options(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(tuned.trim(), "name: GitLab CI");
        assert_eq!(usage.total(), 150);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, ModelSettings::default().tune_model);
        assert!(requests[0].prompt.contains("a Go monorepo on GitLab"));
        assert!(requests[0].prompt.contains("name: CI"));
    }

    #[tokio::test]
    async fn model_override_wins() {
        let client = Arc::new(ScriptedClient::always(Ok(completion("adapted"))));
        let options = GenerationOptions::for_tune(&ModelSettings::default(), Some("claude-other"));

        run_tune(
            &Config::default(),
            client.clone(),
            "original",
            "somewhere else",
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(client.requests()[0].model, "claude-other");
    }

    #[tokio::test]
    async fn tune_makes_exactly_one_attempt() {
        let client = Arc::new(ScriptedClient::always(Err(rate_limited())));

        let err = run_tune(
            &Config::default(),
            client.clone(),
            "original",
            "somewhere else",
            &options(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(client.call_count(), 1);
        assert_eq!(err.exit_code(), exit_codes::GENERATION_ABORTED);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_a_call() {
        let client = Arc::new(ScriptedClient::always(Err(ModelError::Timeout(
            "unused".to_string(),
        ))));

        let err = run_tune(
            &Config::default(),
            client.clone(),
            "   \n",
            "somewhere else",
            &options(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(client.call_count(), 0);
        assert!(err.to_string().contains("nothing to tune"));
    }

    #[tokio::test]
    async fn cancelled_tune_reports_cancellation() {
        let client = Arc::new(ScriptedClient::always(Ok(completion("adapted"))));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run_tune(
            &Config::default(),
            client.clone(),
            "original",
            "somewhere else",
            &options(),
            &cancel,
        )
        .await
        .unwrap_err();

        assert_eq!(client.call_count(), 0);
        assert_eq!(err.exit_code(), exit_codes::CANCELLED);
    }
}
