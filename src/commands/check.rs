//! Implementation of the `qualforge check` command.
//!
//! Loads the config, builds the pipeline plan and prints it. No API key is
//! needed: the pipeline is wired to a client that refuses every call, and
//! planning never calls the model.

use super::generate::JOURNAL_OWNER;
use super::{build_orchestrator, build_pipeline, load_config};
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::Result;
use crate::llm::{Completion, CompletionRequest, ModelClient, ModelError};
use crate::pipeline::PipelinePlan;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Stand-in client for commands that must stay offline.
struct OfflineClient;

#[async_trait]
impl ModelClient for OfflineClient {
    async fn complete(
        &self,
        _request: &CompletionRequest,
    ) -> std::result::Result<Completion, ModelError> {
        Err(ModelError::Configuration(
            "model calls are disabled for this command".to_string(),
        ))
    }

    fn provider(&self) -> &str {
        "offline"
    }
}

/// Execute the `qualforge check` command.
pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let plan = plan_for(&config)?;
    print!("{}", render_plan(&config, &plan));
    Ok(())
}

fn plan_for(config: &Config) -> Result<PipelinePlan> {
    let orchestrator = build_orchestrator(config, Arc::new(OfflineClient))?;
    let pipeline = build_pipeline(config, orchestrator);
    let plan = pipeline.plan(&config.project)?;
    if config.pipeline.journal {
        plan.check_reserved(JOURNAL_OWNER, Path::new(&config.pipeline.journal_path))?;
    }
    Ok(plan)
}

fn render_plan(config: &Config, plan: &PipelinePlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Config OK: {} ({}) -> {}",
        config.project.name(),
        config.project.language(),
        config.project.target_dir().display()
    );
    let _ = writeln!(
        out,
        "Mode: {}, {} generator(s) in {} wave(s)",
        config.pipeline.mode,
        plan.len(),
        plan.waves().len()
    );
    let _ = writeln!(out);

    for planned in plan.generators() {
        let entry = &planned.entry;
        let _ = writeln!(
            out,
            "  {:<16} [{}] {}",
            entry.name(),
            entry.generator().kind(),
            entry.criticality()
        );
        for path in &planned.outputs {
            let _ = writeln!(out, "      -> {}", path.display());
        }
        if !entry.dependencies().is_empty() {
            let _ = writeln!(out, "      after: {}", entry.dependencies().join(", "));
        }
    }
    out
}
