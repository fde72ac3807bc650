//! Command implementations for qualforge.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the wiring shared between them: config loading,
//! API key resolution and assembly of the orchestrator and pipeline.

mod check;
mod generate;
mod init_config;
mod tune;

use crate::cli::{Command, DEFAULT_CONFIG_FILE};
use crate::config::{Config, ModelSettings};
use crate::error::{QualforgeError, Result};
use crate::generation::{GenerationOptions, GenerationOrchestrator, RetryPolicy};
use crate::generators::{Assistant, standard_pipeline};
use crate::llm::{AnthropicClient, ClientConfig, ModelClient};
use crate::pipeline::GenerationPipeline;
use crate::prompt::{ProjectContext, PromptManager, StaticContext};
use secrecy::SecretString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Dispatch a command to its implementation.
///
/// `cancel` fires on Ctrl-C; long-running commands pass it down to every
/// model call.
pub async fn dispatch(command: Command, cancel: CancellationToken) -> Result<()> {
    match command {
        Command::Generate(args) => generate::cmd_generate(args, &cancel).await,
        Command::Check(args) => check::cmd_check(args),
        Command::Tune(args) => tune::cmd_tune(args, &cancel).await,
        Command::InitConfig(args) => init_config::cmd_init_config(args),
    }
}

/// Load and validate the config at `path`.
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(QualforgeError::UserError(format!(
            "config file '{}' not found (run `qualforge init-config` to create one)",
            path.display()
        )));
    }
    Config::load(path)
}

/// Like `load_config`, but a missing default config file means "use defaults".
pub(crate) fn load_config_or_default(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
        return Ok(Config::default());
    }
    load_config(path)
}

/// Read the API key from the environment variable named in `settings`.
pub(crate) fn resolve_api_key(settings: &ModelSettings) -> Result<SecretString> {
    match std::env::var(&settings.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
        _ => Err(QualforgeError::UserError(format!(
            "environment variable {} is not set; it must hold the model API key",
            settings.api_key_env
        ))),
    }
}

/// Build the HTTP model client described by `settings`.
pub(crate) fn build_client(settings: &ModelSettings) -> Result<Arc<dyn ModelClient>> {
    let api_key = resolve_api_key(settings)?;
    let config = ClientConfig::new(api_key, settings.base_url.clone())
        .with_timeout(Duration::from_secs(settings.timeout_seconds));
    let client = AnthropicClient::new(config).map_err(|e| {
        QualforgeError::UserError(format!("failed to create model client: {}", e))
    })?;
    Ok(Arc::new(client))
}

/// Orchestrator using the config's retry policy and prompt overrides.
pub(crate) fn build_orchestrator(
    config: &Config,
    client: Arc<dyn ModelClient>,
) -> Result<Arc<GenerationOrchestrator>> {
    let prompts = PromptManager::new()
        .with_overrides(&config.prompts)
        .map_err(|e| QualforgeError::ConfigError(format!("invalid prompt override: {}", e)))?;
    Ok(Arc::new(GenerationOrchestrator::new(
        client,
        prompts,
        RetryPolicy::from(&config.retry),
    )))
}

/// The standard pipeline for `config`, dispatched in the configured mode.
pub(crate) fn build_pipeline(
    config: &Config,
    orchestrator: Arc<GenerationOrchestrator>,
) -> GenerationPipeline {
    let assistant = Assistant::new(
        orchestrator,
        GenerationOptions::from_settings(&config.model),
        config.pipeline.regenerate_on_invalid,
    );
    GenerationPipeline::new(standard_pipeline(config, &assistant)).with_mode(config.pipeline.mode)
}

/// Project fields plus the static `context:` entries.
pub(crate) fn project_context(config: &Config) -> ProjectContext {
    ProjectContext::from_project(&config.project)
        .with_source(&StaticContext::new(config.context.clone()))
}
