use crate::config::{Language, ModelSettings, ProjectConfig};
use crate::generation::{GenerationOptions, GenerationOrchestrator, RetryPolicy};
use crate::generators::Assistant;
use crate::llm::{Completion, CompletionRequest, ModelClient, ModelError};
use crate::prompt::PromptManager;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) const VALID_CI_YAML: &str = "\
name: CI
on:
  push:
  pull_request:
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: ./scripts/build.sh
";

pub(crate) const VALID_METRICS_JSON: &str = r#"{
  "project": "acme",
  "thresholds": {
    "coverage": 80,
    "lint_warnings": 0
  }
}
"#;

pub(crate) const VALID_HOOK: &str = "\
#!/usr/bin/env bash
set -euo pipefail
echo \"checking format\"
cargo fmt --all -- --check
";

pub(crate) const VALID_GUIDE: &str = "\
# Quality Guide

Run `./scripts/build.sh` before pushing.
";

type Scripted = Result<Completion, ModelError>;

/// A `ModelClient` that replays canned responses and records every call.
///
/// Responses come from, in order: the first route whose needle occurs in
/// the prompt, the queued script, then the fallback. With none left the call
/// fails with `InvalidResponse`.
pub(crate) struct ScriptedClient {
    routes: Vec<(String, Scripted)>,
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<Scripted>,
    latency: Option<Duration>,
    calls: Mutex<Vec<(CompletionRequest, Instant)>>,
}

impl ScriptedClient {
    pub(crate) fn new(responses: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            routes: Vec::new(),
            script: Mutex::new(responses.into_iter().collect()),
            fallback: None,
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(response: Scripted) -> Self {
        let mut client = Self::new([]);
        client.fallback = Some(response);
        client
    }

    pub(crate) fn routed<N: Into<String>>(routes: impl IntoIterator<Item = (N, Scripted)>) -> Self {
        let mut client = Self::new([]);
        client.routes = routes.into_iter().map(|(n, r)| (n.into(), r)).collect();
        client
    }

    /// Answers every generator prompt of the standard pipeline with valid output.
    pub(crate) fn standard() -> Self {
        Self::routed([
            ("short quality guide", Ok(completion(VALID_GUIDE))),
            ("GitHub Actions", Ok(completion(VALID_CI_YAML))),
            ("quality metrics", Ok(completion(VALID_METRICS_JSON))),
            ("pre-commit hook", Ok(completion(VALID_HOOK))),
        ])
    }

    /// Simulated network latency per call (advanced instantly under paused time).
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }

    pub(crate) fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.clone(), Instant::now()));

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some((_, response)) = self
            .routes
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
        {
            return response.clone();
        }

        if let Some(response) = self.script.lock().unwrap().pop_front() {
            return response;
        }

        self.fallback
            .clone()
            .unwrap_or_else(|| Err(ModelError::InvalidResponse("script exhausted".to_string())))
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn completion(content: &str) -> Completion {
    Completion {
        content: content.to_string(),
        input_tokens: 100,
        output_tokens: 50,
        model: "claude-test".to_string(),
        message_id: "msg_test".to_string(),
        stop_reason: Some("end_turn".to_string()),
    }
}

pub(crate) fn rate_limited() -> ModelError {
    ModelError::RateLimited {
        retry_after_ms: None,
        message: "slow down".to_string(),
    }
}

/// Retry policy with short, easily asserted delays.
pub(crate) fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(1_000),
    }
}

pub(crate) fn orchestrator(client: Arc<ScriptedClient>) -> GenerationOrchestrator {
    GenerationOrchestrator::new(client, PromptManager::new(), fast_policy(3))
}

/// An assistant over `client` with default model options.
pub(crate) fn assistant(client: Arc<ScriptedClient>, regenerate_on_invalid: u32) -> Assistant {
    Assistant::new(
        Arc::new(orchestrator(client)),
        GenerationOptions::from_settings(&ModelSettings::default()),
        regenerate_on_invalid,
    )
}

pub(crate) fn project_config(target: &Path) -> ProjectConfig {
    ProjectConfig::new("acme", Language::Rust, target).with_description("Payments API")
}
