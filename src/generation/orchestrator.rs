//! Model call orchestration: prompt construction, retry and acceptance.

use super::error::{CancelledError, GenerationError, GenerationFailure};
use super::format::{OutputFormat, strip_code_fence};
use super::result::{GenerationOptions, GenerationRequest, GenerationResult, TokenUsage};
use super::retry::RetryPolicy;
use crate::llm::{Completion, CompletionRequest, ModelClient, ModelError};
use crate::prompt::{PromptManager, TemplateError, vars};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TUNE_PROMPT: &str = "tune";
/// Provider stop reason for a response cut off at `max_tokens`.
const MAX_TOKENS_STOP: &str = "max_tokens";

/// Result of one network attempt.
enum AttemptOutcome {
    Success(Completion),
    Retryable(ModelError),
    Fatal(ModelError),
}

impl From<Result<Completion, ModelError>> for AttemptOutcome {
    fn from(result: Result<Completion, ModelError>) -> Self {
        match result {
            Ok(completion) => AttemptOutcome::Success(completion),
            Err(err) if err.is_retryable() => AttemptOutcome::Retryable(err),
            Err(err) => AttemptOutcome::Fatal(err),
        }
    }
}

/// Drives model calls for generators.
///
/// Stateless per call; the only shared state is the token ledger, so one
/// orchestrator serves every generator in a run, concurrently if needed.
pub struct GenerationOrchestrator {
    client: Arc<dyn ModelClient>,
    prompts: PromptManager,
    policy: RetryPolicy,
    ledger: Mutex<TokenUsage>,
}

impl GenerationOrchestrator {
    pub fn new(client: Arc<dyn ModelClient>, prompts: PromptManager, policy: RetryPolicy) -> Self {
        Self {
            client,
            prompts,
            policy,
            ledger: Mutex::new(TokenUsage::default()),
        }
    }

    pub fn prompts(&self) -> &PromptManager {
        &self.prompts
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Tokens consumed by every successful call so far.
    pub fn usage_totals(&self) -> TokenUsage {
        *self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_usage(&self, usage: TokenUsage) {
        *self.ledger.lock().unwrap_or_else(|e| e.into_inner()) += usage;
    }

    /// Generate content of the request's declared format.
    ///
    /// Nothing touches the network until the template, options and prompt
    /// have been checked. Retryable model errors are retried per the
    /// policy; everything else fails immediately.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GenerationFailure> {
        if request.template.trim().is_empty() {
            return Err(TemplateError::EmptyTemplate.into());
        }
        options.validate()?;

        let rendered = self.prompts.render(&request.template, &request.context)?;
        let prompt = format!(
            "{}\n\n{}",
            rendered.trim_end(),
            request.format.instruction_suffix()
        );

        let call = CompletionRequest {
            prompt,
            model: options.model.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let completion = self.call_with_retry(&call, cancel).await?;
        let result = self.accept(completion, request.format, call.max_tokens)?;

        info!(
            format = %result.format(),
            model = %result.model(),
            input_tokens = result.usage().input(),
            output_tokens = result.usage().output(),
            "generation accepted"
        );
        Ok(result)
    }

    /// Adapt `content` to a free-text target context in a single pass.
    ///
    /// No retry and no format validation; an empty answer is still rejected.
    pub async fn tune(
        &self,
        content: &str,
        target_context: &str,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationFailure> {
        options.validate()?;
        if content.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("nothing to tune".to_string()).into());
        }
        if target_context.trim().is_empty() {
            return Err(
                GenerationError::InvalidRequest("target context must not be empty".to_string())
                    .into(),
            );
        }

        let prompt = self.prompts.render_named(
            TUNE_PROMPT,
            &vars([("content", content), ("target_context", target_context)]),
        )?;

        let call = CompletionRequest {
            prompt,
            model: options.model.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        if cancel.is_cancelled() {
            return Err(CancelledError.into());
        }

        debug!(model = %call.model, "tuning content");
        let completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CancelledError.into()),
            result = self.client.complete(&call) => result.map_err(GenerationError::Model)?,
        };

        self.record_usage(TokenUsage::new(
            completion.input_tokens,
            completion.output_tokens,
        ));
        if is_truncated(&completion) {
            warn!(
                message_id = %completion.message_id,
                max_tokens = call.max_tokens,
                "tuned content hit the token limit and may be incomplete"
            );
        }

        let tuned = strip_code_fence(&completion.content);
        if tuned.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }
        Ok(tuned)
    }

    async fn call_with_retry(
        &self,
        call: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, GenerationFailure> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(CancelledError.into());
            }
            attempt += 1;

            debug!(
                provider = self.client.provider(),
                model = %call.model,
                attempt,
                max_attempts,
                "calling model"
            );

            let outcome: AttemptOutcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CancelledError.into()),
                result = self.client.complete(call) => result.into(),
            };

            let err = match outcome {
                AttemptOutcome::Success(completion) => return Ok(completion),
                AttemptOutcome::Fatal(err) => {
                    warn!(attempt, error = %err, "non-retryable model error");
                    return Err(GenerationError::Model(err).into());
                }
                AttemptOutcome::Retryable(err) => err,
            };

            if attempt >= max_attempts {
                warn!(attempts = attempt, error = %err, "model retries exhausted");
                return Err(GenerationError::RetriesExhausted {
                    attempts: attempt,
                    source: err,
                }
                .into());
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retryable model error, backing off"
            );

            if cancel.is_cancelled() {
                return Err(CancelledError.into());
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CancelledError.into()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn accept(
        &self,
        completion: Completion,
        format: OutputFormat,
        max_tokens: u32,
    ) -> Result<GenerationResult, GenerationError> {
        let usage = TokenUsage::new(completion.input_tokens, completion.output_tokens);
        self.record_usage(usage);

        // A cut-off document can still parse, so it is never accepted.
        if is_truncated(&completion) {
            warn!(
                message_id = %completion.message_id,
                max_tokens,
                "model response hit the token limit"
            );
            return Err(GenerationError::Truncated { max_tokens });
        }

        let content = strip_code_fence(&completion.content);
        if content.trim().is_empty() {
            warn!(message_id = %completion.message_id, "model returned an empty response");
            return Err(GenerationError::EmptyResponse);
        }

        Ok(GenerationResult::new(
            content,
            format,
            usage,
            completion.model,
            completion.message_id,
        ))
    }
}

fn is_truncated(completion: &Completion) -> bool {
    completion.stop_reason.as_deref() == Some(MAX_TOKENS_STOP)
}
