//! LLM provider access.
//!
//! `ModelClient` is the seam the orchestrator calls through; `AnthropicClient`
//! is the production implementation. Errors are classified into retryable and
//! non-retryable here so the retry loop never inspects HTTP details.

mod anthropic;
mod client;
mod error;

pub use anthropic::AnthropicClient;
pub use client::{ClientConfig, Completion, CompletionRequest, ModelClient};
pub use error::{ModelError, classify_http_error};
