//! Model client trait and request/response types.

use super::error::ModelError;
use async_trait::async_trait;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// One completion request. Single user turn, text in and text out.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Raw provider response for one successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
    pub message_id: String,
    pub stop_reason: Option<String>,
}

/// Immutable connection settings for a provider client.
///
/// Built by the command layer; clients never read the environment.
#[derive(Debug)]
pub struct ClientConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A text-completion provider.
///
/// One network attempt per call; retries belong to the caller.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ModelError>;

    /// Short provider name for logs.
    fn provider(&self) -> &str;
}
