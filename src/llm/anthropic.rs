//! Anthropic Messages API client.

use super::client::{ClientConfig, Completion, CompletionRequest, ModelClient};
use super::error::{ModelError, classify_http_error};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Client for `POST {base_url}/v1/messages`.
pub struct AnthropicClient {
    client: Client,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(config: ClientConfig) -> Result<Self, ModelError> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(ModelError::Configuration(
                "API key required for Anthropic".into(),
            ));
        }

        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| ModelError::Configuration("invalid API key format".into()))?;
        api_key.set_sensitive(true);

        let version = HeaderValue::from_str(&config.api_version).map_err(|_| {
            ModelError::Configuration(format!("invalid API version '{}'", config.api_version))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", api_key);
        headers.insert("anthropic-version", version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    id: String,
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ModelError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: [RequestMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .json(&body)
            .send()
            .await
            .map_err(ModelError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_ms(response.headers());
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %text, "model request rejected");
            return Err(classify_http_error(status.as_u16(), &text, retry_after));
        }

        let text = response.text().await.map_err(ModelError::from_transport)?;
        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("unparseable response body: {}", e)))?;

        let content = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(Completion {
            content,
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
            model: parsed.model,
            message_id: parsed.id,
            stop_reason: parsed.stop_reason,
        })
    }

    fn provider(&self) -> &str {
        "anthropic"
    }
}
