//! Model provider error types and classification.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use thiserror::Error;

static TIMEOUT_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btime(d)?\s?out\b").expect("Invalid timeout regex"));

/// A single failed call to the model provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("rate limit exceeded: {message}")]
    RateLimited {
        /// Provider hint from `retry-after`, in milliseconds.
        retry_after_ms: Option<u64>,
        message: String,
    },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ModelError {
    /// Whether retrying the same request may succeed.
    ///
    /// Only rate limits and timeouts are retried. Service errors are not:
    /// an overloaded provider is reported rather than hammered.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_))
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// Map a transport-level failure (no HTTP status) to a model error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

/// Classify a non-success HTTP response.
///
/// The provider's error body (`{"error": {"type": .., "message": ..}}`)
/// takes precedence when its type is recognised; otherwise the status code
/// decides.
pub fn classify_http_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> ModelError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let error_type = parsed.as_ref().and_then(|e| e.error.error_type.clone());
    let message = parsed
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string());
    let message = if message.is_empty() {
        format!("HTTP {}", status)
    } else {
        message
    };

    if let Some(error_type) = error_type.as_deref()
        && let Some(error) = classify_error_type(error_type, status, &message, retry_after_ms)
    {
        return error;
    }

    match status {
        429 => ModelError::RateLimited {
            retry_after_ms,
            message,
        },
        408 | 504 => ModelError::Timeout(message),
        401 | 403 => ModelError::Authentication(message),
        400..=499 => ModelError::InvalidRequest(message),
        _ if TIMEOUT_MESSAGE.is_match(&message) && status >= 500 => ModelError::Timeout(message),
        _ => ModelError::Service { status, message },
    }
}

fn classify_error_type(
    error_type: &str,
    status: u16,
    message: &str,
    retry_after_ms: Option<u64>,
) -> Option<ModelError> {
    let message = message.to_string();
    match error_type {
        "rate_limit_error" => Some(ModelError::RateLimited {
            retry_after_ms,
            message,
        }),
        "timeout_error" => Some(ModelError::Timeout(message)),
        "authentication_error" | "permission_error" => Some(ModelError::Authentication(message)),
        "invalid_request_error" | "not_found_error" | "request_too_large" => {
            Some(ModelError::InvalidRequest(message))
        }
        "overloaded_error" | "api_error" => Some(ModelError::Service { status, message }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(error_type: &str, message: &str) -> String {
        serde_json::json!({"type": "error", "error": {"type": error_type, "message": message}})
            .to_string()
    }

    #[test]
    fn status_only_classification() {
        assert!(matches!(
            classify_http_error(429, "", Some(2_000)),
            ModelError::RateLimited {
                retry_after_ms: Some(2_000),
                ..
            }
        ));
        assert!(matches!(
            classify_http_error(408, "slow", None),
            ModelError::Timeout(_)
        ));
        assert!(matches!(
            classify_http_error(504, "gateway", None),
            ModelError::Timeout(_)
        ));
        assert!(matches!(
            classify_http_error(401, "nope", None),
            ModelError::Authentication(_)
        ));
        assert!(matches!(
            classify_http_error(403, "nope", None),
            ModelError::Authentication(_)
        ));
        assert!(matches!(
            classify_http_error(422, "bad", None),
            ModelError::InvalidRequest(_)
        ));
        assert!(matches!(
            classify_http_error(500, "boom", None),
            ModelError::Service { status: 500, .. }
        ));
    }

    #[test]
    fn error_body_refines_status() {
        let err = classify_http_error(400, &body("invalid_request_error", "max_tokens: too big"), None);
        assert_eq!(
            err,
            ModelError::InvalidRequest("max_tokens: too big".to_string())
        );

        let err = classify_http_error(529, &body("overloaded_error", "Overloaded"), None);
        assert_eq!(
            err,
            ModelError::Service {
                status: 529,
                message: "Overloaded".to_string()
            }
        );

        let err = classify_http_error(400, &body("rate_limit_error", "slow down"), None);
        assert!(err.is_retryable());
    }

    #[test]
    fn unknown_error_type_falls_back_to_status() {
        let err = classify_http_error(401, &body("brand_new_error", "who are you"), None);
        assert_eq!(err, ModelError::Authentication("who are you".to_string()));
    }

    #[test]
    fn gateway_timeout_message_is_a_timeout() {
        let err = classify_http_error(502, "upstream timed out", None);
        assert!(matches!(err, ModelError::Timeout(_)));
    }

    #[test]
    fn empty_body_gets_status_message() {
        let err = classify_http_error(500, "", None);
        assert_eq!(err.to_string(), "service error (status 500): HTTP 500");
    }

    #[test]
    fn retryability() {
        assert!(ModelError::Timeout("t".into()).is_retryable());
        assert!(
            ModelError::RateLimited {
                retry_after_ms: None,
                message: "r".into()
            }
            .is_retryable()
        );
        assert!(!ModelError::Authentication("a".into()).is_retryable());
        assert!(!ModelError::InvalidRequest("i".into()).is_retryable());
        assert!(
            !ModelError::Service {
                status: 503,
                message: "s".into()
            }
            .is_retryable()
        );
        assert!(!ModelError::InvalidResponse("x".into()).is_retryable());
        assert!(!ModelError::Transport("x".into()).is_retryable());
    }

    #[test]
    fn retry_after_only_on_rate_limit() {
        let err = ModelError::RateLimited {
            retry_after_ms: Some(5_000),
            message: String::new(),
        };
        assert_eq!(err.retry_after_ms(), Some(5_000));
        assert_eq!(ModelError::Timeout("t".into()).retry_after_ms(), None);
    }
}
