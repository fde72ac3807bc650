//! Declared output formats, their prompt instructions and validators.

use super::error::{GenerationError, ValidationError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static ERREXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*set\s+(-[a-zA-Z]*e[a-zA-Z]*\b|-o\s+errexit\b)")
        .expect("Invalid errexit regex")
});

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+\S").expect("Invalid heading regex"));

/// Shape of the text a generation request must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Yaml,
    Json,
    Markdown,
    Bash,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Bash => "bash",
        }
    }

    /// Instruction appended to every prompt for this format.
    pub fn instruction_suffix(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => {
                "Respond with a single valid YAML document using two-space indentation. \
                 Do not add explanations before or after it."
            }
            OutputFormat::Json => {
                "Respond with a single valid JSON document using two-space indentation. \
                 Do not add explanations before or after it."
            }
            OutputFormat::Markdown => {
                "Respond in Markdown. Start with a top-level heading (`# Title`)."
            }
            OutputFormat::Bash => {
                "Respond with a bash script only. The first line must be \
                 `#!/usr/bin/env bash` followed by `set -euo pipefail`."
            }
        }
    }

    /// Structural check of model output.
    pub fn validate(&self, content: &str) -> Result<(), ValidationError> {
        let fail = |message: String| {
            Err(ValidationError {
                format: *self,
                message,
            })
        };

        if content.trim().is_empty() {
            return fail("content is empty".to_string());
        }

        match self {
            OutputFormat::Yaml => match serde_yaml::from_str::<serde_yaml::Value>(content) {
                Ok(serde_yaml::Value::Mapping(_) | serde_yaml::Value::Sequence(_)) => Ok(()),
                Ok(_) => fail("document is a scalar, expected a mapping or sequence".to_string()),
                Err(e) => fail(format!("not valid YAML: {}", e)),
            },
            OutputFormat::Json => match serde_json::from_str::<serde_json::Value>(content) {
                Ok(serde_json::Value::Object(_) | serde_json::Value::Array(_)) => Ok(()),
                Ok(_) => fail("document is a scalar, expected an object or array".to_string()),
                Err(e) => fail(format!("not valid JSON: {}", e)),
            },
            OutputFormat::Markdown => {
                if HEADING.is_match(content) {
                    Ok(())
                } else {
                    fail("no Markdown heading found".to_string())
                }
            }
            OutputFormat::Bash => {
                let first_line = content.trim_start().lines().next().unwrap_or_default();
                if !first_line.starts_with("#!") {
                    return fail("script does not start with a shebang line".to_string());
                }
                if !ERREXIT.is_match(content) {
                    return fail("script does not enable `set -e`".to_string());
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "bash" | "sh" => Ok(OutputFormat::Bash),
            _ => Err(GenerationError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Remove one Markdown code fence wrapping the whole response, if present.
///
/// Models often answer "```yaml\n...\n```" despite being told not to.
pub fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return content.to_string();
    }

    let inner = &trimmed[..trimmed.len() - 3];
    match inner.find('\n') {
        Some(newline) => {
            let body = &inner[newline + 1..];
            if body.contains("\n```") {
                // More than one fenced block; leave it alone.
                return content.to_string();
            }
            let mut body = body.trim_end().to_string();
            body.push('\n');
            body
        }
        None => content.to_string(),
    }
}
