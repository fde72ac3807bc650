//! Run journal for qualforge.
//!
//! Every `generate` and `tune` invocation appends one JSON object per line
//! (NDJSON) to `.qualforge/runs.ndjson` under the target directory, or the
//! configured `pipeline.journal_path`.
//!
//! # Record Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: `generate` or `tune`
//! - `actor`: `USER@HOST`
//! - `status`: overall run status
//! - `generators`: per-generator outcome (generate only)
//! - `usage`: tokens spent across every model call of the run
//! - `details`: freeform object with action-specific information

use crate::error::{QualforgeError, Result};
use crate::fs::WriteStatus;
use crate::generation::TokenUsage;
use crate::pipeline::{GeneratorOutcome, PipelineReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// What was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalAction {
    Generate,
    Tune,
}

/// Token totals as recorded on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl From<TokenUsage> for UsageRecord {
    fn from(usage: TokenUsage) -> Self {
        Self {
            input_tokens: usage.input(),
            output_tokens: usage.output(),
        }
    }
}

/// One file touched by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub path: String,
    pub status: String,
}

/// One generator's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorEntry {
    pub name: String,
    pub kind: String,
    pub criticality: String,
    pub outcome: String,
    pub elapsed_ms: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRecord>,

    /// Error message for failures, reason for generators that never ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A single journal line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    pub ts: DateTime<Utc>,
    pub action: JournalAction,
    pub actor: String,
    pub status: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generators: Vec<GeneratorEntry>,

    pub usage: UsageRecord,

    pub details: Value,
}

impl JournalRecord {
    pub fn new(action: JournalAction, status: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            status: status.into(),
            generators: Vec::new(),
            usage: UsageRecord::default(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Record for a finished pipeline run.
    pub fn from_report(report: &PipelineReport, usage: TokenUsage) -> Self {
        let generators = report
            .records()
            .iter()
            .map(|record| {
                let (artifacts, detail) = match &record.outcome {
                    GeneratorOutcome::Succeeded { artifacts } => (
                        artifacts
                            .iter()
                            .map(|a| ArtifactRecord {
                                path: a.path.display().to_string(),
                                status: a.status.to_string(),
                            })
                            .collect(),
                        None,
                    ),
                    GeneratorOutcome::Failed { error } => (Vec::new(), Some(error.to_string())),
                    GeneratorOutcome::NotAttempted { reason } => {
                        (Vec::new(), Some(reason.to_string()))
                    }
                };
                GeneratorEntry {
                    name: record.name.clone(),
                    kind: record.kind.to_string(),
                    criticality: record.criticality.to_string(),
                    outcome: record.outcome.label().to_string(),
                    elapsed_ms: record.elapsed.as_millis() as u64,
                    artifacts,
                    detail,
                }
            })
            .collect();

        Self {
            generators,
            usage: usage.into(),
            ..Self::new(JournalAction::Generate, report.status().to_string())
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            QualforgeError::UserError(format!("failed to serialize journal record: {}", e))
        })
    }

    /// Number of artifacts written to disk in this run.
    pub fn written_count(&self) -> usize {
        let written = WriteStatus::Written.to_string();
        self.generators
            .iter()
            .flat_map(|g| &g.artifacts)
            .filter(|a| a.status == written)
            .count()
    }
}

fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append `record` to the journal at `path`, creating parent directories.
pub fn append_record(path: &Path, record: &JournalRecord) -> Result<()> {
    let line = record.to_ndjson_line()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            QualforgeError::UserError(format!(
                "failed to create journal directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            QualforgeError::UserError(format!(
                "failed to open journal '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", line).map_err(|e| {
        QualforgeError::UserError(format!(
            "failed to write journal '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        QualforgeError::UserError(format!(
            "failed to sync journal '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every record in the journal at `path`.
pub fn read_records(path: &Path) -> Result<Vec<JournalRecord>> {
    let content = fs::read_to_string(path).map_err(|e| {
        QualforgeError::UserError(format!("failed to read journal '{}': {}", path.display(), e))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                QualforgeError::UserError(format!(
                    "journal '{}' line {} is not a valid record: {}",
                    path.display(),
                    i + 1,
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Criticality;
    use crate::fs::FileArtifact;
    use crate::generation::CancelledError;
    use crate::generators::{GeneratorError, GeneratorKind};
    use crate::pipeline::{GeneratorRecord, NotAttemptedReason};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample_report() -> PipelineReport {
        let records = vec![
            GeneratorRecord {
                name: "build_scripts".to_string(),
                kind: GeneratorKind::Template,
                criticality: Criticality::Critical,
                outcome: GeneratorOutcome::Succeeded {
                    artifacts: vec![FileArtifact {
                        path: PathBuf::from("scripts/build.sh"),
                        content: "#!/usr/bin/env bash\n".to_string(),
                        status: WriteStatus::Written,
                    }],
                },
                elapsed: Duration::from_millis(3),
            },
            GeneratorRecord {
                name: "metrics_config".to_string(),
                kind: GeneratorKind::ModelAssisted,
                criticality: Criticality::Optional,
                outcome: GeneratorOutcome::Failed {
                    error: GeneratorError::Cancelled(CancelledError),
                },
                elapsed: Duration::from_millis(40),
            },
            GeneratorRecord::not_attempted(
                "quality_guide",
                GeneratorKind::ModelAssisted,
                Criticality::Optional,
                NotAttemptedReason::DependencyFailed {
                    dependency: "metrics_config".to_string(),
                },
            ),
        ];
        PipelineReport::new(records, false, None)
    }

    #[test]
    fn test_record_from_report() {
        let record = JournalRecord::from_report(&sample_report(), TokenUsage::new(120, 30));

        assert_eq!(record.action, JournalAction::Generate);
        assert_eq!(record.status, "complete_with_gaps");
        assert!(record.actor.contains('@'));
        assert_eq!(record.usage.input_tokens, 120);
        assert_eq!(record.generators.len(), 3);
        assert_eq!(record.generators[0].outcome, "succeeded");
        assert_eq!(record.generators[0].kind, "template");
        assert_eq!(record.generators[0].artifacts[0].status, "written");
        assert_eq!(record.generators[1].detail.as_deref(), Some("operation cancelled"));
        assert_eq!(record.generators[2].outcome, "not_attempted");
        assert_eq!(record.written_count(), 1);
    }

    #[test]
    fn test_ndjson_line_is_single_line() {
        let record = JournalRecord::new(JournalAction::Tune, "complete")
            .with_details(json!({"input": "ci.yml", "model": "claude-haiku"}));

        let line = record.to_ndjson_line().unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"tune\""));

        // Empty generator lists are omitted.
        let value: Value = serde_json::from_str(&line).unwrap();
        assert!(value.get("generators").is_none());
        assert_eq!(value["details"]["model"], "claude-haiku");
    }

    #[test]
    fn test_append_creates_parent_and_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".qualforge/runs.ndjson");

        append_record(
            &path,
            &JournalRecord::from_report(&sample_report(), TokenUsage::default()),
        )
        .unwrap();
        append_record(
            &path,
            &JournalRecord::new(JournalAction::Tune, "complete")
                .with_usage(TokenUsage::new(10, 5)),
        )
        .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, JournalAction::Generate);
        assert_eq!(records[1].action, JournalAction::Tune);
        assert_eq!(records[1].usage.output_tokens, 5);
    }

    #[test]
    fn test_read_rejects_garbage_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("runs.ndjson");
        fs::write(&path, "not json\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
