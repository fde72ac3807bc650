//! Per-generator outcomes and the run report.

use crate::config::Criticality;
use crate::fs::FileArtifact;
use crate::generators::{GeneratorError, GeneratorKind};
use std::fmt;
use std::time::Duration;

/// Why a generator never ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotAttemptedReason {
    /// A critical generator failed earlier.
    Aborted { by: String },
    /// The run was cancelled before this generator started.
    Cancelled,
    /// A declared dependency did not succeed.
    DependencyFailed { dependency: String },
}

impl fmt::Display for NotAttemptedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotAttemptedReason::Aborted { by } => write!(f, "aborted after '{}' failed", by),
            NotAttemptedReason::Cancelled => f.write_str("cancelled"),
            NotAttemptedReason::DependencyFailed { dependency } => {
                write!(f, "dependency '{}' did not succeed", dependency)
            }
        }
    }
}

/// Outcome of one generator.
#[derive(Debug)]
pub enum GeneratorOutcome {
    Succeeded { artifacts: Vec<FileArtifact> },
    Failed { error: GeneratorError },
    NotAttempted { reason: NotAttemptedReason },
}

impl GeneratorOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GeneratorOutcome::Succeeded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            GeneratorOutcome::Succeeded { .. } => "succeeded",
            GeneratorOutcome::Failed { .. } => "failed",
            GeneratorOutcome::NotAttempted { .. } => "not_attempted",
        }
    }
}

/// One line of the report.
#[derive(Debug)]
pub struct GeneratorRecord {
    pub name: String,
    pub kind: GeneratorKind,
    pub criticality: Criticality,
    pub outcome: GeneratorOutcome,
    pub elapsed: Duration,
}

impl GeneratorRecord {
    pub(crate) fn not_attempted(
        name: &str,
        kind: GeneratorKind,
        criticality: Criticality,
        reason: NotAttemptedReason,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            criticality,
            outcome: GeneratorOutcome::NotAttempted { reason },
            elapsed: Duration::ZERO,
        }
    }
}

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Every generator succeeded.
    Complete,
    /// All critical generators succeeded; some optional ones did not.
    CompleteWithGaps,
    /// A critical generator failed or could not run.
    Aborted,
    /// The caller cancelled the run.
    Cancelled,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStatus::Complete => "complete",
            PipelineStatus::CompleteWithGaps => "complete_with_gaps",
            PipelineStatus::Aborted => "aborted",
            PipelineStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Ordered (by registration) outcomes of one pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    records: Vec<GeneratorRecord>,
    status: PipelineStatus,
    aborted_by: Option<String>,
}

impl PipelineReport {
    pub(crate) fn new(
        records: Vec<GeneratorRecord>,
        cancelled: bool,
        aborted_by: Option<String>,
    ) -> Self {
        let all_succeeded = records.iter().all(|r| r.outcome.is_success());
        let status = if cancelled && !all_succeeded {
            PipelineStatus::Cancelled
        } else if aborted_by.is_some() {
            PipelineStatus::Aborted
        } else if all_succeeded {
            PipelineStatus::Complete
        } else {
            PipelineStatus::CompleteWithGaps
        };

        Self {
            records,
            status,
            aborted_by,
        }
    }

    pub fn records(&self) -> &[GeneratorRecord] {
        &self.records
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// The critical generator whose failure stopped the run.
    pub fn aborted_by(&self) -> Option<&str> {
        self.aborted_by.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&GeneratorRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &GeneratorRecord> {
        self.records.iter().filter(|r| r.outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&GeneratorRecord, &GeneratorError)> {
        self.records.iter().filter_map(|r| match &r.outcome {
            GeneratorOutcome::Failed { error } => Some((r, error)),
            _ => None,
        })
    }

    pub fn not_attempted(&self) -> impl Iterator<Item = (&GeneratorRecord, &NotAttemptedReason)> {
        self.records.iter().filter_map(|r| match &r.outcome {
            GeneratorOutcome::NotAttempted { reason } => Some((r, reason)),
            _ => None,
        })
    }

    /// Every artifact produced, in registration order.
    pub fn artifacts(&self) -> impl Iterator<Item = &FileArtifact> {
        self.records.iter().flat_map(|r| match &r.outcome {
            GeneratorOutcome::Succeeded { artifacts } => artifacts.as_slice(),
            _ => &[],
        })
    }
}
