//! Pipeline execution.
//!
//! Sequential mode runs generators one at a time in registration order.
//! Concurrent mode groups them into dependency waves: every generator in a
//! wave runs as its own task, and a wave starts only after the previous one
//! has fully settled. In both modes a critical failure stops everything that
//! has not started yet; in concurrent mode it also cancels running siblings.

use super::plan::{PipelineEntry, PipelinePlan, PlanError, PlannedGenerator};
use super::report::{GeneratorOutcome, GeneratorRecord, NotAttemptedReason, PipelineReport};
use crate::config::{Criticality, ExecutionMode, ProjectConfig};
use crate::fs::{FileArtifact, OutputScope, TargetDir};
use crate::generators::{GeneratorContext, GeneratorError};
use crate::prompt::ProjectContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An ordered set of generators and how to dispatch them.
#[derive(Debug, Clone)]
pub struct GenerationPipeline {
    entries: Vec<PipelineEntry>,
    mode: ExecutionMode,
}

/// Shared, owned inputs for one run.
#[derive(Clone)]
struct RunInputs {
    config: Arc<ProjectConfig>,
    target: Arc<TargetDir>,
    project: ProjectContext,
}

type Slots = Vec<Option<GeneratorRecord>>;

impl GenerationPipeline {
    pub fn new(entries: Vec<PipelineEntry>) -> Self {
        Self {
            entries,
            mode: ExecutionMode::Sequential,
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    /// Validate the pipeline for `config` without running anything.
    pub fn plan(&self, config: &ProjectConfig) -> Result<PipelinePlan, PlanError> {
        PipelinePlan::build(&self.entries, config)
    }

    /// Run every generator and collect the outcomes.
    ///
    /// Returns `Err` only when the plan is rejected, in which case nothing has
    /// been written. Generator failures are reported per generator.
    pub async fn run(
        &self,
        config: &ProjectConfig,
        target: Arc<TargetDir>,
        project: &ProjectContext,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PlanError> {
        let plan = self.plan(config)?;
        let inputs = RunInputs {
            config: Arc::new(config.clone()),
            target,
            project: project.clone(),
        };

        info!(
            generators = plan.len(),
            mode = ?self.mode,
            target = %inputs.target.root().display(),
            dry_run = inputs.target.is_dry_run(),
            "pipeline started"
        );

        let mut slots: Slots = (0..plan.len()).map(|_| None).collect();
        let aborted_by = match self.mode {
            ExecutionMode::Sequential => run_sequential(&plan, &inputs, cancel, &mut slots).await,
            ExecutionMode::Concurrent => run_concurrent(&plan, &inputs, cancel, &mut slots).await,
        };

        let records = slots
            .into_iter()
            .zip(plan.generators())
            .map(|(slot, planned)| {
                slot.unwrap_or_else(|| {
                    GeneratorRecord::not_attempted(
                        planned.entry.name(),
                        planned.entry.generator().kind(),
                        planned.entry.criticality(),
                        NotAttemptedReason::Cancelled,
                    )
                })
            })
            .collect();

        let report = PipelineReport::new(records, cancel.is_cancelled(), aborted_by);
        info!(status = %report.status(), "pipeline finished");
        Ok(report)
    }
}

async fn run_sequential(
    plan: &PipelinePlan,
    inputs: &RunInputs,
    cancel: &CancellationToken,
    slots: &mut Slots,
) -> Option<String> {
    let mut aborted_by: Option<String> = None;

    for (i, planned) in plan.generators().iter().enumerate() {
        let record = match skip_reason(planned, aborted_by.as_deref(), cancel, slots) {
            Some(reason) => skipped(planned, reason),
            None => {
                let ctx = context_for(planned, inputs, slots, cancel.clone());
                let (result, elapsed) = execute(planned, inputs, ctx).await;
                finished(planned, result, elapsed)
            }
        };

        if aborted_by.is_none() && aborts_run(&record) {
            warn!(generator = %record.name, "critical generator did not succeed, aborting");
            aborted_by = Some(record.name.clone());
        }
        slots[i] = Some(record);
    }

    aborted_by
}

async fn run_concurrent(
    plan: &PipelinePlan,
    inputs: &RunInputs,
    cancel: &CancellationToken,
    slots: &mut Slots,
) -> Option<String> {
    let mut aborted_by: Option<String> = None;

    for (wave_index, wave) in plan.waves().into_iter().enumerate() {
        let wave_cancel = cancel.child_token();
        let mut tasks = JoinSet::new();

        for &i in &wave {
            let planned = &plan.generators()[i];
            if let Some(reason) = skip_reason(planned, aborted_by.as_deref(), cancel, slots) {
                let record = skipped(planned, reason);
                if aborted_by.is_none() && aborts_run(&record) {
                    aborted_by = Some(record.name.clone());
                    wave_cancel.cancel();
                }
                slots[i] = Some(record);
                continue;
            }

            let ctx = context_for(planned, inputs, slots, wave_cancel.clone());
            let planned = planned.clone();
            let inputs = inputs.clone();
            tasks.spawn(async move {
                let (result, elapsed) = execute(&planned, &inputs, ctx).await;
                (i, result, elapsed)
            });
        }

        debug!(wave = wave_index, tasks = tasks.len(), "wave dispatched");

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, result, elapsed)) => {
                    let record = finished(&plan.generators()[i], result, elapsed);
                    if aborted_by.is_none() && aborts_run(&record) {
                        warn!(
                            generator = %record.name,
                            "critical generator failed, cancelling running generators"
                        );
                        aborted_by = Some(record.name.clone());
                        wave_cancel.cancel();
                    }
                    slots[i] = Some(record);
                }
                Err(e) => warn!(error = %e, "generator task ended abnormally"),
            }
        }

        // A task that panicked never reported; record it against its slot.
        for &i in &wave {
            if slots[i].is_none() {
                let planned = &plan.generators()[i];
                let record = finished(
                    planned,
                    Err(GeneratorError::TaskFailed("task panicked".to_string())),
                    Duration::ZERO,
                );
                if aborted_by.is_none() && aborts_run(&record) {
                    aborted_by = Some(record.name.clone());
                }
                slots[i] = Some(record);
            }
        }
    }

    aborted_by
}

/// Why `planned` should not start, if anything stops it.
fn skip_reason(
    planned: &PlannedGenerator,
    aborted_by: Option<&str>,
    cancel: &CancellationToken,
    slots: &Slots,
) -> Option<NotAttemptedReason> {
    if cancel.is_cancelled() {
        return Some(NotAttemptedReason::Cancelled);
    }
    if let Some(by) = aborted_by {
        return Some(NotAttemptedReason::Aborted { by: by.to_string() });
    }
    planned
        .dependencies
        .iter()
        .zip(planned.entry.dependencies())
        .find(|(d, _)| !slots[**d].as_ref().is_some_and(|r| r.outcome.is_success()))
        .map(|(_, name)| NotAttemptedReason::DependencyFailed {
            dependency: name.clone(),
        })
}

/// A critical generator that failed, or could not run because a dependency
/// failed, aborts the run. Cancellation does not.
fn aborts_run(record: &GeneratorRecord) -> bool {
    if record.criticality != Criticality::Critical {
        return false;
    }
    match &record.outcome {
        GeneratorOutcome::Failed { error } => !error.is_cancelled(),
        GeneratorOutcome::NotAttempted {
            reason: NotAttemptedReason::DependencyFailed { .. },
        } => true,
        _ => false,
    }
}

fn context_for(
    planned: &PlannedGenerator,
    inputs: &RunInputs,
    slots: &Slots,
    cancel: CancellationToken,
) -> GeneratorContext {
    let upstream: Vec<FileArtifact> = planned
        .dependencies
        .iter()
        .filter_map(|&d| match slots[d].as_ref().map(|r| &r.outcome) {
            Some(GeneratorOutcome::Succeeded { artifacts }) => Some(artifacts.clone()),
            _ => None,
        })
        .flatten()
        .collect();

    GeneratorContext {
        project: inputs.project.clone(),
        upstream,
        cancel,
    }
}

async fn execute(
    planned: &PlannedGenerator,
    inputs: &RunInputs,
    ctx: GeneratorContext,
) -> (Result<Vec<FileArtifact>, GeneratorError>, Duration) {
    let name = planned.entry.name();
    let scope = OutputScope::new(
        Arc::clone(&inputs.target),
        name,
        planned.outputs.iter().cloned(),
    );

    info!(generator = name, kind = %planned.entry.generator().kind(), "generator started");
    let start = Instant::now();
    let result = planned
        .entry
        .generator()
        .generate(&inputs.config, &scope, &ctx)
        .await;
    let elapsed = start.elapsed();

    match &result {
        Ok(artifacts) => info!(
            generator = name,
            artifacts = artifacts.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "generator succeeded"
        ),
        Err(e) => warn!(
            generator = name,
            error = %e,
            elapsed_ms = elapsed.as_millis() as u64,
            "generator failed"
        ),
    }

    (result, elapsed)
}

fn finished(
    planned: &PlannedGenerator,
    result: Result<Vec<FileArtifact>, GeneratorError>,
    elapsed: Duration,
) -> GeneratorRecord {
    let outcome = match result {
        Ok(artifacts) => GeneratorOutcome::Succeeded { artifacts },
        Err(error) => GeneratorOutcome::Failed { error },
    };
    GeneratorRecord {
        name: planned.entry.name().to_string(),
        kind: planned.entry.generator().kind(),
        criticality: planned.entry.criticality(),
        outcome,
        elapsed,
    }
}

fn skipped(planned: &PlannedGenerator, reason: NotAttemptedReason) -> GeneratorRecord {
    debug!(generator = planned.entry.name(), %reason, "generator not attempted");
    GeneratorRecord::not_attempted(
        planned.entry.name(),
        planned.entry.generator().kind(),
        planned.entry.criticality(),
        reason,
    )
}
