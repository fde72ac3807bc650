//! Generator pipeline: plan validation, execution, and the run report.
//!
//! A pipeline is an ordered list of generators, each marked critical or
//! optional. The whole plan is validated before the first generator runs;
//! after that, failures are collected into a `PipelineReport` instead of
//! being returned as errors.

mod plan;
mod report;
mod runner;


pub use plan::{PipelineEntry, PipelinePlan, PlanError, PlannedGenerator};
pub use report::{
    GeneratorOutcome, GeneratorRecord, NotAttemptedReason, PipelineReport, PipelineStatus,
};
pub use runner::GenerationPipeline;
