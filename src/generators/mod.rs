//! Artifact generators.
//!
//! Two kinds share one contract (`Generator`): template generators render
//! static templates from the project config, and model-assisted generators
//! ask the model through the generation orchestrator and validate what comes
//! back. `registry` decides which of them a config enables.

mod assisted;
mod contract;
mod model;
mod policy;
mod registry;
mod scripts;
mod templates;

#[cfg(test)]
mod tests;

pub use assisted::{AssistedGenerator, Assistant, ContentCheck};
pub use contract::{Generator, GeneratorContext, GeneratorError, GeneratorKind};
pub use model::{
    CI_CONFIG, METRICS_CONFIG, PRE_COMMIT_HOOK, QUALITY_GUIDE, ci_config, metrics_config,
    pre_commit_hook, quality_guide,
};
pub use policy::{POLICY_DOCS, PolicyDocsGenerator};
pub use registry::{STANDARD_GENERATORS, standard_pipeline};
pub use scripts::{BUILD_SCRIPTS, BuildScriptsGenerator};
