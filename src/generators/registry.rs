//! The standard pipeline: which generators run for a config, and in what order.

use super::assisted::Assistant;
use super::model::{CI_CONFIG, METRICS_CONFIG, PRE_COMMIT_HOOK, QUALITY_GUIDE};
use super::model::{ci_config, metrics_config, pre_commit_hook, quality_guide};
use super::policy::{POLICY_DOCS, PolicyDocsGenerator};
use super::scripts::{BUILD_SCRIPTS, BuildScriptsGenerator};
use crate::config::Config;
use crate::config::types::{
    FEATURE_CI, FEATURE_DOCS, FEATURE_HOOKS, FEATURE_METRICS, FEATURE_POLICY_DOCS,
};
use crate::pipeline::PipelineEntry;
use std::sync::Arc;

/// Every generator the standard pipeline can register, in registration order.
pub const STANDARD_GENERATORS: &[&str] = &[
    BUILD_SCRIPTS,
    POLICY_DOCS,
    CI_CONFIG,
    METRICS_CONFIG,
    PRE_COMMIT_HOOK,
    QUALITY_GUIDE,
];

/// Build the entries enabled by `config`.
///
/// Defaults: `build_scripts` and `ci_config` are critical, the rest optional.
/// `pipeline.criticality` overrides apply last. `quality_guide` depends on
/// whichever of `ci_config` and `metrics_config` are enabled.
pub fn standard_pipeline(config: &Config, assistant: &Assistant) -> Vec<PipelineEntry> {
    let project = &config.project;
    let mut entries = vec![PipelineEntry::critical(Arc::new(BuildScriptsGenerator))];

    if project.feature_enabled(FEATURE_POLICY_DOCS) {
        entries.push(PipelineEntry::optional(Arc::new(PolicyDocsGenerator)));
    }
    if project.feature_enabled(FEATURE_CI) {
        entries.push(PipelineEntry::critical(Arc::new(ci_config(
            assistant.clone(),
        ))));
    }
    if project.feature_enabled(FEATURE_METRICS) {
        entries.push(PipelineEntry::optional(Arc::new(metrics_config(
            assistant.clone(),
        ))));
    }
    if project.feature_enabled(FEATURE_HOOKS) {
        entries.push(PipelineEntry::optional(Arc::new(pre_commit_hook(
            assistant.clone(),
        ))));
    }
    if project.feature_enabled(FEATURE_DOCS) {
        let mut guide = PipelineEntry::optional(Arc::new(quality_guide(assistant.clone())));
        for upstream in [CI_CONFIG, METRICS_CONFIG] {
            if entries.iter().any(|e| e.name() == upstream) {
                guide = guide.depends_on(upstream);
            }
        }
        entries.push(guide);
    }

    entries
        .into_iter()
        .map(|entry| match config.pipeline.criticality.get(entry.name()) {
            Some(&criticality) => entry.with_criticality(criticality),
            None => entry,
        })
        .collect()
}
