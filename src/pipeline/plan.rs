//! Pipeline entries and plan validation.
//!
//! A plan is checked as a whole before any generator runs. Rejection rules:
//! - two entries with the same generator name
//! - a dependency on a name that is not registered, or registered later
//! - an output path that is absolute or escapes the target
//! - two outputs that collide: identical paths, or one path a directory
//!   prefix of another (`docs` vs `docs/QUALITY.md`)
//!
//! Paths written outside the generators (the run journal) are checked
//! against the accepted plan with `check_reserved`.

use crate::config::{Criticality, ProjectConfig};
use crate::fs::is_safe_relative;
use crate::generators::Generator;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Why a pipeline was rejected before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("generator '{0}' is registered more than once")]
    DuplicateGenerator(String),

    #[error("generator '{generator}' depends on unknown generator '{dependency}'")]
    UnknownDependency {
        generator: String,
        dependency: String,
    },

    #[error("generator '{generator}' depends on '{dependency}', which is not registered before it")]
    ForwardDependency {
        generator: String,
        dependency: String,
    },

    #[error("generator '{generator}' declares unsafe output path '{}'", path.display())]
    UnsafeOutputPath { generator: String, path: PathBuf },

    #[error(
        "output '{}' of '{first_generator}' overlaps output '{}' of '{second_generator}'",
        first.display(),
        second.display()
    )]
    OverlappingOutputs {
        first_generator: String,
        first: PathBuf,
        second_generator: String,
        second: PathBuf,
    },

    #[error(
        "output '{}' of '{generator}' overlaps the {owner} path '{}'",
        output.display(),
        reserved.display()
    )]
    ReservedPath {
        generator: String,
        output: PathBuf,
        owner: String,
        reserved: PathBuf,
    },
}

/// A generator registered in a pipeline.
#[derive(Clone)]
pub struct PipelineEntry {
    generator: Arc<dyn Generator>,
    criticality: Criticality,
    depends_on: Vec<String>,
}

impl PipelineEntry {
    pub fn new(generator: Arc<dyn Generator>, criticality: Criticality) -> Self {
        Self {
            generator,
            criticality,
            depends_on: Vec::new(),
        }
    }

    pub fn critical(generator: Arc<dyn Generator>) -> Self {
        Self::new(generator, Criticality::Critical)
    }

    pub fn optional(generator: Arc<dyn Generator>) -> Self {
        Self::new(generator, Criticality::Optional)
    }

    /// Run only after `name` has succeeded.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = criticality;
        self
    }

    pub fn name(&self) -> &str {
        self.generator.name()
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    pub fn criticality(&self) -> Criticality {
        self.criticality
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

impl std::fmt::Debug for PipelineEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineEntry")
            .field("name", &self.name())
            .field("criticality", &self.criticality)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// A validated entry with its resolved outputs and dependency indices.
#[derive(Debug, Clone)]
pub struct PlannedGenerator {
    pub entry: PipelineEntry,
    pub outputs: Vec<PathBuf>,
    pub dependencies: Vec<usize>,
    /// Dependency depth: 0 for no dependencies, else 1 + deepest dependency.
    pub wave: usize,
}

/// An accepted execution plan, in registration order.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    generators: Vec<PlannedGenerator>,
}

impl PipelinePlan {
    /// Validate `entries` against `config`.
    pub fn build(entries: &[PipelineEntry], config: &ProjectConfig) -> Result<Self, PlanError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut generators: Vec<PlannedGenerator> = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.name(), i).is_some() {
                return Err(PlanError::DuplicateGenerator(entry.name().to_string()));
            }
        }

        for (i, entry) in entries.iter().enumerate() {
            let mut dependencies = Vec::with_capacity(entry.depends_on.len());
            for dependency in &entry.depends_on {
                match index.get(dependency.as_str()) {
                    None => {
                        return Err(PlanError::UnknownDependency {
                            generator: entry.name().to_string(),
                            dependency: dependency.clone(),
                        });
                    }
                    Some(&d) if d >= i => {
                        return Err(PlanError::ForwardDependency {
                            generator: entry.name().to_string(),
                            dependency: dependency.clone(),
                        });
                    }
                    Some(&d) => dependencies.push(d),
                }
            }

            let outputs: Vec<PathBuf> = entry
                .generator
                .outputs(config)
                .into_iter()
                .map(|p| normalize(&p))
                .collect();
            for path in &outputs {
                if !is_safe_relative(path) {
                    return Err(PlanError::UnsafeOutputPath {
                        generator: entry.name().to_string(),
                        path: path.clone(),
                    });
                }
            }

            let wave = dependencies
                .iter()
                .map(|&d| generators[d].wave + 1)
                .max()
                .unwrap_or(0);

            generators.push(PlannedGenerator {
                entry: entry.clone(),
                outputs,
                dependencies,
                wave,
            });
        }

        check_overlaps(&generators)?;
        Ok(Self { generators })
    }

    pub fn generators(&self) -> &[PlannedGenerator] {
        &self.generators
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Indices grouped by wave, each group in registration order.
    pub fn waves(&self) -> Vec<Vec<usize>> {
        let depth = self.generators.iter().map(|g| g.wave + 1).max().unwrap_or(0);
        let mut waves = vec![Vec::new(); depth];
        for (i, generator) in self.generators.iter().enumerate() {
            waves[generator.wave].push(i);
        }
        waves
    }

    /// Reject `path` if it collides with any declared output, using the same
    /// rule as output overlaps. `owner` names what else writes there.
    pub fn check_reserved(&self, owner: &str, path: &Path) -> Result<(), PlanError> {
        let reserved = normalize(path);
        match self
            .outputs()
            .find(|(_, output)| output.starts_with(&reserved) || reserved.starts_with(output))
        {
            Some((generator, output)) => Err(PlanError::ReservedPath {
                generator: generator.to_string(),
                output: output.to_path_buf(),
                owner: owner.to_string(),
                reserved,
            }),
            None => Ok(()),
        }
    }

    /// Every declared output, in registration order.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.generators.iter().flat_map(|g| {
            g.outputs
                .iter()
                .map(move |p| (g.entry.name(), p.as_path()))
        })
    }
}

/// Drop `.` components so `./a` and `a` compare equal.
fn normalize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn check_overlaps(generators: &[PlannedGenerator]) -> Result<(), PlanError> {
    let all: Vec<(&str, &PathBuf)> = generators
        .iter()
        .flat_map(|g| g.outputs.iter().map(move |p| (g.entry.name(), p)))
        .collect();

    for (i, (first_generator, first)) in all.iter().enumerate() {
        for (second_generator, second) in &all[i + 1..] {
            if first.starts_with(second) || second.starts_with(first) {
                return Err(PlanError::OverlappingOutputs {
                    first_generator: first_generator.to_string(),
                    first: (*first).clone(),
                    second_generator: second_generator.to_string(),
                    second: (*second).clone(),
                });
            }
        }
    }
    Ok(())
}
