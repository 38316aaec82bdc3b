use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::config::RunDefaults;
use crate::error::PresetError;
use crate::pipeline::{Pipeline, PipelineError, ProgressReporter, RunReport};

use super::definition::{PresetDefinition, PresetMode};
use super::registry::PresetRegistry;

/// Every run of one study area, in declaration order.
#[derive(Debug)]
pub struct StudyAreaResults {
    pub label: String,
    pub runs: Vec<Result<RunReport, PipelineError>>,
}

impl StudyAreaResults {
    pub fn reports(&self) -> impl Iterator<Item = &RunReport> {
        self.runs.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &PipelineError> {
        self.runs.iter().filter_map(|r| r.as_ref().err())
    }
}

#[derive(Debug)]
pub struct PresetReport {
    pub preset: String,
    pub mode: PresetMode,
    pub groups: Vec<StudyAreaResults>,
}

impl PresetReport {
    pub fn group(&self, label: &str) -> Option<&StudyAreaResults> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn is_success(&self) -> bool {
        self.groups.iter().all(|g| g.errors().next().is_none())
    }

    pub fn failure_count(&self) -> usize {
        self.groups.iter().map(|g| g.errors().count()).sum()
    }

    /// Successful run reports keyed by label, for machine-readable output.
    pub fn summary(&self) -> Vec<StudyAreaSummary<'_>> {
        self.groups
            .iter()
            .map(|g| StudyAreaSummary {
                label: &g.label,
                reports: g.reports().collect(),
                errors: g.errors().map(ToString::to_string).collect(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct StudyAreaSummary<'a> {
    pub label: &'a str,
    pub reports: Vec<&'a RunReport>,
    pub errors: Vec<String>,
}

/// Runs every study area of a preset through its own pipeline run.
///
/// Runs share the read-only catalog and provider, nothing else. A failing
/// study area is recorded in its group and does not stop the others.
pub struct PresetRunner {
    registry: Arc<PresetRegistry>,
    pipeline: Arc<Pipeline>,
    defaults: RunDefaults,
}

impl PresetRunner {
    pub fn new(
        registry: Arc<PresetRegistry>,
        pipeline: Arc<Pipeline>,
        defaults: RunDefaults,
    ) -> Self {
        Self {
            registry,
            pipeline,
            defaults,
        }
    }

    pub async fn run(
        &self,
        name: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<PresetReport, PresetError> {
        let definition = self.registry.get(name)?;
        self.run_definition(definition, progress).await
    }

    pub async fn run_definition(
        &self,
        definition: &PresetDefinition,
        progress: &dyn ProgressReporter,
    ) -> Result<PresetReport, PresetError> {
        let pairs = definition.expand(self.pipeline.catalog(), &self.defaults)?;
        let parallel = self.defaults.max_parallel_runs.max(1);
        info!(
            "Running preset '{}' ({} study area run(s), mode {}, up to {} at a time)",
            definition.name,
            pairs.len(),
            definition.mode,
            parallel
        );

        let pipeline = &self.pipeline;
        let results: Vec<(String, Result<RunReport, PipelineError>)> =
            stream::iter(pairs.into_iter().map(|(label, request)| {
                let span = info_span!("study_area", preset = %definition.name, label = %label);
                async move {
                    let result = match request {
                        Ok(request) => pipeline.run(request, progress).await,
                        Err(e) => Err(PipelineError::Input(e)),
                    };
                    if let Err(ref e) = result {
                        warn!("Study area '{}' failed: {}", label, e);
                    }
                    (label, result)
                }
                .instrument(span)
            }))
            .buffered(parallel)
            .collect()
            .await;

        let mut groups: Vec<StudyAreaResults> = Vec::new();
        for (label, result) in results {
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.runs.push(result),
                None => groups.push(StudyAreaResults {
                    label,
                    runs: vec![result],
                }),
            }
        }

        Ok(PresetReport {
            preset: definition.name.clone(),
            mode: definition.mode,
            groups,
        })
    }
}
