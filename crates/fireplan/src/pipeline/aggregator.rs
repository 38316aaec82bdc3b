use serde::Serialize;

use crate::catalog::{Category, DeliverableCatalog};
use crate::monitor::{ExportJob, JobHandle};
use crate::provider::StepOutput;

use super::context::PipelineContext;

/// Result of one top-level requested deliverable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableResult {
    pub deliverable: String,
    pub category: Category,
    pub output: StepOutput,
}

impl DeliverableResult {
    pub fn handle(&self) -> Option<&JobHandle> {
        self.output.handle()
    }

    /// `<ID>\t<location|value>[\tjob=<handle>]`
    pub fn line(&self) -> String {
        match self.handle() {
            Some(handle) => format!(
                "{}\t{}\tjob={}",
                self.deliverable,
                self.output.summary(),
                handle
            ),
            None => format!("{}\t{}", self.deliverable, self.output.summary()),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    /// Top-level deliverables in the order they were requested.
    pub results: Vec<DeliverableResult>,
    /// Every export submitted, including those for intermediate steps.
    pub jobs: Vec<ExportJob>,
    pub steps_computed: usize,
    pub cache_hits: usize,
}

impl RunReport {
    pub fn result_for(&self, deliverable: &str) -> Option<&DeliverableResult> {
        self.results
            .iter()
            .find(|r| r.deliverable.eq_ignore_ascii_case(deliverable))
    }

    pub fn handles(&self) -> Vec<&JobHandle> {
        self.jobs.iter().map(|job| &job.handle).collect()
    }

    pub fn has_scientific_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }
}

/// Collects a run's results for the caller.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Reports every requested deliverable that has a result so far, so a
    /// report taken after a failure still lists what was produced.
    pub fn aggregate(catalog: &DeliverableCatalog, ctx: &PipelineContext) -> RunReport {
        let results = ctx
            .plan
            .requested()
            .iter()
            .filter_map(|id| {
                let deliverable = catalog.get(*id);
                ctx.cache.get(*id).map(|output| DeliverableResult {
                    deliverable: deliverable.name().to_string(),
                    category: deliverable.category(),
                    output: output.clone(),
                })
            })
            .collect();

        RunReport {
            run_id: ctx.run_id.clone(),
            results,
            jobs: ctx.jobs.clone(),
            steps_computed: ctx.computed.len(),
            cache_hits: ctx.cache.hits(),
        }
    }
}
