use std::sync::Arc;

use tracing::{debug, info_span, Instrument};

use crate::catalog::DeliverableCatalog;
use crate::plan::DependencyResolver;
use crate::provider::ComputeProvider;
use crate::request::Request;

use super::aggregator::{ResultAggregator, RunReport};
use super::builder::ComputeRequestBuilder;
use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::submitter::ExportSubmitter;

/// Resolves a request into a plan and submits every step of it.
pub struct Pipeline {
    catalog: Arc<DeliverableCatalog>,
    config: Arc<PipelineConfig>,
    submitter: ExportSubmitter,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<DeliverableCatalog>,
        provider: Arc<dyn ComputeProvider>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            catalog,
            config,
            submitter: ExportSubmitter::new(provider),
        }
    }

    pub fn catalog(&self) -> &DeliverableCatalog {
        &self.catalog
    }

    /// Validates the request and resolves its plan. Nothing is sent to the
    /// backend.
    pub fn prepare(&self, request: Request) -> Result<PipelineContext, PipelineError> {
        request.validate()?;
        let plan =
            DependencyResolver::new(&self.catalog).resolve(request.deliverables.as_slice())?;
        Ok(PipelineContext::new(request, plan))
    }

    /// Validates, resolves and executes a request.
    pub async fn run(
        &self,
        request: Request,
        progress: &dyn ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let ctx = self.prepare(request)?;
        self.execute(ctx, progress).await
    }

    /// Executes a prepared plan in order.
    ///
    /// The first remote failure stops the run; exports already submitted keep
    /// running and are listed in the error's partial report.
    pub async fn execute(
        &self,
        ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let span = info_span!(
            "pipeline",
            run_id = %ctx.run_id,
            steps = ctx.plan.len(),
            bbox = ?ctx.request.region.bounds()
        );
        self.execute_steps(ctx, progress).instrument(span).await
    }

    async fn execute_steps(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let builder = ComputeRequestBuilder::new(&self.catalog, &self.config);
        let steps = ctx.plan.steps().to_vec();
        let total = steps.len();

        for (index, id) in steps.into_iter().enumerate() {
            let deliverable = self.catalog.get(id);
            let name = deliverable.name();

            if ctx.cache.contains(id) {
                debug!(deliverable = name, "Cache hit, skipping");
                progress.report(ProgressEvent::StepReused {
                    deliverable: name.to_string(),
                });
                continue;
            }

            progress.report(ProgressEvent::StepStarted {
                deliverable: name.to_string(),
                category: deliverable.category(),
                index,
                total,
            });

            let request = builder.build(&mut ctx, id)?;
            let step = info_span!("step", deliverable = name, category = %deliverable.category());
            match self.submitter.submit(&request).instrument(step).await {
                Ok(submission) => {
                    if let Some(job) = submission.job {
                        ctx.jobs.push(job);
                    }
                    ctx.computed.push(id);
                    ctx.cache.insert(id, submission.output.clone());
                    progress.report(ProgressEvent::StepSubmitted {
                        deliverable: name.to_string(),
                        output: submission.output,
                    });
                }
                Err(source) => {
                    progress.report(ProgressEvent::StepFailed {
                        deliverable: name.to_string(),
                        error: source.to_string(),
                    });
                    let partial = ResultAggregator::aggregate(&self.catalog, &ctx);
                    return Err(PipelineError::Submission {
                        deliverable: name.to_string(),
                        source,
                        partial: Box::new(partial),
                    });
                }
            }
        }

        let report = ResultAggregator::aggregate(&self.catalog, &ctx);
        progress.report(ProgressEvent::RunCompleted {
            run_id: report.run_id.clone(),
            jobs: report.jobs.len(),
        });
        Ok(report)
    }
}
