use crate::catalog::{Category, DeliverableCatalog, DeliverableId};
use crate::provider::{ComputeRequest, DateRange, InputReference};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;

/// Turns one plan step into the parameters of a compute call.
pub struct ComputeRequestBuilder<'a> {
    catalog: &'a DeliverableCatalog,
    config: &'a PipelineConfig,
}

impl<'a> ComputeRequestBuilder<'a> {
    pub fn new(catalog: &'a DeliverableCatalog, config: &'a PipelineConfig) -> Self {
        Self { catalog, config }
    }

    /// Builds the request for `id` from the run's request and the cached
    /// results of its dependencies.
    pub fn build(
        &self,
        ctx: &mut PipelineContext,
        id: DeliverableId,
    ) -> Result<ComputeRequest, PipelineError> {
        let deliverable = self.catalog.get(id);
        let name = deliverable.name();

        let mut inputs = Vec::with_capacity(deliverable.dependencies().len());
        for dep in deliverable.dependencies() {
            let dep_name = self.catalog.name_of(*dep);
            let output = ctx
                .cache
                .reuse(*dep)
                .cloned()
                .ok_or_else(|| PipelineError::MissingDependency {
                    deliverable: name.to_string(),
                    dependency: dep_name.to_string(),
                })?;
            inputs.push(InputReference {
                deliverable: dep_name.to_string(),
                output,
            });
        }

        let category = deliverable.category();
        let request = &ctx.request;
        Ok(ComputeRequest {
            run_id: ctx.run_id.clone(),
            deliverable: name.to_string(),
            category,
            region: request.region.geometry().clone(),
            pre_fire: DateRange::from(request.pre_fire()),
            post_fire: DateRange::from(request.post_fire()),
            mosaic_strategy: request.mosaic_strategy,
            cloud_threshold: request.cloud_threshold,
            inputs,
            destination: match category {
                Category::Scientific => self.config.destination_for(&ctx.run_id, name),
                _ => None,
            },
            thumbnail: match category {
                Category::Visual => Some(self.config.thumbnail.clone()),
                _ => None,
            },
        })
    }
}
