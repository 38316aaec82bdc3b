use std::sync::Arc;

use log::debug;

use crate::catalog::Category;
use crate::error::RemoteError;
use crate::monitor::ExportJob;
use crate::provider::{ComputeProvider, ComputeRequest, StepOutput};

/// Outcome of dispatching one step.
#[derive(Debug)]
pub struct Submission {
    pub output: StepOutput,
    /// Set for scientific steps only.
    pub job: Option<ExportJob>,
}

/// Dispatches a compute request according to its deliverable's category.
///
/// Scientific steps return as soon as the backend accepts the export; they
/// are never awaited here.
pub struct ExportSubmitter {
    provider: Arc<dyn ComputeProvider>,
}

impl ExportSubmitter {
    pub fn new(provider: Arc<dyn ComputeProvider>) -> Self {
        Self { provider }
    }

    pub async fn submit(&self, request: &ComputeRequest) -> Result<Submission, RemoteError> {
        match request.category {
            Category::Scientific => {
                let ticket = self.provider.submit_export(request).await?;
                debug!(
                    "Export {} submitted as {} -> {}",
                    request.deliverable, ticket.handle, ticket.location
                );
                let job = ExportJob::new(ticket.handle.clone(), &request.deliverable, &ticket.location);
                Ok(Submission {
                    output: StepOutput::Export {
                        location: ticket.location,
                        handle: ticket.handle,
                    },
                    job: Some(job),
                })
            }
            Category::Visual => {
                let url = self.provider.get_thumbnail(request).await?;
                Ok(Submission {
                    output: StepOutput::Preview { url },
                    job: None,
                })
            }
            Category::Statistic => {
                let value = self.provider.compute_statistic(request).await?;
                Ok(Submission {
                    output: StepOutput::Statistic { value },
                    job: None,
                })
            }
        }
    }
}
