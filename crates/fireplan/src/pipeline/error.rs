use thiserror::Error;

use crate::error::{CatalogError, InputError, RemoteError};

use super::aggregator::RunReport;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    Input(#[from] InputError),

    #[error("Cannot resolve deliverables: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Submitting '{deliverable}' failed: {source}")]
    Submission {
        deliverable: String,
        #[source]
        source: RemoteError,
        /// What was produced before the failure, including submitted job handles.
        partial: Box<RunReport>,
    },

    #[error("'{deliverable}' needs '{dependency}', which has no result in this run")]
    MissingDependency {
        deliverable: String,
        dependency: String,
    },
}

impl PipelineError {
    pub fn partial_report(&self) -> Option<&RunReport> {
        match self {
            PipelineError::Submission { partial, .. } => Some(partial.as_ref()),
            _ => None,
        }
    }

    /// Whether nothing was sent to the backend before the failure.
    pub fn is_pre_submission(&self) -> bool {
        matches!(self, PipelineError::Input(_) | PipelineError::Catalog(_))
    }
}
