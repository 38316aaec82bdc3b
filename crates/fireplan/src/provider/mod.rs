//! The compute backend capability and its implementations.

mod dry_run;
mod http;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use dry_run::DryRunProvider;
pub use http::HttpComputeProvider;
pub use types::{
    ComputeRequest, DateRange, Destination, ExportTicket, InputReference, StatisticValue,
    StepOutput, TaskStatus, ThumbnailOptions,
};

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::monitor::JobHandle;

/// Severity classes reported by area statistics, lowest first.
pub const SEVERITY_CLASSES: [&str; 5] = ["unburned", "low", "moderate", "high", "very_high"];

/// Remote imagery/compute capability.
///
/// Implementations must be safe to share across concurrent pipeline runs.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Starts an asynchronous export and returns as soon as the backend accepts it.
    async fn submit_export(&self, request: &ComputeRequest) -> Result<ExportTicket, RemoteError>;

    /// Returns a retrievable preview URL.
    async fn get_thumbnail(&self, request: &ComputeRequest) -> Result<String, RemoteError>;

    async fn compute_statistic(
        &self,
        request: &ComputeRequest,
    ) -> Result<StatisticValue, RemoteError>;

    async fn task_status(&self, handle: &JobHandle) -> Result<TaskStatus, RemoteError>;
}
