use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::debug;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::monitor::{JobHandle, JobState};

use super::types::{ComputeRequest, ExportTicket, StatisticValue, TaskStatus};
use super::{ComputeProvider, SEVERITY_CLASSES};

/// Provider that never contacts a backend.
///
/// Destinations are derived from the request alone; every handle is new and
/// every task reports `COMPLETED`.
pub struct DryRunProvider {
    session: String,
    counter: AtomicU64,
}

impl DryRunProvider {
    pub fn new() -> Self {
        Self {
            session: Uuid::new_v4().simple().to_string()[..8].to_string(),
            counter: AtomicU64::new(0),
        }
    }

    fn location(request: &ComputeRequest) -> String {
        match &request.destination {
            Some(destination) => destination.uri(),
            None => format!(
                "dry-run://{}/{}",
                request.run_id,
                request.deliverable.to_lowercase()
            ),
        }
    }
}

impl Default for DryRunProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeProvider for DryRunProvider {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn submit_export(&self, request: &ComputeRequest) -> Result<ExportTicket, RemoteError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = JobHandle::new(format!("DRYRUN_{}_{:04}", self.session, n));
        debug!("Dry run export of {} as {}", request.deliverable, handle);
        Ok(ExportTicket {
            handle,
            location: Self::location(request),
        })
    }

    async fn get_thumbnail(&self, request: &ComputeRequest) -> Result<String, RemoteError> {
        let format = request
            .thumbnail
            .as_ref()
            .map(|t| t.format.as_str())
            .unwrap_or("jpg");
        Ok(format!(
            "dry-run://thumbnails/{}/{}.{}",
            request.run_id,
            request.deliverable.to_lowercase(),
            format
        ))
    }

    async fn compute_statistic(
        &self,
        _request: &ComputeRequest,
    ) -> Result<StatisticValue, RemoteError> {
        Ok(SEVERITY_CLASSES
            .iter()
            .map(|class| (class.to_string(), 0.0))
            .collect())
    }

    async fn task_status(&self, _handle: &JobHandle) -> Result<TaskStatus, RemoteError> {
        Ok(TaskStatus::new(JobState::Completed))
    }
}
