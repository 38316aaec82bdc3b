//! Outbound notification when a monitored job finishes.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::error::MonitorError;
use crate::monitor::{ExportJob, JobState};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to notify '{target}': {reason}")]
    Delivery { target: String, reason: String },
}

/// A message about a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Describes the outcome of monitoring `job`.
    pub fn for_outcome(job: &ExportJob, outcome: &Result<JobState, MonitorError>) -> Self {
        match outcome {
            Ok(state) => Self {
                subject: format!("[fireplan] {} {}", job.deliverable, state),
                body: format!(
                    "Job {} for {} finished with state {}.{}",
                    job.handle,
                    job.deliverable,
                    state,
                    job.destination
                        .as_ref()
                        .map(|d| format!(" Output: {}", d))
                        .unwrap_or_default()
                ),
            },
            Err(error) => Self {
                subject: format!("[fireplan] {} {}", job.deliverable, job.state()),
                body: format!("Job {} for {}: {}", job.handle, job.deliverable, error),
            },
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, target: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// Logs the notification instead of delivering it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, target: &str, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            target_address = target,
            subject = %notification.subject,
            "Notification: {}",
            notification.body
        );
        Ok(())
    }
}
