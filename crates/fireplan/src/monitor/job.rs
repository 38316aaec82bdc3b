//! Export job records and their lifecycle state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Opaque task identifier assigned by the compute backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobHandle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

impl From<&str> for JobHandle {
    fn from(handle: &str) -> Self {
        Self(handle.to_string())
    }
}

/// Lifecycle state of a remote export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Submitted,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    /// Position in the lifecycle; terminal states share the last rank.
    fn rank(&self) -> u8 {
        match self {
            JobState::Submitted => 0,
            JobState::Running => 1,
            JobState::Completed | JobState::Failed | JobState::Cancelled => 2,
        }
    }

    /// Normalises a backend task state name.
    pub fn from_remote(state: &str) -> Option<Self> {
        match state.trim().to_ascii_uppercase().as_str() {
            "READY" | "PENDING" | "UNSUBMITTED" | "SUBMITTED" => Some(JobState::Submitted),
            "RUNNING" | "CANCEL_REQUESTED" => Some(JobState::Running),
            "COMPLETED" | "SUCCEEDED" => Some(JobState::Completed),
            "FAILED" => Some(JobState::Failed),
            "CANCELLED" => Some(JobState::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Submitted => write!(f, "SUBMITTED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A submitted export and the last state observed for it.
///
/// State only moves through [`ExportJob::advance`], which the task monitor
/// calls with what the backend reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJob {
    pub handle: JobHandle,
    /// Deliverable identifier, or a free-form label for jobs observed by handle only.
    pub deliverable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExportJob {
    pub fn new(handle: JobHandle, deliverable: &str, destination: &str) -> Self {
        let now = Utc::now();
        Self {
            handle,
            deliverable: deliverable.to_string(),
            destination: Some(destination.to_string()),
            state: JobState::Submitted,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// A job known only by its handle, e.g. one submitted by an earlier process.
    pub fn observed(handle: JobHandle, label: Option<&str>) -> Self {
        let now = Utc::now();
        let deliverable = label.map(str::to_string).unwrap_or_else(|| handle.to_string());
        Self {
            handle,
            deliverable,
            destination: None,
            state: JobState::Submitted,
            submitted_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Records an observed state. Returns whether the state changed.
    ///
    /// A stale report of an earlier non-terminal state (RUNNING, then
    /// SUBMITTED) is ignored. Leaving a terminal state is an error.
    pub fn advance(&mut self, next: JobState) -> Result<bool, MonitorError> {
        if self.state == next {
            return Ok(false);
        }
        if self.state.is_terminal() {
            return Err(MonitorError::InvalidTransition {
                handle: self.handle.clone(),
                from: self.state,
                to: next,
            });
        }
        if next.rank() < self.state.rank() {
            return Ok(false);
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_state_normalisation() {
        assert_eq!(JobState::from_remote("READY"), Some(JobState::Submitted));
        assert_eq!(JobState::from_remote("pending"), Some(JobState::Submitted));
        assert_eq!(
            JobState::from_remote("CANCEL_REQUESTED"),
            Some(JobState::Running)
        );
        assert_eq!(
            JobState::from_remote("SUCCEEDED"),
            Some(JobState::Completed)
        );
        assert_eq!(JobState::from_remote("CANCELLED"), Some(JobState::Cancelled));
        assert_eq!(JobState::from_remote("EXPLODED"), None);
    }

    #[test]
    fn test_advance_through_lifecycle() {
        let mut job = ExportJob::new("T1".into(), "DNBR", "gs://b/run/dnbr");
        assert_eq!(job.state(), JobState::Submitted);
        assert!(job.advance(JobState::Running).unwrap());
        assert!(!job.advance(JobState::Running).unwrap());
        assert!(job.advance(JobState::Completed).unwrap());
        assert!(job.is_terminal());
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut job = ExportJob::new("T1".into(), "DNBR", "gs://b/run/dnbr");
        job.advance(JobState::Failed).unwrap();
        let err = job.advance(JobState::Running).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidTransition {
                from: JobState::Failed,
                to: JobState::Running,
                ..
            }
        ));
        assert_eq!(job.state(), JobState::Failed);
        // Re-observing the same terminal state is not a transition.
        assert!(!job.advance(JobState::Failed).unwrap());
    }

    #[test]
    fn test_lifecycle_never_moves_backwards() {
        let mut job = ExportJob::new("T1".into(), "DNBR", "gs://b/run/dnbr");
        job.advance(JobState::Running).unwrap();
        assert!(!job.advance(JobState::Submitted).unwrap());
        assert_eq!(job.state(), JobState::Running);
        assert!(job.advance(JobState::Completed).unwrap());
    }

    #[test]
    fn test_submitted_may_skip_running() {
        let mut job = ExportJob::new("T1".into(), "DNBR", "gs://b/run/dnbr");
        assert!(job.advance(JobState::Cancelled).unwrap());
        assert_eq!(job.state(), JobState::Cancelled);
    }

    #[test]
    fn test_observed_job_uses_label() {
        let job = ExportJob::observed("ABC".into(), Some("dnbr-area-1"));
        assert_eq!(job.deliverable, "dnbr-area-1");
        assert!(job.destination.is_none());

        let unlabeled = ExportJob::observed("ABC".into(), None);
        assert_eq!(unlabeled.deliverable, "ABC");
    }

    #[test]
    fn test_state_display_matches_serde() {
        let json = serde_json::to_string(&JobState::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
        assert_eq!(JobState::Cancelled.to_string(), "CANCELLED");
    }
}
