//! Monitor events and the observers that receive them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::job::{JobHandle, JobState};

/// Emitted while a job is being polled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskEvent {
    /// One status response, whether or not the state moved.
    #[serde(rename_all = "camelCase")]
    Polled {
        handle: JobHandle,
        label: String,
        state: JobState,
        attempt: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// The observed state differs from the previous observation.
    #[serde(rename_all = "camelCase")]
    StateChanged {
        handle: JobHandle,
        label: String,
        from: JobState,
        to: JobState,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl TaskEvent {
    pub fn handle(&self) -> &JobHandle {
        match self {
            TaskEvent::Polled { handle, .. } | TaskEvent::StateChanged { handle, .. } => handle,
        }
    }

    /// State the job is in after this event.
    pub fn state(&self) -> JobState {
        match self {
            TaskEvent::Polled { state, .. } => *state,
            TaskEvent::StateChanged { to, .. } => *to,
        }
    }

    pub fn is_state_change(&self) -> bool {
        matches!(self, TaskEvent::StateChanged { .. })
    }
}

pub trait TaskObserver: Send + Sync {
    fn notify(&self, event: &TaskEvent);
}

impl<F> TaskObserver for F
where
    F: Fn(&TaskEvent) + Send + Sync,
{
    fn notify(&self, event: &TaskEvent) {
        self(event)
    }
}

pub struct NoopObserver;

impl TaskObserver for NoopObserver {
    fn notify(&self, _event: &TaskEvent) {}
}

/// Fans monitor events out to any number of subscribers.
#[derive(Clone)]
pub struct TaskEventBroadcaster {
    sender: Arc<broadcast::Sender<TaskEvent>>,
}

impl TaskEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: TaskEvent) {
        // No active receivers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TaskEventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl TaskObserver for TaskEventBroadcaster {
    fn notify(&self, event: &TaskEvent) {
        self.send(event.clone());
    }
}
