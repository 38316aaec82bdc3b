//! Lifecycle tracking of submitted export jobs.

pub mod events;
pub mod job;
pub mod task_monitor;

pub use events::{NoopObserver, TaskEvent, TaskEventBroadcaster, TaskObserver};
pub use job::{ExportJob, JobHandle, JobState};
pub use task_monitor::{MonitorSettings, TaskMonitor};
