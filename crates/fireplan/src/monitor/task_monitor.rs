use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::MonitorError;
use crate::provider::ComputeProvider;

use super::events::{NoopObserver, TaskEvent, TaskObserver};
use super::job::{ExportJob, JobHandle, JobState};

const UNKNOWN_FAILURE: &str = "Unknown error";

/// Polling cadence and give-up point for a single job.
///
/// A timeout shorter than the interval allows a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl MonitorSettings {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.poll_interval.is_zero() {
            return Err(MonitorError::InvalidSettings(
                "poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::new(Self::DEFAULT_POLL_INTERVAL, Self::DEFAULT_TIMEOUT)
    }
}

/// Polls the backend until a job reaches a terminal state.
///
/// Each call tracks its own job; concurrent calls share nothing but the
/// provider. Timing out stops observation only, the remote job keeps running.
pub struct TaskMonitor {
    provider: Arc<dyn ComputeProvider>,
    settings: MonitorSettings,
}

impl TaskMonitor {
    pub fn new(
        provider: Arc<dyn ComputeProvider>,
        settings: MonitorSettings,
    ) -> Result<Self, MonitorError> {
        settings.validate()?;
        Ok(Self { provider, settings })
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Monitors a bare handle without an observer.
    pub async fn monitor(&self, handle: JobHandle) -> Result<ExportJob, MonitorError> {
        self.monitor_with(handle, None, &NoopObserver).await
    }

    /// Monitors a handle obtained elsewhere, e.g. from an earlier run.
    pub async fn monitor_with(
        &self,
        handle: JobHandle,
        label: Option<&str>,
        observer: &dyn TaskObserver,
    ) -> Result<ExportJob, MonitorError> {
        let mut job = ExportJob::observed(handle, label);
        self.monitor_job(&mut job, observer).await?;
        Ok(job)
    }

    /// Drives `job` to a terminal state.
    ///
    /// Returns `COMPLETED`; `FAILED`/`CANCELLED` become `RemoteJobFailed`.
    /// Nothing is retried.
    pub async fn monitor_job(
        &self,
        job: &mut ExportJob,
        observer: &dyn TaskObserver,
    ) -> Result<JobState, MonitorError> {
        let span = info_span!("monitor", handle = %job.handle, label = %job.deliverable);
        self.poll_until_terminal(job, observer)
            .instrument(span)
            .await
    }

    async fn poll_until_terminal(
        &self,
        job: &mut ExportJob,
        observer: &dyn TaskObserver,
    ) -> Result<JobState, MonitorError> {
        let started = Instant::now();
        let deadline = started + self.settings.timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let status = match timeout_at(deadline, self.provider.task_status(&job.handle)).await {
                Ok(result) => result.map_err(|source| MonitorError::Remote {
                    handle: job.handle.clone(),
                    source,
                })?,
                Err(_) => return Err(timed_out(job, started)),
            };

            let previous = job.state();
            let changed = job.advance(status.state)?;
            if !changed && status.state != previous {
                debug!(attempt, reported = %status.state, "Ignoring stale job state");
            }
            debug!(attempt, state = %job.state(), "Polled job status");
            observer.notify(&TaskEvent::Polled {
                handle: job.handle.clone(),
                label: job.deliverable.clone(),
                state: job.state(),
                attempt,
                detail: status.detail.clone(),
                timestamp: Utc::now(),
            });
            if changed {
                info!("Job {} moved {} -> {}", job.handle, previous, job.state());
                observer.notify(&TaskEvent::StateChanged {
                    handle: job.handle.clone(),
                    label: job.deliverable.clone(),
                    from: previous,
                    to: job.state(),
                    detail: status.detail.clone(),
                    timestamp: Utc::now(),
                });
            }

            match job.state() {
                JobState::Completed => return Ok(JobState::Completed),
                state @ (JobState::Failed | JobState::Cancelled) => {
                    let detail = status
                        .detail
                        .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
                    warn!("Job {} ended in {}: {}", job.handle, state, detail);
                    return Err(MonitorError::RemoteJobFailed {
                        handle: job.handle.clone(),
                        state,
                        detail,
                    });
                }
                JobState::Submitted | JobState::Running => {}
            }

            let next_poll = Instant::now() + self.settings.poll_interval;
            if next_poll > deadline {
                sleep_until(deadline).await;
                return Err(timed_out(job, started));
            }
            sleep_until(next_poll).await;
        }
    }

    /// Monitors several jobs concurrently, each independently of the others.
    ///
    /// Results come back in input order.
    pub async fn monitor_many(
        &self,
        jobs: Vec<ExportJob>,
        observer: &dyn TaskObserver,
    ) -> Vec<(ExportJob, Result<JobState, MonitorError>)> {
        let tasks = jobs.into_iter().map(|mut job| async move {
            let result = self.monitor_job(&mut job, observer).await;
            (job, result)
        });
        join_all(tasks).await
    }
}

fn timed_out(job: &ExportJob, started: Instant) -> MonitorError {
    warn!(
        "Giving up on job {} in state {}; it was left running",
        job.handle,
        job.state()
    );
    MonitorError::Timeout {
        handle: job.handle.clone(),
        waited: started.elapsed(),
        last_state: job.state(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::error::RemoteError;
    use crate::provider::testing::FakeProvider;
    use crate::provider::TaskStatus;

    fn monitor(provider: Arc<FakeProvider>) -> TaskMonitor {
        TaskMonitor::new(
            provider,
            MonitorSettings::new(Duration::from_secs(15), Duration::from_secs(60)),
        )
        .unwrap()
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TaskEvent>>);

    impl TaskObserver for Recorder {
        fn notify(&self, event: &TaskEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    impl Recorder {
        fn polled_states(&self) -> Vec<JobState> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| !e.is_state_change())
                .map(TaskEvent::state)
                .collect()
        }

        fn transitions(&self) -> Vec<(JobState, JobState)> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    TaskEvent::StateChanged { from, to, .. } => Some((*from, *to)),
                    _ => None,
                })
                .collect()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_running_completed() {
        let provider = Arc::new(FakeProvider::new());
        provider.script(
            "T1",
            &[JobState::Running, JobState::Running, JobState::Completed],
        );
        let recorder = Recorder::default();

        let job = monitor(provider.clone())
            .monitor_with("T1".into(), Some("DNBR"), &recorder)
            .await
            .unwrap();

        assert_eq!(job.state(), JobState::Completed);
        assert_eq!(provider.status_calls(), 3);
        // Two progress notifications precede the terminal one.
        assert_eq!(
            recorder.polled_states(),
            vec![JobState::Running, JobState::Running, JobState::Completed]
        );
        assert_eq!(
            recorder.transitions(),
            vec![
                (JobState::Submitted, JobState::Running),
                (JobState::Running, JobState::Completed)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_is_not_retried() {
        let provider = Arc::new(FakeProvider::new());
        provider.script_results(
            "T2",
            VecDeque::from(vec![
                Ok(TaskStatus::new(JobState::Running)),
                Ok(TaskStatus::new(JobState::Failed).with_detail("Out of memory")),
            ]),
        );

        let err = monitor(provider.clone())
            .monitor("T2".into())
            .await
            .unwrap_err();

        match err {
            MonitorError::RemoteJobFailed {
                handle,
                state,
                detail,
            } => {
                assert_eq!(handle.as_str(), "T2");
                assert_eq!(state, JobState::Failed);
                assert_eq!(detail, "Out of memory");
            }
            other => panic!("expected RemoteJobFailed, got {:?}", other),
        }
        assert_eq!(provider.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_without_detail() {
        let provider = Arc::new(FakeProvider::new());
        provider.script("T3", &[JobState::Cancelled]);

        let err = monitor(provider).monitor("T3".into()).await.unwrap_err();
        assert!(matches!(
            err,
            MonitorError::RemoteJobFailed { state: JobState::Cancelled, ref detail, .. }
                if detail == UNKNOWN_FAILURE
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_job_running() {
        let provider = Arc::new(FakeProvider::new());
        provider.script("T4", &[JobState::Running]);

        let err = monitor(provider).monitor("T4".into()).await.unwrap_err();
        match err {
            MonitorError::Timeout {
                last_state, waited, ..
            } => {
                assert_eq!(last_state, JobState::Running);
                assert!(waited >= Duration::from_secs(60));
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_handle() {
        let provider = Arc::new(FakeProvider::new());
        let err = monitor(provider).monitor("missing".into()).await.unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Remote {
                source: RemoteError::UnknownJob(_),
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_many_is_independent() {
        let provider = Arc::new(FakeProvider::new());
        provider.script("A", &[JobState::Running, JobState::Completed]);
        provider.script("B", &[JobState::Failed]);
        let jobs = vec![
            ExportJob::new("A".into(), "DNBR", "gs://b/a"),
            ExportJob::new("B".into(), "RBR", "gs://b/b"),
        ];

        let results = monitor(provider)
            .monitor_many(jobs, &NoopObserver)
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.deliverable, "DNBR");
        assert!(matches!(results[0].1, Ok(JobState::Completed)));
        assert!(matches!(
            results[1].1,
            Err(MonitorError::RemoteJobFailed { .. })
        ));
    }

    #[test]
    fn test_settings_validation() {
        assert!(MonitorSettings::default().validate().is_ok());
        assert!(MonitorSettings::new(Duration::ZERO, Duration::from_secs(1))
            .validate()
            .is_err());
        assert!(
            MonitorSettings::new(Duration::from_secs(30), Duration::from_secs(10))
                .validate()
                .is_ok()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_state_emits_no_backward_change() {
        let provider = Arc::new(FakeProvider::new());
        provider.script(
            "T5",
            &[JobState::Running, JobState::Submitted, JobState::Completed],
        );
        let recorder = Recorder::default();

        let job = monitor(provider.clone())
            .monitor_with("T5".into(), None, &recorder)
            .await
            .unwrap();

        assert_eq!(job.state(), JobState::Completed);
        assert_eq!(provider.status_calls(), 3);
        assert_eq!(
            recorder.transitions(),
            vec![
                (JobState::Submitted, JobState::Running),
                (JobState::Running, JobState::Completed)
            ]
        );
        assert_eq!(
            recorder.polled_states(),
            vec![JobState::Running, JobState::Running, JobState::Completed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_shorter_than_interval_polls_once() {
        let provider = Arc::new(FakeProvider::new());
        provider.script("T6", &[JobState::Running]);
        let monitor = TaskMonitor::new(
            provider.clone(),
            MonitorSettings::new(Duration::from_secs(15), Duration::from_secs(5)),
        )
        .unwrap();

        let err = monitor.monitor("T6".into()).await.unwrap_err();

        assert!(matches!(
            err,
            MonitorError::Timeout { last_state: JobState::Running, .. }
        ));
        assert_eq!(provider.status_calls(), 1);
    }
}
