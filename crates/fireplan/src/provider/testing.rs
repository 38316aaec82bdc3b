//! In-memory provider for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use crate::catalog::Category;
use crate::error::RemoteError;
use crate::monitor::{JobHandle, JobState};
use crate::request::MosaicStrategy;

use super::types::{ComputeRequest, DateRange, ExportTicket, StatisticValue, TaskStatus};
use super::ComputeProvider;

pub(crate) fn sample_request(deliverable: &str) -> ComputeRequest {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    ComputeRequest {
        run_id: "run-1".to_string(),
        deliverable: deliverable.to_string(),
        category: Category::Scientific,
        region: json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }),
        pre_fire: DateRange {
            start: date(2024, 8, 2),
            end: date(2024, 9, 2),
        },
        post_fire: DateRange {
            start: date(2024, 9, 20),
            end: date(2024, 10, 21),
        },
        mosaic_strategy: MosaicStrategy::default(),
        cloud_threshold: None,
        inputs: Vec::new(),
        destination: None,
        thumbnail: None,
    }
}

/// Records every call; task statuses are scripted per handle.
///
/// A scripted status queue repeats its last entry once drained.
#[derive(Default)]
pub(crate) struct FakeProvider {
    calls: Mutex<Vec<(&'static str, String)>>,
    statuses: Mutex<HashMap<String, VecDeque<Result<TaskStatus, RemoteError>>>>,
    failures: Mutex<HashMap<String, RemoteError>>,
    counter: AtomicU64,
    status_calls: AtomicU32,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(&self, handle: &str, states: &[JobState]) {
        let queue = states
            .iter()
            .map(|state| Ok(TaskStatus::new(*state)))
            .collect();
        self.script_results(handle, queue);
    }

    pub(crate) fn script_results(
        &self,
        handle: &str,
        results: VecDeque<Result<TaskStatus, RemoteError>>,
    ) {
        self.statuses
            .lock()
            .unwrap()
            .insert(handle.to_string(), results);
    }

    /// Every call for `deliverable` fails with `error`.
    pub(crate) fn fail_on(&self, deliverable: &str, error: RemoteError) {
        self.failures
            .lock()
            .unwrap()
            .insert(deliverable.to_string(), error);
    }

    pub(crate) fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_for(&self, deliverable: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, d)| d == deliverable)
            .count()
    }

    pub(crate) fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn record(&self, op: &'static str, request: &ComputeRequest) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((op, request.deliverable.clone()));
        match self.failures.lock().unwrap().get(&request.deliverable) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ComputeProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn submit_export(&self, request: &ComputeRequest) -> Result<ExportTicket, RemoteError> {
        self.record("export", request)?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let location = match &request.destination {
            Some(destination) => destination.uri(),
            None => format!("mem://{}/{}", request.run_id, request.deliverable),
        };
        Ok(ExportTicket {
            handle: JobHandle::new(format!("TASK_{}", n)),
            location,
        })
    }

    async fn get_thumbnail(&self, request: &ComputeRequest) -> Result<String, RemoteError> {
        self.record("thumbnail", request)?;
        Ok(format!("https://thumbs.test/{}", request.deliverable))
    }

    async fn compute_statistic(
        &self,
        request: &ComputeRequest,
    ) -> Result<StatisticValue, RemoteError> {
        self.record("statistic", request)?;
        Ok([("high".to_string(), 42.0)].into_iter().collect())
    }

    async fn task_status(&self, handle: &JobHandle) -> Result<TaskStatus, RemoteError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let queue = statuses
            .get_mut(handle.as_str())
            .ok_or_else(|| RemoteError::UnknownJob(handle.to_string()))?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.unwrap_or_else(|| Err(RemoteError::UnknownJob(handle.to_string())))
    }
}
