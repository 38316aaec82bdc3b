//! Test harness for isolated integration tests.
//!
//! `ScriptedProvider` stands in for the compute backend: it records every
//! request it receives, hands out sequential handles and answers status
//! queries from per-handle scripts. `TestHarness` owns a temp directory for
//! region and config files plus a pipeline wired to the scripted backend.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use fireplan::provider::ExportTicket;
use fireplan::{
    ComputeProvider, ComputeRequest, DeliverableCatalog, JobHandle, JobState, Pipeline,
    PipelineConfig, RemoteError, StatisticValue, TaskStatus,
};

type FailurePredicate = Box<dyn Fn(&ComputeRequest) -> Option<RemoteError> + Send + Sync>;

/// In-memory compute backend driven by the test.
#[derive(Default)]
pub struct ScriptedProvider {
    requests: Mutex<Vec<ComputeRequest>>,
    statuses: Mutex<HashMap<String, VecDeque<TaskStatus>>>,
    failures: Mutex<Vec<FailurePredicate>>,
    next_handle: AtomicU32,
    status_calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the states reported for `handle`; the last one repeats.
    pub fn script(&self, handle: &str, states: &[JobState]) {
        let queue = states.iter().copied().map(TaskStatus::new).collect();
        self.statuses
            .lock()
            .unwrap()
            .insert(handle.to_string(), queue);
    }

    /// Queues full status responses for `handle`.
    pub fn script_statuses(&self, handle: &str, statuses: Vec<TaskStatus>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(handle.to_string(), statuses.into());
    }

    /// Fails every call whose request matches.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&ComputeRequest) -> Option<RemoteError> + Send + Sync + 'static,
    {
        self.failures.lock().unwrap().push(Box::new(predicate));
    }

    /// Fails every call for `deliverable`.
    pub fn fail_on(&self, deliverable: &str, error: RemoteError) {
        let deliverable = deliverable.to_string();
        self.fail_when(move |request| (request.deliverable == deliverable).then(|| error.clone()));
    }

    pub fn requests(&self) -> Vec<ComputeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, deliverable: &str) -> Vec<ComputeRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.deliverable == deliverable)
            .collect()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.deliverable).collect()
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn record(&self, request: &ComputeRequest) -> Result<(), RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        let failures = self.failures.lock().unwrap();
        match failures.iter().find_map(|predicate| predicate(request)) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ComputeProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit_export(&self, request: &ComputeRequest) -> Result<ExportTicket, RemoteError> {
        self.record(request)?;
        let n = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        let location = request
            .destination
            .as_ref()
            .map(|d| d.uri())
            .unwrap_or_else(|| format!("mem://{}", request.deliverable.to_lowercase()));
        Ok(ExportTicket {
            handle: JobHandle::new(format!("JOB_{}", n)),
            location,
        })
    }

    async fn get_thumbnail(&self, request: &ComputeRequest) -> Result<String, RemoteError> {
        self.record(request)?;
        Ok(format!(
            "https://thumbs.test/{}.jpg",
            request.deliverable.to_lowercase()
        ))
    }

    async fn compute_statistic(
        &self,
        request: &ComputeRequest,
    ) -> Result<StatisticValue, RemoteError> {
        self.record(request)?;
        Ok([("high".to_string(), 12.5), ("low".to_string(), 3.0)]
            .into_iter()
            .collect())
    }

    async fn task_status(&self, handle: &JobHandle) -> Result<TaskStatus, RemoteError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let queue = statuses
            .get_mut(handle.as_str())
            .ok_or_else(|| RemoteError::UnknownJob(handle.to_string()))?;
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        status.ok_or_else(|| RemoteError::UnknownJob(handle.to_string()))
    }
}

/// Isolated environment for a single test.
pub struct TestHarness {
    temp_dir: TempDir,
    pub provider: Arc<ScriptedProvider>,
    pub catalog: Arc<DeliverableCatalog>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            provider: Arc::new(ScriptedProvider::new()),
            catalog: Arc::new(DeliverableCatalog::standard().expect("standard catalog")),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Writes `content` to `name` inside the temp directory.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Writes a GeoJSON feature collection around a small square.
    pub fn write_region(&self, name: &str) -> PathBuf {
        self.write_file(name, super::builders::SQUARE_FEATURE_COLLECTION)
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with(PipelineConfig::default())
    }

    pub fn pipeline_with(&self, config: PipelineConfig) -> Pipeline {
        Pipeline::new(
            self.catalog.clone(),
            self.provider.clone(),
            Arc::new(config),
        )
    }
}
