use std::collections::HashMap;

use uuid::Uuid;

use crate::catalog::DeliverableId;
use crate::monitor::ExportJob;
use crate::plan::ExecutionPlan;
use crate::provider::StepOutput;
use crate::request::Request;

/// Results produced so far in one run, keyed by deliverable.
///
/// Owned by a single [`PipelineContext`] and dropped with it.
#[derive(Debug, Default)]
pub struct IntermediateCache {
    entries: HashMap<DeliverableId, StepOutput>,
    hits: usize,
}

impl IntermediateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: DeliverableId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Reads a cached result, counting the read as a reuse.
    pub fn reuse(&mut self, id: DeliverableId) -> Option<&StepOutput> {
        let output = self.entries.get(&id)?;
        self.hits += 1;
        Some(output)
    }

    pub fn get(&self, id: DeliverableId) -> Option<&StepOutput> {
        self.entries.get(&id)
    }

    pub fn insert(&mut self, id: DeliverableId, output: StepOutput) {
        self.entries.insert(id, output);
    }

    /// How many times a cached result was reused instead of recomputed.
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct PipelineContext {
    // Input
    pub run_id: String,
    pub request: Request,

    // Fixed once resolved
    pub plan: ExecutionPlan,

    // Filled step by step
    pub cache: IntermediateCache,
    pub jobs: Vec<ExportJob>,

    // Steps that actually reached the provider, in order
    pub computed: Vec<DeliverableId>,
}

impl PipelineContext {
    pub fn new(request: Request, plan: ExecutionPlan) -> Self {
        Self::with_run_id(Uuid::new_v4().to_string(), request, plan)
    }

    pub fn with_run_id(run_id: impl Into<String>, request: Request, plan: ExecutionPlan) -> Self {
        Self {
            run_id: run_id.into(),
            request,
            plan,
            cache: IntermediateCache::new(),
            jobs: Vec::new(),
            computed: Vec::new(),
        }
    }
}
