use tracing::{info, warn};

use crate::catalog::Category;
use crate::provider::StepOutput;

/// Events emitted by the pipeline while it walks a plan.
pub enum ProgressEvent {
    StepStarted {
        deliverable: String,
        category: Category,
        index: usize,
        total: usize,
    },
    /// Result already present in the run's cache.
    StepReused {
        deliverable: String,
    },
    StepSubmitted {
        deliverable: String,
        output: StepOutput,
    },
    StepFailed {
        deliverable: String,
        error: String,
    },
    RunCompleted {
        run_id: String,
        jobs: usize,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Logs each event through `tracing`.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StepStarted {
                deliverable,
                category,
                index,
                total,
            } => info!("[{}/{}] {} ({})", index + 1, total, deliverable, category),
            ProgressEvent::StepReused { deliverable } => {
                info!("{} already computed in this run, reusing", deliverable)
            }
            ProgressEvent::StepSubmitted {
                deliverable,
                output,
            } => match output.handle() {
                Some(handle) => info!("{} submitted as {}", deliverable, handle),
                None => info!("{} ready: {}", deliverable, output.summary()),
            },
            ProgressEvent::StepFailed { deliverable, error } => {
                warn!("{} failed: {}", deliverable, error)
            }
            ProgressEvent::RunCompleted { run_id, jobs } => {
                info!("Run {} complete, {} export job(s) outstanding", run_id, jobs)
            }
        }
    }
}
