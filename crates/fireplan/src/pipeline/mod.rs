//! Execution of a resolved plan against the compute provider.

pub mod aggregator;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runner;
pub mod submitter;

pub use aggregator::{DeliverableResult, ResultAggregator, RunReport};
pub use builder::ComputeRequestBuilder;
pub use config::PipelineConfig;
pub use context::{IntermediateCache, PipelineContext};
pub use error::PipelineError;
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter, TracingProgress};
pub use runner::Pipeline;
pub use submitter::{ExportSubmitter, Submission};
