pub mod catalog;
pub mod config;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod pipeline;
pub mod plan;
pub mod preset;
pub mod provider;
pub mod request;
pub mod secrets;

pub use catalog::{CatalogBuilder, Category, Deliverable, DeliverableCatalog, DeliverableId};
pub use config::{default_config_path, load_config, Config, RunDefaults, Settings};
pub use error::{
    CatalogError, ConfigError, FireplanError, InputError, MonitorError, PresetError, RemoteError,
    Result,
};
pub use monitor::{
    ExportJob, JobHandle, JobState, MonitorSettings, NoopObserver, TaskEvent, TaskEventBroadcaster,
    TaskMonitor, TaskObserver,
};
pub use notify::{LogNotifier, Notification, Notifier, NotifyError};
pub use pipeline::{
    DeliverableResult, NoopProgress, Pipeline, PipelineConfig, PipelineContext, PipelineError,
    ProgressEvent, ProgressReporter, RunReport, TracingProgress,
};
pub use plan::{DependencyResolver, ExecutionPlan};
pub use preset::{
    PresetDefinition, PresetMode, PresetRegistry, PresetReport, PresetRun, PresetRunner,
    StudyAreaResults,
};
pub use provider::{
    ComputeProvider, ComputeRequest, DryRunProvider, HttpComputeProvider, StatisticValue,
    StepOutput, TaskStatus,
};
pub use request::{FireWindows, MosaicStrategy, Region, Request, TimeWindow};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
