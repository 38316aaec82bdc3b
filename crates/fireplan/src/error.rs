use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use crate::monitor::job::{JobHandle, JobState};

#[derive(Error, Debug)]
pub enum FireplanError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

/// Problems with deliverable definitions or with identifiers that reference them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown deliverable '{0}'")]
    UnknownDeliverable(String),

    #[error("Deliverable '{deliverable}' depends on unregistered deliverable '{dependency}'")]
    DanglingDependency {
        deliverable: String,
        dependency: String,
    },

    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Deliverable '{0}' is registered more than once")]
    DuplicateDeliverable(String),
}

/// Invalid caller input, detected before anything is sent to the compute backend.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid date for '{field}': '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("Date arithmetic for '{field}' left the supported calendar range")]
    DateOutOfRange { field: String },

    #[error("Date window '{field}' is empty: {start} is after {end}")]
    EmptyWindow {
        field: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error(
        "Post-fire window must start after the pre-fire window ends \
         (pre-fire ends {pre_end}, post-fire starts {post_start})"
    )]
    WindowOrder {
        pre_end: NaiveDate,
        post_start: NaiveDate,
    },

    #[error("Fire start date {start} is after fire end date {end}")]
    FireDatesReversed { start: NaiveDate, end: NaiveDate },

    #[error("Days before/after must be at least 1, got {0}")]
    InvalidBuffer(u32),

    #[error("Invalid region of interest: {reason}")]
    InvalidRegion { reason: String },

    #[error("Failed to read region file '{path}': {source}")]
    ReadRegion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cloud threshold must be between 0 and 100, got {0}")]
    InvalidCloudThreshold(u8),

    #[error("Unknown mosaic strategy '{0}'")]
    UnknownMosaicStrategy(String),

    #[error("No deliverables requested")]
    NoDeliverables,

    #[error("Missing required input: {0}")]
    MissingArgument(String),
}

/// Failures reported by (or while reaching) the external compute capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Compute backend unavailable: {0}")]
    Unavailable(String),

    #[error("Compute backend rejected the region of interest: {0}")]
    InvalidRegion(String),

    #[error("Task '{0}' not found on the compute backend")]
    UnknownJob(String),

    #[error("Unexpected response from compute backend: {0}")]
    UnexpectedResponse(String),
}

/// Job-lifecycle failures, surfaced only while monitoring a job handle.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Job {handle} ended in state {state}: {detail}")]
    RemoteJobFailed {
        handle: JobHandle,
        state: JobState,
        detail: String,
    },

    #[error(
        "Stopped monitoring job {handle} after {waited:?} (last observed state {last_state}); \
         the remote job was left running"
    )]
    Timeout {
        handle: JobHandle,
        waited: Duration,
        last_state: JobState,
    },

    #[error("Job {handle} cannot move from terminal state {from} to {to}")]
    InvalidTransition {
        handle: JobHandle,
        from: JobState,
        to: JobState,
    },

    #[error("Failed to query status of job {handle}: {source}")]
    Remote {
        handle: JobHandle,
        #[source]
        source: RemoteError,
    },

    #[error("Invalid monitor settings: {0}")]
    InvalidSettings(String),
}

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("Preset '{0}' is defined more than once")]
    DuplicatePreset(String),

    #[error("Preset '{0}' declares no runs")]
    EmptyPreset(String),

    #[error("Preset '{preset}', study area '{label}': {source}")]
    Input {
        preset: String,
        label: String,
        #[source]
        source: InputError,
    },

    #[error("Preset '{preset}', study area '{label}': {source}")]
    Catalog {
        preset: String,
        label: String,
        #[source]
        source: CatalogError,
    },

    #[error(
        "Preset '{preset}', study area '{label}': deliverable '{deliverable}' would submit an \
         export job in visual and statistics mode"
    )]
    ScientificDependency {
        preset: String,
        label: String,
        deliverable: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid preset '{name}': {reason}")]
    InvalidPreset { name: String, reason: String },

    #[error("Could not determine the user configuration directory")]
    NoConfigDirectory,
}

pub type Result<T> = std::result::Result<T, FireplanError>;
