use serde::{Deserialize, Serialize};

use crate::preset::PresetDefinition;
use crate::request::{FireWindows, MosaicStrategy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub defaults: RunDefaults,
    #[serde(default)]
    pub presets: Vec<PresetDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            backend: BackendConfig::default(),
            monitor: MonitorConfig::default(),
            defaults: RunDefaults::default(),
            presets: Vec::new(),
        }
    }
}

/// Compute gateway connection and export destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project: Option<String>,
    /// Bearer token, direct value.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_file: Option<String>,
    #[serde(default)]
    pub token_env_var: Option<String>,
    #[serde(default)]
    pub destination_bucket: Option<String>,
    #[serde(default = "default_object_prefix")]
    pub object_prefix: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_object_prefix() -> String {
    crate::pipeline::config::DEFAULT_OBJECT_PREFIX.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project: None,
            token: None,
            token_file: None,
            token_env_var: None,
            destination_bucket: None,
            object_prefix: default_object_prefix(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_monitor_timeout")]
    pub timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    15
}

fn default_monitor_timeout() -> u64 {
    6 * 60 * 60
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_monitor_timeout(),
        }
    }
}

/// Values used when a run or preset does not set its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDefaults {
    #[serde(default = "default_days_before_after")]
    pub days_before_after: u32,
    #[serde(default)]
    pub cloud_threshold: Option<u8>,
    #[serde(default)]
    pub mosaic_strategy: MosaicStrategy,
    #[serde(default = "default_max_parallel_runs")]
    pub max_parallel_runs: usize,
}

fn default_days_before_after() -> u32 {
    FireWindows::DEFAULT_DAYS_BEFORE_AFTER
}

fn default_max_parallel_runs() -> usize {
    num_cpus::get()
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            days_before_after: default_days_before_after(),
            cloud_threshold: None,
            mosaic_strategy: MosaicStrategy::default(),
            max_parallel_runs: default_max_parallel_runs(),
        }
    }
}
