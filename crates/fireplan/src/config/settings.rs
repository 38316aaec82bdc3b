use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::schema::{Config, RunDefaults};
use crate::error::{RemoteError, Result};
use crate::monitor::MonitorSettings;
use crate::preset::PresetRegistry;
use crate::provider::HttpComputeProvider;
use crate::secrets::resolve_secret_optional;

#[derive(Debug)]
pub struct BackendSettings {
    pub endpoint: String,
    pub project: Option<String>,
    pub token: Option<SecretString>,
    pub destination_bucket: Option<String>,
    pub object_prefix: String,
    pub request_timeout: Duration,
}

/// Immutable runtime configuration, built once at startup.
///
/// Credentials are resolved here; components receive this value (usually in
/// an `Arc`) instead of reading the environment themselves.
#[derive(Debug)]
pub struct Settings {
    pub backend: BackendSettings,
    pub monitor: MonitorSettings,
    pub defaults: RunDefaults,
    pub presets: PresetRegistry,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = &config.backend;
        let token = resolve_secret_optional(
            backend.token.as_deref(),
            backend.token_file.as_deref(),
            backend.token_env_var.as_deref(),
        )?;

        let monitor = MonitorSettings::new(
            Duration::from_secs(config.monitor.poll_interval_secs),
            Duration::from_secs(config.monitor.timeout_secs),
        );
        monitor.validate()?;

        Ok(Self {
            backend: BackendSettings {
                endpoint: backend.endpoint.clone(),
                project: backend.project.clone(),
                token,
                destination_bucket: backend.destination_bucket.clone(),
                object_prefix: backend.object_prefix.clone(),
                request_timeout: Duration::from_secs(backend.request_timeout_secs),
            },
            monitor,
            defaults: config.defaults.clone(),
            presets: PresetRegistry::new(config.presets.clone())?,
        })
    }

    pub fn http_provider(&self) -> std::result::Result<HttpComputeProvider, RemoteError> {
        let token = self
            .backend
            .token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()));
        HttpComputeProvider::new(
            self.backend.endpoint.clone(),
            self.backend.project.clone(),
            token,
            Some(self.backend.request_timeout),
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        let config = Config::default();
        let backend = config.backend;
        Self {
            backend: BackendSettings {
                endpoint: backend.endpoint,
                project: None,
                token: None,
                destination_bucket: None,
                object_prefix: backend.object_prefix,
                request_timeout: Duration::from_secs(backend.request_timeout_secs),
            },
            monitor: MonitorSettings::default(),
            defaults: config.defaults,
            presets: PresetRegistry::default(),
        }
    }
}
