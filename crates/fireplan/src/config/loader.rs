use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::catalog::DeliverableCatalog;
use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Input format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` are YAML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content, ConfigFormat::from_path(path))
}

pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// `<config dir>/fireplan/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("fireplan").join("config.json"))
        .ok_or(ConfigError::NoConfigDirectory)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let monitor = &config.monitor;
    if monitor.poll_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "monitor.poll_interval_secs must be positive".to_string(),
        });
    }
    if monitor.timeout_secs < monitor.poll_interval_secs {
        return Err(ConfigError::Validation {
            message: format!(
                "monitor.timeout_secs ({}) is shorter than monitor.poll_interval_secs ({})",
                monitor.timeout_secs, monitor.poll_interval_secs
            ),
        });
    }

    if let Some(bucket) = &config.backend.destination_bucket {
        validate_bucket_name(bucket)?;
    }

    if let Some(threshold) = config.defaults.cloud_threshold {
        if threshold > 100 {
            return Err(ConfigError::Validation {
                message: format!("defaults.cloud_threshold must be 0-100, got {}", threshold),
            });
        }
    }

    let catalog = DeliverableCatalog::standard().map_err(|e| ConfigError::Validation {
        message: format!("Built-in catalog is invalid: {}", e),
    })?;

    let mut preset_names = HashSet::new();
    for preset in &config.presets {
        if !preset_names.insert(preset.name.as_str()) {
            return Err(ConfigError::InvalidPreset {
                name: preset.name.clone(),
                reason: "Duplicate preset name".to_string(),
            });
        }
        if preset.runs.is_empty() {
            return Err(ConfigError::InvalidPreset {
                name: preset.name.clone(),
                reason: "Preset declares no runs".to_string(),
            });
        }

        let mut labels = HashSet::new();
        for run in &preset.runs {
            if !labels.insert(run.label.as_str()) {
                return Err(ConfigError::InvalidPreset {
                    name: preset.name.clone(),
                    reason: format!("Duplicate study area label '{}'", run.label),
                });
            }
            if run.region.is_none() && run.region_file.is_none() {
                return Err(ConfigError::InvalidPreset {
                    name: preset.name.clone(),
                    reason: format!(
                        "Study area '{}' needs 'region' or 'region_file'",
                        run.label
                    ),
                });
            }
        }

        let declared = preset
            .deliverables
            .iter()
            .chain(preset.runs.iter().flat_map(|r| r.deliverables.iter()));
        for deliverable in declared {
            catalog
                .lookup(deliverable)
                .map_err(|e| ConfigError::InvalidPreset {
                    name: preset.name.clone(),
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Bucket names: 3-63 characters of lowercase letters, digits, `-`, `_` and
/// `.`, starting and ending with a letter or digit.
fn validate_bucket_name(bucket: &str) -> Result<(), ConfigError> {
    let valid_chars = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    let valid_ends = bucket
        .chars()
        .next()
        .zip(bucket.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if !(3..=63).contains(&bucket.len()) || !valid_chars || !valid_ends {
        return Err(ConfigError::Validation {
            message: format!("Invalid destination bucket name '{}'", bucket),
        });
    }
    Ok(())
}
