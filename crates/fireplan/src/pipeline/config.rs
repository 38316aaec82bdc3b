use crate::config::Settings;
use crate::provider::{Destination, ThumbnailOptions};

pub const DEFAULT_OBJECT_PREFIX: &str = "fireplan";

/// Per-process settings the pipeline needs to shape compute requests.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bucket exports are written to; the backend picks one when unset.
    pub destination_bucket: Option<String>,
    pub object_prefix: String,
    pub thumbnail: ThumbnailOptions,
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            destination_bucket: settings.backend.destination_bucket.clone(),
            object_prefix: settings.backend.object_prefix.clone(),
            thumbnail: ThumbnailOptions::default(),
        }
    }

    /// `{prefix}/{run_id}/{deliverable}` in the configured bucket.
    pub fn destination_for(&self, run_id: &str, deliverable: &str) -> Option<Destination> {
        let bucket = self.destination_bucket.as_ref()?;
        let prefix = self.object_prefix.trim_matches('/');
        let object_name = if prefix.is_empty() {
            format!("{}/{}", run_id, deliverable.to_lowercase())
        } else {
            format!("{}/{}/{}", prefix, run_id, deliverable.to_lowercase())
        };
        Some(Destination {
            bucket: bucket.clone(),
            object_name,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            destination_bucket: None,
            object_prefix: DEFAULT_OBJECT_PREFIX.to_string(),
            thumbnail: ThumbnailOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_requires_bucket() {
        let config = PipelineConfig::default();
        assert!(config.destination_for("run", "DNBR").is_none());
    }

    #[test]
    fn test_destination_layout() {
        let config = PipelineConfig {
            destination_bucket: Some("burns".to_string()),
            object_prefix: "/exports/".to_string(),
            ..PipelineConfig::default()
        };
        let destination = config.destination_for("abc", "DNBR_SEVERITY").unwrap();
        assert_eq!(destination.uri(), "gs://burns/exports/abc/dnbr_severity");
    }
}
