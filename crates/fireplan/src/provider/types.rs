use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Category;
use crate::monitor::{JobHandle, JobState};
use crate::request::{MosaicStrategy, TimeWindow};

/// Half-open date range `[start, end)` as backends filter imagery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<&TimeWindow> for DateRange {
    fn from(window: &TimeWindow) -> Self {
        Self {
            start: window.start,
            end: window.end_exclusive(),
        }
    }
}

/// Object storage target of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub bucket: String,
    pub object_name: String,
}

impl Destination {
    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object_name)
    }
}

/// Result of a dependency that the request builds on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputReference {
    pub deliverable: String,
    pub output: StepOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailOptions {
    pub dimensions: u32,
    pub format: String,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            dimensions: 1024,
            format: "jpg".to_string(),
        }
    }
}

/// Everything the compute backend needs to produce one deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    pub run_id: String,
    pub deliverable: String,
    pub category: Category,
    /// GeoJSON geometry of the region of interest.
    pub region: Value,
    pub pre_fire: DateRange,
    pub post_fire: DateRange,
    pub mosaic_strategy: MosaicStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_threshold: Option<u8>,
    #[serde(default)]
    pub inputs: Vec<InputReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ThumbnailOptions>,
}

/// Acknowledgement of a submitted export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTicket {
    pub handle: JobHandle,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TaskStatus {
    pub fn new(state: JobState) -> Self {
        Self {
            state,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Named numeric results, e.g. burned area in hectares per severity class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticValue(pub BTreeMap<String, f64>);

impl StatisticValue {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl FromIterator<(String, f64)> for StatisticValue {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for StatisticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| format!("{}={:.2}", key, value))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// What one plan step produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutput {
    /// Submitted export; `location` is where the raster will land.
    Export { location: String, handle: JobHandle },
    Preview { url: String },
    Statistic { value: StatisticValue },
}

impl StepOutput {
    pub fn handle(&self) -> Option<&JobHandle> {
        match self {
            StepOutput::Export { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// Location or value as printed for the caller.
    pub fn summary(&self) -> String {
        match self {
            StepOutput::Export { location, .. } => location.clone(),
            StepOutput::Preview { url } => url.clone(),
            StepOutput::Statistic { value } => value.to_string(),
        }
    }
}
