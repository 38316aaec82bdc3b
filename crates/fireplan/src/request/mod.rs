//! Caller input for a single pipeline run.

mod mosaic;
mod region;
mod window;

pub use mosaic::MosaicStrategy;
pub use region::Region;
pub use window::{parse_date, FireWindows, TimeWindow, DATE_FORMAT};

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// One run: a region, its pre/post-fire windows and the deliverables wanted.
///
/// Every deliverable of a run shares the same windows and compositing
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub region: Region,
    pub windows: FireWindows,
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub mosaic_strategy: MosaicStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_threshold: Option<u8>,
}

impl Request {
    pub fn new<S: Into<String>>(
        region: Region,
        windows: FireWindows,
        deliverables: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            region,
            windows,
            deliverables: deliverables.into_iter().map(Into::into).collect(),
            mosaic_strategy: MosaicStrategy::default(),
            cloud_threshold: None,
        }
    }

    pub fn with_mosaic_strategy(mut self, strategy: MosaicStrategy) -> Self {
        self.mosaic_strategy = strategy;
        self
    }

    pub fn with_cloud_threshold(mut self, threshold: Option<u8>) -> Self {
        self.cloud_threshold = threshold;
        self
    }

    /// Checks everything that can be checked without the catalog.
    pub fn validate(&self) -> Result<(), InputError> {
        self.windows.validate()?;
        if let Some(threshold) = self.cloud_threshold {
            if threshold > 100 {
                return Err(InputError::InvalidCloudThreshold(threshold));
            }
        }
        if self.deliverables.is_empty() {
            return Err(InputError::NoDeliverables);
        }
        Ok(())
    }

    pub fn pre_fire(&self) -> &TimeWindow {
        &self.windows.pre_fire
    }

    pub fn post_fire(&self) -> &TimeWindow {
        &self.windows.post_fire
    }
}
