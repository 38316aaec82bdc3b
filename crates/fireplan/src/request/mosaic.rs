use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// How the backend composites the images of one window into a single mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MosaicStrategy {
    /// Single least-cloudy acquisition.
    BestDateMosaic,
    /// Least-cloudy acquisition with remaining clouds masked out.
    BestDateMaskedMosaic,
    /// Least-cloudy acquisition chosen per tile.
    #[default]
    BestAvailablePerTileMosaic,
    /// Median of every cloud-masked acquisition below the threshold.
    CloudMaskedLightMosaic,
}

impl MosaicStrategy {
    pub const ALL: [MosaicStrategy; 4] = [
        MosaicStrategy::BestDateMosaic,
        MosaicStrategy::BestDateMaskedMosaic,
        MosaicStrategy::BestAvailablePerTileMosaic,
        MosaicStrategy::CloudMaskedLightMosaic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MosaicStrategy::BestDateMosaic => "best_date_mosaic",
            MosaicStrategy::BestDateMaskedMosaic => "best_date_masked_mosaic",
            MosaicStrategy::BestAvailablePerTileMosaic => "best_available_per_tile_mosaic",
            MosaicStrategy::CloudMaskedLightMosaic => "cloud_masked_light_mosaic",
        }
    }
}

impl fmt::Display for MosaicStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MosaicStrategy {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| InputError::UnknownMosaicStrategy(s.to_string()))
    }
}
