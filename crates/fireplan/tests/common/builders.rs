//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::json;

use fireplan::{
    FireWindows, MosaicStrategy, PresetDefinition, PresetMode, PresetRun, Region, Request,
};

/// A 0.1 degree square in Portugal, wrapped the way GIS tools export it.
pub const SQUARE_FEATURE_COLLECTION: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": { "name": "test-area" },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [-8.10, 40.10], [-8.00, 40.10], [-8.00, 40.20], [-8.10, 40.20], [-8.10, 40.10]
            ]]
        }
    }]
}"#;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn square_region() -> Region {
    Region::from_geojson_str(SQUARE_FEATURE_COLLECTION).unwrap()
}

/// Builder for `Request` instances.
pub struct RequestBuilder {
    region: Region,
    fire_start: NaiveDate,
    fire_end: NaiveDate,
    days: u32,
    deliverables: Vec<String>,
    mosaic_strategy: MosaicStrategy,
    cloud_threshold: Option<u8>,
}

impl RequestBuilder {
    /// A two-week fire in September 2024 with 30-day windows.
    pub fn new() -> Self {
        Self {
            region: square_region(),
            fire_start: date(2024, 9, 1),
            fire_end: date(2024, 9, 15),
            days: 30,
            deliverables: Vec::new(),
            mosaic_strategy: MosaicStrategy::default(),
            cloud_threshold: None,
        }
    }

    pub fn fire(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.fire_start = start;
        self.fire_end = end;
        self
    }

    pub fn days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn deliverables(mut self, names: &[&str]) -> Self {
        self.deliverables = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn mosaic_strategy(mut self, strategy: MosaicStrategy) -> Self {
        self.mosaic_strategy = strategy;
        self
    }

    pub fn cloud_threshold(mut self, threshold: u8) -> Self {
        self.cloud_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Request {
        let windows = FireWindows::from_fire_dates(self.fire_start, self.fire_end, self.days)
            .expect("valid fire dates");
        Request::new(self.region, windows, self.deliverables)
            .with_mosaic_strategy(self.mosaic_strategy)
            .with_cloud_threshold(self.cloud_threshold)
    }
}

/// Builder for `PresetDefinition` instances.
pub struct PresetBuilder {
    name: String,
    mode: PresetMode,
    deliverables: Vec<String>,
    runs: Vec<PresetRun>,
}

impl PresetBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: PresetMode::Full,
            deliverables: Vec::new(),
            runs: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: PresetMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn deliverables(mut self, names: &[&str]) -> Self {
        self.deliverables = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Adds a study area over the test square.
    pub fn run(self, label: &str, start: NaiveDate, end: NaiveDate) -> Self {
        self.run_with(label, start, end, |run| run)
    }

    /// Adds a study area and lets the caller adjust it.
    pub fn run_with<F>(mut self, label: &str, start: NaiveDate, end: NaiveDate, adjust: F) -> Self
    where
        F: FnOnce(PresetRun) -> PresetRun,
    {
        let run = PresetRun {
            label: label.to_string(),
            region: Some(square_region()),
            region_file: None,
            start_date: start,
            end_date: end,
            days_before_after: None,
            deliverables: Vec::new(),
            mosaic_strategy: None,
            cloud_threshold: None,
        };
        self.runs.push(adjust(run));
        self
    }

    pub fn build(self) -> PresetDefinition {
        PresetDefinition {
            name: self.name,
            description: None,
            mode: self.mode,
            deliverables: self.deliverables,
            runs: self.runs,
        }
    }
}

/// A preset definition as it appears in a JSON config file.
pub fn preset_json(name: &str, deliverables: &[&str]) -> serde_json::Value {
    json!({
        "name": name,
        "deliverables": deliverables,
        "runs": [{
            "label": "area-1",
            "region": {
                "type": "Polygon",
                "coordinates": [[[10.0, 10.0], [11.0, 10.0], [11.0, 11.0], [10.0, 10.0]]]
            },
            "start_date": "2024-07-01",
            "end_date": "2024-07-10"
        }]
    })
}
