use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, DeliverableCatalog};
use crate::config::RunDefaults;
use crate::error::{InputError, PresetError};
use crate::plan::DependencyResolver;
use crate::request::{FireWindows, MosaicStrategy, Region, Request};

/// Which deliverables a preset may submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetMode {
    #[default]
    Full,
    /// Previews and statistics only; no export job is ever submitted.
    VisualAndStatistics,
}

impl fmt::Display for PresetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetMode::Full => write!(f, "full"),
            PresetMode::VisualAndStatistics => write!(f, "visual_and_statistics"),
        }
    }
}

/// One study area of a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetRun {
    pub label: String,
    /// Inline GeoJSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Path to a GeoJSON file, used when `region` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_file: Option<PathBuf>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_before_after: Option<u32>,
    /// Overrides the preset-wide deliverable list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deliverables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mosaic_strategy: Option<MosaicStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_threshold: Option<u8>,
}

/// A named, fixed set of runs reproducing a published analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: PresetMode,
    /// Deliverables for every run; empty means the whole catalog.
    #[serde(default)]
    pub deliverables: Vec<String>,
    pub runs: Vec<PresetRun>,
}

impl PresetDefinition {
    /// Expands every run into a `(label, request)` pair.
    ///
    /// Problems with the definition itself (no runs, unknown identifiers, a
    /// mode that leaves a run nothing to produce) fail the whole preset.
    /// Invalid dates or regions only fail their own study area and are
    /// returned in its slot. In visual-and-statistics mode scientific
    /// identifiers are dropped before resolution, and a plan that would still
    /// contain one is rejected.
    pub fn expand(
        &self,
        catalog: &DeliverableCatalog,
        defaults: &RunDefaults,
    ) -> Result<Vec<(String, Result<Request, InputError>)>, PresetError> {
        if self.runs.is_empty() {
            return Err(PresetError::EmptyPreset(self.name.clone()));
        }
        self.runs
            .iter()
            .map(|run| {
                let deliverables = self.checked_deliverables(run, catalog)?;
                let request = build_request(run, deliverables, defaults);
                Ok((run.label.clone(), request))
            })
            .collect()
    }

    /// Deliverables for `run`, rejecting sets this preset cannot execute.
    fn checked_deliverables(
        &self,
        run: &PresetRun,
        catalog: &DeliverableCatalog,
    ) -> Result<Vec<String>, PresetError> {
        let deliverables = self.deliverables_for(run, catalog)?;
        if deliverables.is_empty() {
            return Err(PresetError::Input {
                preset: self.name.clone(),
                label: run.label.clone(),
                source: InputError::NoDeliverables,
            });
        }

        if self.mode == PresetMode::VisualAndStatistics {
            let plan = DependencyResolver::new(catalog)
                .resolve(deliverables.as_slice())
                .map_err(|source| self.catalog_err(run, source))?;
            if let Some(id) = plan
                .steps()
                .iter()
                .find(|id| catalog.get(**id).is_scientific())
            {
                return Err(PresetError::ScientificDependency {
                    preset: self.name.clone(),
                    label: run.label.clone(),
                    deliverable: catalog.name_of(*id).to_string(),
                });
            }
        }
        Ok(deliverables)
    }

    /// Canonical identifiers requested by `run`, filtered by the preset mode.
    fn deliverables_for(
        &self,
        run: &PresetRun,
        catalog: &DeliverableCatalog,
    ) -> Result<Vec<String>, PresetError> {
        let declared: Vec<&str> = if !run.deliverables.is_empty() {
            run.deliverables.iter().map(String::as_str).collect()
        } else if !self.deliverables.is_empty() {
            self.deliverables.iter().map(String::as_str).collect()
        } else {
            catalog.all_identifiers()
        };

        let mut names = Vec::with_capacity(declared.len());
        for name in declared {
            let id = catalog
                .lookup(name)
                .map_err(|source| self.catalog_err(run, source))?;
            let deliverable = catalog.get(id);
            if self.mode == PresetMode::VisualAndStatistics
                && deliverable.category() == Category::Scientific
            {
                continue;
            }
            names.push(deliverable.name().to_string());
        }
        Ok(names)
    }

    fn catalog_err(&self, run: &PresetRun, source: crate::error::CatalogError) -> PresetError {
        PresetError::Catalog {
            preset: self.name.clone(),
            label: run.label.clone(),
            source,
        }
    }
}

fn build_request(
    run: &PresetRun,
    deliverables: Vec<String>,
    defaults: &RunDefaults,
) -> Result<Request, InputError> {
    let region = match (&run.region, &run.region_file) {
        (Some(region), _) => region.clone(),
        (None, Some(path)) => Region::from_file(path)?,
        (None, None) => {
            return Err(InputError::InvalidRegion {
                reason: "run declares neither 'region' nor 'region_file'".to_string(),
            })
        }
    };

    let days = run.days_before_after.unwrap_or(defaults.days_before_after);
    let windows = FireWindows::from_fire_dates(run.start_date, run.end_date, days)?;

    let request = Request::new(region, windows, deliverables)
        .with_mosaic_strategy(run.mosaic_strategy.unwrap_or(defaults.mosaic_strategy))
        .with_cloud_threshold(run.cloud_threshold.or(defaults.cloud_threshold));
    request.validate()?;
    Ok(request)
}
