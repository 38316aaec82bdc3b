//! Region of interest, carried as a validated GeoJSON geometry.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InputError;

/// A polygonal region of interest.
///
/// Accepts a bare `Polygon`/`MultiPolygon`, a `Feature`, or a
/// `FeatureCollection` (whose first feature is used). Only the geometry is
/// kept; it is validated on construction so every `Region` is well formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Region {
    geometry: Value,
}

impl Region {
    pub fn from_geojson_str(content: &str) -> Result<Self, InputError> {
        let value: Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| InputError::ReadRegion {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_geojson_str(&content)
    }

    pub fn from_value(value: Value) -> Result<Self, InputError> {
        let geometry = extract_geometry(value)?;
        validate_geometry(&geometry)?;
        Ok(Self { geometry })
    }

    pub fn geometry(&self) -> &Value {
        &self.geometry
    }

    pub fn geometry_type(&self) -> &str {
        self.geometry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// `[min_lon, min_lat, max_lon, max_lat]` over every position.
    pub fn bounds(&self) -> [f64; 4] {
        let mut bounds = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
        visit_positions(&self.geometry["coordinates"], &mut |lon, lat| {
            bounds[0] = bounds[0].min(lon);
            bounds[1] = bounds[1].min(lat);
            bounds[2] = bounds[2].max(lon);
            bounds[3] = bounds[3].max(lat);
        });
        bounds
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        Region::from_value(value).map_err(|e| D::Error::custom(e.to_string()))
    }
}

fn invalid(reason: impl Into<String>) -> InputError {
    InputError::InvalidRegion {
        reason: reason.into(),
    }
}

fn extract_geometry(value: Value) -> Result<Value, InputError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing GeoJSON 'type'"))?
        .to_string();

    match kind.as_str() {
        "Polygon" | "MultiPolygon" => Ok(value),
        "Feature" => {
            let geometry = value
                .get("geometry")
                .cloned()
                .filter(|g| !g.is_null())
                .ok_or_else(|| invalid("feature has no geometry"))?;
            extract_geometry(geometry)
        }
        "FeatureCollection" => {
            let first = value
                .get("features")
                .and_then(Value::as_array)
                .and_then(|features| features.first())
                .cloned()
                .ok_or_else(|| invalid("feature collection is empty"))?;
            extract_geometry(first)
        }
        other => Err(invalid(format!(
            "unsupported geometry type '{}' (expected Polygon or MultiPolygon)",
            other
        ))),
    }
}

fn validate_geometry(geometry: &Value) -> Result<(), InputError> {
    let coordinates = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("geometry has no coordinate array"))?;

    match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => validate_polygon(coordinates),
        Some("MultiPolygon") => {
            if coordinates.is_empty() {
                return Err(invalid("multipolygon has no polygons"));
            }
            for polygon in coordinates {
                let rings = polygon
                    .as_array()
                    .ok_or_else(|| invalid("multipolygon member is not an array"))?;
                validate_polygon(rings)?;
            }
            Ok(())
        }
        _ => Err(invalid("unsupported geometry type")),
    }
}

fn validate_polygon(rings: &[Value]) -> Result<(), InputError> {
    if rings.is_empty() {
        return Err(invalid("polygon has no rings"));
    }
    for ring in rings {
        let positions = ring
            .as_array()
            .ok_or_else(|| invalid("ring is not an array"))?;
        if positions.len() < 4 {
            return Err(invalid(format!(
                "ring has {} positions, at least 4 are required",
                positions.len()
            )));
        }
        let parsed = positions
            .iter()
            .map(parse_position)
            .collect::<Result<Vec<_>, _>>()?;
        if parsed.first() != parsed.last() {
            return Err(invalid("ring is not closed"));
        }
    }
    Ok(())
}

fn parse_position(position: &Value) -> Result<(f64, f64), InputError> {
    let pair = position
        .as_array()
        .filter(|p| p.len() >= 2)
        .ok_or_else(|| invalid("position must hold longitude and latitude"))?;
    let lon = pair[0]
        .as_f64()
        .ok_or_else(|| invalid("longitude is not a number"))?;
    let lat = pair[1]
        .as_f64()
        .ok_or_else(|| invalid("latitude is not a number"))?;
    if !(-180.0..=180.0).contains(&lon) {
        return Err(invalid(format!("longitude {} out of range", lon)));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(invalid(format!("latitude {} out of range", lat)));
    }
    Ok((lon, lat))
}

fn visit_positions(value: &Value, f: &mut dyn FnMut(f64, f64)) {
    if let Some(items) = value.as_array() {
        if let (Some(lon), Some(lat)) = (
            items.first().and_then(Value::as_f64),
            items.get(1).and_then(Value::as_f64),
        ) {
            f(lon, lat);
            return;
        }
        for item in items {
            visit_positions(item, f);
        }
    }
}
