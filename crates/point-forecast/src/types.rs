//! Core types for point forecast extraction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Mean Earth radius in kilometres, for converting great-circle angles.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude grid with explicit coordinate arrays.
///
/// Coordinates are not required to be sorted or evenly spaced; lookups
/// always scan linearly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub name: String,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
}

impl Grid {
    /// Create a grid, rejecting empty coordinate arrays.
    pub fn new(
        name: impl Into<String>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if latitudes.is_empty() {
            return Err(ForecastError::invalid_grid(format!(
                "grid '{}' has no latitudes",
                name
            )));
        }
        if longitudes.is_empty() {
            return Err(ForecastError::invalid_grid(format!(
                "grid '{}' has no longitudes",
                name
            )));
        }
        Ok(Self {
            name,
            latitudes,
            longitudes,
        })
    }

    /// Number of latitude rows.
    pub fn rows(&self) -> usize {
        self.latitudes.len()
    }

    /// Number of longitude columns.
    pub fn cols(&self) -> usize {
        self.longitudes.len()
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Always false for a constructed grid.
    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty() || self.longitudes.is_empty()
    }

    /// Coordinates of a cell as (lat, lon).
    pub fn coords(&self, lat_index: usize, lon_index: usize) -> Option<(f64, f64)> {
        Some((
            *self.latitudes.get(lat_index)?,
            *self.longitudes.get(lon_index)?,
        ))
    }
}

/// A caller-supplied location in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub lat: f64,
    pub lon: f64,
}

impl QueryPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Strategy used to find the nearest grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearestMetric {
    /// Closest latitude and closest longitude, searched independently.
    #[default]
    PerAxis,
    /// Closest cell by haversine angle over the full cross product.
    GreatCircle,
}

impl NearestMetric {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "per_axis" | "axis" => Some(Self::PerAxis),
            "great_circle" | "haversine" => Some(Self::GreatCircle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerAxis => "per_axis",
            Self::GreatCircle => "great_circle",
        }
    }
}

impl std::fmt::Display for NearestMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Indices of the matched cell and the residual distance.
///
/// For [`NearestMetric::PerAxis`] the distance is `|dlat| + |dlon|` in
/// degrees; for [`NearestMetric::GreatCircle`] it is the central angle in
/// radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub lat_index: usize,
    pub lon_index: usize,
    pub distance: f64,
}

/// The match recorded for one grid in a forecast result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMatch {
    pub metric: NearestMetric,
    pub lat_index: usize,
    pub lon_index: usize,
    /// Latitude of the matched cell.
    pub latitude: f64,
    /// Longitude of the matched cell.
    pub longitude: f64,
    pub distance: f64,
}

impl GridMatch {
    pub fn new(grid: &Grid, metric: NearestMetric, m: MatchResult) -> Self {
        let (latitude, longitude) = grid
            .coords(m.lat_index, m.lon_index)
            .unwrap_or((f64::NAN, f64::NAN));
        Self {
            metric,
            lat_index: m.lat_index,
            lon_index: m.lon_index,
            latitude,
            longitude,
            distance: m.distance,
        }
    }

    /// Physical distance in kilometres, only meaningful for great-circle matches.
    pub fn distance_km(&self) -> Option<f64> {
        match self.metric {
            NearestMetric::GreatCircle => Some(self.distance * EARTH_RADIUS_KM),
            NearestMetric::PerAxis => None,
        }
    }
}

/// Extracted values for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSeries {
    pub grid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    pub values: Vec<f32>,
}

/// Consolidated answer to one forecast query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub query: QueryPoint,
    pub matches: BTreeMap<String, GridMatch>,
    pub series: BTreeMap<String, VariableSeries>,
    pub timelines: BTreeMap<String, Vec<DateTime<Utc>>>,
}

impl ForecastResult {
    /// Values for a variable.
    pub fn values(&self, variable: &str) -> Option<&[f32]> {
        self.series.get(variable).map(|s| s.values.as_slice())
    }

    /// Timeline attached to a variable, if any.
    pub fn timeline_for(&self, variable: &str) -> Option<&[DateTime<Utc>]> {
        let name = self.series.get(variable)?.timeline.as_ref()?;
        self.timelines.get(name).map(|t| t.as_slice())
    }

    /// Zip a variable's values with its timeline.
    ///
    /// Truncates to the shorter of the two sequences.
    pub fn paired(&self, variable: &str) -> Option<Vec<(DateTime<Utc>, f32)>> {
        let values = self.values(variable)?;
        let times = self.timeline_for(variable)?;
        Some(times.iter().copied().zip(values.iter().copied()).collect())
    }
}
