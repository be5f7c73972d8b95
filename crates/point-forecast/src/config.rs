//! Forecast configuration.
//!
//! Grid geometry, variable shapes and timeline bindings are data, not code:
//! a [`ForecastConfig`] lists every grid with the metric used to search it
//! and the variables stored on it. New grids or variables only need a new
//! entry here.
//!
//! ```yaml
//! grids:
//!   - name: uv_and_pt
//!     metric: per_axis
//!     latitudes: latitudes_uv_and_pt.json
//!     longitudes: longitudes_uv_and_pt.json
//!     variables:
//!       - name: GFT
//!         resource: data_gft.bin
//!         rows: 425
//!         cols: 700
//!         time_steps: 72
//!         timeline: gft
//! timelines:
//!   - name: gft
//!     resource: gft_forecast_times.json
//!     zone: local
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::raster::RasterShape;
use crate::source::{HttpSource, ObjectStoreSource, ResourceSource};
use crate::timeline::ZoneHandling;
use crate::types::NearestMetric;

/// Complete configuration for forecast queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub grids: Vec<GridConfig>,
    #[serde(default)]
    pub timelines: Vec<TimelineConfig>,
}

/// One lat/lon grid and the variables stored on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub name: String,
    #[serde(default)]
    pub metric: NearestMetric,
    /// Resource holding the latitude array.
    pub latitudes: String,
    /// Resource holding the longitude array.
    pub longitudes: String,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

/// One raster archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    pub resource: String,
    pub rows: usize,
    pub cols: usize,
    pub time_steps: usize,
    /// Name of the timeline the series aligns with.
    #[serde(default)]
    pub timeline: Option<String>,
}

impl VariableConfig {
    pub fn shape(&self) -> RasterShape {
        RasterShape::new(self.rows, self.cols, self.time_steps)
    }
}

/// One timestamp array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub name: String,
    pub resource: String,
    #[serde(default)]
    pub zone: ZoneHandling,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::dwd_health()
    }
}

impl ForecastConfig {
    /// DWD health forecast archives: perceived temperature (GFT) and UV
    /// index (UVI clear sky, UVH), 425x700 cells, 72 hourly steps.
    ///
    /// The source timestamps carry no zone designator and are read as
    /// local time.
    pub fn dwd_health() -> Self {
        let variable = |name: &str, resource: &str, timeline: &str| VariableConfig {
            name: name.to_string(),
            resource: resource.to_string(),
            rows: 425,
            cols: 700,
            time_steps: 72,
            timeline: Some(timeline.to_string()),
        };

        Self {
            grids: vec![GridConfig {
                name: "uv_and_pt".to_string(),
                metric: NearestMetric::PerAxis,
                latitudes: "latitudes_uv_and_pt.json".to_string(),
                longitudes: "longitudes_uv_and_pt.json".to_string(),
                variables: vec![
                    variable("GFT", "data_gft.bin", "gft"),
                    variable("UVI", "data_uvi.bin", "uvi"),
                    variable("UVH", "data_uvh.bin", "uvi"),
                ],
            }],
            timelines: vec![
                TimelineConfig {
                    name: "gft".to_string(),
                    resource: "gft_forecast_times.json".to_string(),
                    zone: ZoneHandling::Local,
                },
                TimelineConfig {
                    name: "uvi".to_string(),
                    resource: "uvi_forecast_times.json".to_string(),
                    zone: ZoneHandling::Local,
                },
            ],
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::invalid_config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check names, dimensions and timeline references.
    pub fn validate(&self) -> Result<()> {
        if self.grids.is_empty() {
            return Err(ForecastError::invalid_config("no grids configured"));
        }

        let mut timeline_names = HashSet::new();
        for timeline in &self.timelines {
            if timeline.resource.is_empty() {
                return Err(ForecastError::invalid_config(format!(
                    "timeline '{}' has no resource",
                    timeline.name
                )));
            }
            if !timeline_names.insert(timeline.name.as_str()) {
                return Err(ForecastError::invalid_config(format!(
                    "duplicate timeline '{}'",
                    timeline.name
                )));
            }
        }

        let mut grid_names = HashSet::new();
        let mut variable_names = HashSet::new();
        for grid in &self.grids {
            if !grid_names.insert(grid.name.as_str()) {
                return Err(ForecastError::invalid_config(format!(
                    "duplicate grid '{}'",
                    grid.name
                )));
            }
            if grid.latitudes.is_empty() || grid.longitudes.is_empty() {
                return Err(ForecastError::invalid_config(format!(
                    "grid '{}' needs latitude and longitude resources",
                    grid.name
                )));
            }

            for var in &grid.variables {
                if !variable_names.insert(var.name.as_str()) {
                    return Err(ForecastError::invalid_config(format!(
                        "duplicate variable '{}'",
                        var.name
                    )));
                }
                if var.resource.is_empty() {
                    return Err(ForecastError::invalid_config(format!(
                        "variable '{}' has no resource",
                        var.name
                    )));
                }
                if var.rows == 0 || var.cols == 0 || var.time_steps == 0 {
                    return Err(ForecastError::invalid_config(format!(
                        "variable '{}' has an empty shape {}",
                        var.name,
                        var.shape()
                    )));
                }
                if var.shape().byte_len().is_none() {
                    return Err(ForecastError::invalid_config(format!(
                        "variable '{}' shape {} overflows",
                        var.name,
                        var.shape()
                    )));
                }
                if let Some(timeline) = &var.timeline {
                    if !timeline_names.contains(timeline.as_str()) {
                        return Err(ForecastError::invalid_config(format!(
                            "variable '{}' references unknown timeline '{}'",
                            var.name, timeline
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn grid(&self, name: &str) -> Option<&GridConfig> {
        self.grids.iter().find(|g| g.name == name)
    }

    pub fn timeline(&self, name: &str) -> Option<&TimelineConfig> {
        self.timelines.iter().find(|t| t.name == name)
    }

    /// Every variable paired with its owning grid.
    pub fn variables(&self) -> impl Iterator<Item = (&GridConfig, &VariableConfig)> {
        self.grids
            .iter()
            .flat_map(|g| g.variables.iter().map(move |v| (g, v)))
    }
}

/// Where resources are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Local directory with the baked files.
    pub data_dir: PathBuf,
    /// Base URL of the baked files; takes precedence over `data_dir`.
    pub base_url: Option<String>,
    /// Per-request timeout for HTTP sources.
    pub http_timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("docs/data"),
            base_url: None,
            http_timeout_secs: 30,
        }
    }
}

impl SourceSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(val) = std::env::var("FORECAST_DATA_DIR") {
            settings.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("FORECAST_BASE_URL") {
            if !val.is_empty() {
                settings.base_url = Some(val);
            }
        }

        if let Ok(val) = std::env::var("FORECAST_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                settings.http_timeout_secs = secs;
            }
        }

        settings
    }

    /// Build the configured source.
    pub fn build(&self) -> Result<Arc<dyn ResourceSource>> {
        match &self.base_url {
            Some(url) => Ok(Arc::new(HttpSource::new(
                url.clone(),
                Duration::from_secs(self.http_timeout_secs),
            )?)),
            None => Ok(Arc::new(ObjectStoreSource::local(&self.data_dir)?)),
        }
    }
}
