//! Forecast query orchestration.
//!
//! ```text
//! run_forecast(point)
//!      │
//!      ├─► per grid:     GridCatalog::load_grid ─► locate (configured metric)
//!      ├─► per variable: fetch raster ─► decode ─► check shape
//!      ├─► per timeline: fetch strings ─► normalize
//!      │        (all three fan-outs joined, first failure aborts)
//!      │
//!      └─► extract each variable at its grid's match ─► ForecastResult
//! ```
//!
//! A failed query never yields partial results: every error is logged and
//! returned as [`ForecastError::QueryFailed`] with the root cause attached.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::GridCatalog;
use crate::config::{ForecastConfig, GridConfig, TimelineConfig, VariableConfig};
use crate::error::{ForecastError, Result};
use crate::locator::{locate_great_circle, locate_per_axis};
use crate::raster::{Raster, RasterShape};
use crate::source::{fetch_json, ResourceSource};
use crate::timeline::TimelineNormalizer;
use crate::types::{
    ForecastResult, Grid, GridMatch, MatchResult, NearestMetric, QueryPoint, VariableSeries,
};

/// Answers forecast queries against one configuration and resource source.
///
/// Grids are cached in the catalog after the first query; rasters and
/// timelines are fetched per query.
pub struct ForecastService {
    config: ForecastConfig,
    source: Arc<dyn ResourceSource>,
    catalog: GridCatalog,
}

/// Shapes found by [`ForecastService::validate_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    /// Grid name to (rows, cols).
    pub grids: BTreeMap<String, (usize, usize)>,
    pub variables: BTreeMap<String, RasterShape>,
    /// Timeline name to number of timestamps.
    pub timelines: BTreeMap<String, usize>,
}

impl ForecastService {
    /// Create a service, validating the configuration up front.
    pub fn new(config: ForecastConfig, source: Arc<dyn ResourceSource>) -> Result<Self> {
        config.validate()?;
        let catalog = GridCatalog::new(source.clone(), config.grids.iter().cloned());
        Ok(Self {
            config,
            source,
            catalog,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn catalog(&self) -> &GridCatalog {
        &self.catalog
    }

    /// Find the nearest cell on every grid and extract every variable there.
    #[instrument(skip(self), fields(lat = point.lat, lon = point.lon))]
    pub async fn run_forecast(&self, point: QueryPoint) -> Result<ForecastResult> {
        match self.execute(point).await {
            Ok(result) => {
                info!(
                    grids = result.matches.len(),
                    variables = result.series.len(),
                    "Forecast query completed"
                );
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "Forecast query failed");
                Err(ForecastError::query_failed(e))
            }
        }
    }

    async fn execute(&self, point: QueryPoint) -> Result<ForecastResult> {
        let (located, rasters, timelines) = futures::try_join!(
            try_join_all(self.config.grids.iter().map(|g| self.locate(g, point))),
            try_join_all(self.config.variables().map(|(_, v)| self.load_raster(v))),
            try_join_all(self.config.timelines.iter().map(|t| self.load_timeline(t))),
        )?;

        let located: HashMap<&str, (Arc<Grid>, NearestMetric, MatchResult)> = self
            .config
            .grids
            .iter()
            .zip(located)
            .map(|(spec, (grid, m))| (spec.name.as_str(), (grid, spec.metric, m)))
            .collect();

        let timelines: BTreeMap<String, Vec<DateTime<Utc>>> = self
            .config
            .timelines
            .iter()
            .zip(timelines)
            .map(|(spec, times)| (spec.name.clone(), times))
            .collect();

        let mut series = BTreeMap::new();
        for ((grid_spec, var), raster) in self.config.variables().zip(rasters) {
            let (grid, _, m) = located.get(grid_spec.name.as_str()).ok_or_else(|| {
                ForecastError::invalid_grid(format!("grid '{}' was not located", grid_spec.name))
            })?;

            check_geometry(grid, var)?;
            let values = raster.series(m.lat_index, m.lon_index)?;

            if let Some(name) = &var.timeline {
                let steps = timelines.get(name).map(|t| t.len()).unwrap_or(0);
                if steps != values.len() {
                    warn!(
                        variable = %var.name,
                        timeline = %name,
                        values = values.len(),
                        timestamps = steps,
                        "Series and timeline lengths differ"
                    );
                }
            }

            series.insert(
                var.name.clone(),
                VariableSeries {
                    grid: grid_spec.name.clone(),
                    timeline: var.timeline.clone(),
                    values,
                },
            );
        }

        let matches = located
            .into_iter()
            .map(|(name, (grid, metric, m))| (name.to_string(), GridMatch::new(&grid, metric, m)))
            .collect();

        Ok(ForecastResult {
            query: point,
            matches,
            series,
            timelines,
        })
    }

    /// Load a grid and find the nearest cell with its configured metric.
    async fn locate(&self, spec: &GridConfig, point: QueryPoint) -> Result<(Arc<Grid>, MatchResult)> {
        let grid = self.catalog.load_grid(&spec.name).await?;

        let m = match spec.metric {
            NearestMetric::PerAxis => locate_per_axis(&grid, point)?,
            NearestMetric::GreatCircle => {
                // Full cross-product scan; keep it off the async workers.
                let search = grid.clone();
                tokio::task::spawn_blocking(move || locate_great_circle(&search, point))
                    .await
                    .map_err(|e| {
                        ForecastError::Internal(format!(
                            "great-circle search on '{}' did not complete: {}",
                            spec.name, e
                        ))
                    })??
            }
        };

        debug!(
            grid = %spec.name,
            metric = %spec.metric,
            lat_index = m.lat_index,
            lon_index = m.lon_index,
            distance = m.distance,
            "Located nearest cell"
        );

        Ok((grid, m))
    }

    async fn load_raster(&self, var: &VariableConfig) -> Result<Raster> {
        let bytes = self.source.fetch(&var.resource).await?;
        debug!(variable = %var.name, bytes = bytes.len(), "Fetched raster");
        Raster::from_le_bytes(var.resource.clone(), var.shape(), &bytes)
    }

    async fn load_timeline(&self, spec: &TimelineConfig) -> Result<Vec<DateTime<Utc>>> {
        let raw: Vec<String> = fetch_json(self.source.as_ref(), &spec.resource).await?;
        TimelineNormalizer::new(spec.zone).normalize_all(&raw)
    }

    /// Load every grid, raster and timeline and check that shapes agree,
    /// without running a query.
    #[instrument(skip(self))]
    pub async fn validate_data(&self) -> Result<DataSummary> {
        let grids = try_join_all(
            self.config
                .grids
                .iter()
                .map(|g| self.catalog.load_grid(&g.name)),
        )
        .await?;

        let mut summary = DataSummary {
            grids: grids
                .iter()
                .map(|g| (g.name.clone(), (g.rows(), g.cols())))
                .collect(),
            variables: BTreeMap::new(),
            timelines: BTreeMap::new(),
        };

        for (grid_spec, var) in self.config.variables() {
            let grid = grids
                .iter()
                .find(|g| g.name == grid_spec.name)
                .ok_or_else(|| ForecastError::invalid_grid(format!("grid '{}' missing", grid_spec.name)))?;
            check_geometry(grid, var)?;

            let raster = self.load_raster(var).await?;
            summary.variables.insert(var.name.clone(), raster.shape);
        }

        for spec in &self.config.timelines {
            let times = self.load_timeline(spec).await?;
            summary.timelines.insert(spec.name.clone(), times.len());
        }

        info!(
            grids = summary.grids.len(),
            variables = summary.variables.len(),
            timelines = summary.timelines.len(),
            "Data validated"
        );
        Ok(summary)
    }
}

/// A variable's rows/cols must match its grid's latitude/longitude counts.
fn check_geometry(grid: &Grid, var: &VariableConfig) -> Result<()> {
    if var.rows != grid.rows() || var.cols != grid.cols() {
        return Err(ForecastError::invalid_grid(format!(
            "variable '{}' is {}x{} but grid '{}' is {}x{}",
            var.name,
            var.rows,
            var.cols,
            grid.name,
            grid.rows(),
            grid.cols()
        )));
    }
    Ok(())
}
