//! Load-once catalog of coordinate grids.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::config::GridConfig;
use crate::error::{ForecastError, Result};
use crate::source::{fetch_json, ResourceSource};
use crate::types::Grid;

/// Named grids, each loaded at most once and shared read-only afterwards.
pub struct GridCatalog {
    source: Arc<dyn ResourceSource>,
    specs: HashMap<String, GridConfig>,
    grids: RwLock<HashMap<String, Arc<Grid>>>,
    /// Serializes first loads so concurrent callers do not fetch twice.
    load_lock: Mutex<()>,
}

impl GridCatalog {
    pub fn new(source: Arc<dyn ResourceSource>, specs: impl IntoIterator<Item = GridConfig>) -> Self {
        Self {
            source,
            specs: specs.into_iter().map(|g| (g.name.clone(), g)).collect(),
            grids: RwLock::new(HashMap::new()),
            load_lock: Mutex::new(()),
        }
    }

    /// Return a grid, fetching its coordinate arrays on first use.
    ///
    /// Latitudes and longitudes are fetched concurrently; either failing
    /// fails the load and nothing is cached.
    #[instrument(skip(self))]
    pub async fn load_grid(&self, name: &str) -> Result<Arc<Grid>> {
        if let Some(grid) = self.grids.read().await.get(name) {
            return Ok(grid.clone());
        }

        let _guard = self.load_lock.lock().await;

        // Another caller may have finished the load while we waited.
        if let Some(grid) = self.grids.read().await.get(name) {
            return Ok(grid.clone());
        }

        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| ForecastError::unavailable(name, "grid is not configured"))?;

        debug!(
            latitudes = %spec.latitudes,
            longitudes = %spec.longitudes,
            source = %self.source.describe(),
            "Loading grid coordinates"
        );

        let (latitudes, longitudes) = futures::try_join!(
            fetch_json::<Vec<f64>, _>(self.source.as_ref(), &spec.latitudes),
            fetch_json::<Vec<f64>, _>(self.source.as_ref(), &spec.longitudes),
        )?;

        let grid = Arc::new(Grid::new(name, latitudes, longitudes)?);
        info!(
            grid = %name,
            rows = grid.rows(),
            cols = grid.cols(),
            "Loaded grid"
        );

        self.grids
            .write()
            .await
            .insert(name.to_string(), grid.clone());

        Ok(grid)
    }

    /// Names of grids already loaded.
    pub async fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self.grids.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a grid name is configured.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }
}
