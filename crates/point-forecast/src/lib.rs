//! Point forecasts from pre-baked gridded rasters.
//!
//! Given a latitude/longitude query point, this crate finds the nearest
//! cell on each configured grid and extracts the full forecast time series
//! of every variable stored on that grid, aligned with a normalized
//! timeline.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use point_forecast::{ForecastConfig, ForecastService, QueryPoint, SourceSettings};
//!
//! let source = SourceSettings::from_env().build()?;
//! let service = ForecastService::new(ForecastConfig::dwd_health(), source)?;
//! let result = service.run_forecast(QueryPoint::new(52.52, 13.40)).await?;
//! for (time, value) in result.paired("GFT").unwrap_or_default() {
//!     println!("{} {}", time, value);
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod locator;
pub mod raster;
pub mod service;
pub mod source;
pub mod timeline;
pub mod types;
pub mod writer;

pub use catalog::GridCatalog;
pub use config::{ForecastConfig, GridConfig, SourceSettings, TimelineConfig, VariableConfig};
pub use error::{ForecastError, Result};
pub use locator::{haversine_angle, locate_great_circle, locate_per_axis, nearest_index};
pub use raster::{decode_f32_le, encode_f32_le, extract_series, Raster, RasterShape};
pub use service::{DataSummary, ForecastService};
pub use source::{HttpSource, MemorySource, ObjectStoreSource, ResourceSource};
pub use timeline::{TimelineNormalizer, ZoneHandling};
pub use types::{
    ForecastResult, Grid, GridMatch, MatchResult, NearestMetric, QueryPoint, VariableSeries,
};
pub use writer::{crop_raster, DatasetWriter};
