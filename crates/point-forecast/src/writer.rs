//! Baking forecast datasets to disk.
//!
//! Writes the layout the query side reads back: coordinate arrays and
//! timestamp arrays as JSON, rasters as raw little-endian `f32`. Rasters are
//! usually cropped to a sub-region of the source model domain first.

use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::error::{ForecastError, Result};
use crate::raster::{encode_f32_le, RasterShape};

/// Format of baked timestamps: nanosecond precision, no zone designator.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

/// Crop every timestep of a raster to `rows` x `cols`.
///
/// Returns the cropped values in archive order and their shape.
pub fn crop_raster(
    data: &[f32],
    shape: &RasterShape,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Result<(Vec<f32>, RasterShape)> {
    if rows.start >= rows.end || cols.start >= cols.end {
        return Err(ForecastError::invalid_grid(format!(
            "empty crop {:?} x {:?}",
            rows, cols
        )));
    }
    if rows.end > shape.rows || cols.end > shape.cols {
        return Err(ForecastError::IndexOutOfRange {
            row: rows.end - 1,
            col: cols.end - 1,
            rows: shape.rows,
            cols: shape.cols,
        });
    }

    let expected = shape
        .len()
        .ok_or_else(|| ForecastError::invalid_grid(format!("raster shape {} overflows", shape)))?;
    if data.len() < expected {
        return Err(ForecastError::BufferTooShort {
            expected,
            actual: data.len(),
        });
    }

    let cropped = RasterShape::new(rows.len(), cols.len(), shape.time_steps);
    let step = shape.rows * shape.cols;
    let mut out = Vec::with_capacity(rows.len() * cols.len() * shape.time_steps);

    for t in 0..shape.time_steps {
        for row in rows.clone() {
            let start = t * step + row * shape.cols;
            out.extend_from_slice(&data[start + cols.start..start + cols.end]);
        }
    }

    Ok((out, cropped))
}

/// Writes dataset files below one directory.
pub struct DatasetWriter {
    dir: PathBuf,
}

impl DatasetWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a coordinate array as a JSON list.
    pub async fn write_coordinates(&self, name: &str, values: &[f64]) -> Result<u64> {
        let json = serde_json::to_vec(values)?;
        self.write(name, &json).await
    }

    /// Write raster values as little-endian `f32`, checking the length
    /// against the shape.
    pub async fn write_raster(&self, name: &str, shape: &RasterShape, values: &[f32]) -> Result<u64> {
        let expected = shape
            .len()
            .ok_or_else(|| ForecastError::invalid_grid(format!("raster shape {} overflows", shape)))?;
        if values.len() != expected {
            return Err(ForecastError::invalid_grid(format!(
                "raster '{}' has {} values, shape {} expects {}",
                name,
                values.len(),
                shape,
                expected
            )));
        }

        self.write(name, &encode_f32_le(values)).await
    }

    /// Write timestamps as a JSON list of zone-less strings.
    pub async fn write_timestamps(&self, name: &str, times: &[NaiveDateTime]) -> Result<u64> {
        let formatted: Vec<String> = times
            .iter()
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .collect();
        let json = serde_json::to_vec(&formatted)?;
        self.write(name, &json).await
    }

    #[instrument(skip(self, bytes), fields(dir = %self.dir.display()))]
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<u64> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ForecastError::unavailable(self.dir.display().to_string(), e))?;

        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ForecastError::unavailable(name, e))?;

        debug!(path = %path.display(), "Wrote dataset file");
        info!(resource = %name, size = bytes.len(), "Baked resource");
        Ok(bytes.len() as u64)
    }
}
