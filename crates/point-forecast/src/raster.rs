//! Flat multi-timestep raster archives.
//!
//! An archive is a contiguous run of little-endian `f32` values laid out
//! time-major, then row-major:
//!
//! ```text
//! index = t * (rows * cols) + row * cols + col
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Geometry of a raster archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterShape {
    pub rows: usize,
    pub cols: usize,
    pub time_steps: usize,
}

impl RasterShape {
    pub fn new(rows: usize, cols: usize, time_steps: usize) -> Self {
        Self {
            rows,
            cols,
            time_steps,
        }
    }

    /// Number of values in one timestep.
    pub fn values_per_step(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    /// Number of values in the whole archive.
    pub fn len(&self) -> Option<usize> {
        self.values_per_step()?.checked_mul(self.time_steps)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Flat offset of a sample, or `None` if any index is out of range.
    pub fn offset(&self, t: usize, row: usize, col: usize) -> Option<usize> {
        if t >= self.time_steps || row >= self.rows || col >= self.cols {
            return None;
        }
        self.values_per_step()?
            .checked_mul(t)?
            .checked_add(row * self.cols + col)
    }

    /// Number of bytes in an encoded archive.
    pub fn byte_len(&self) -> Option<usize> {
        self.len()?.checked_mul(std::mem::size_of::<f32>())
    }
}

impl std::fmt::Display for RasterShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.time_steps, self.rows, self.cols)
    }
}

/// Decode little-endian `f32` values.
pub fn decode_f32_le(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(ForecastError::unavailable(
            "raster",
            format!("{} bytes is not a whole number of f32 values", bytes.len()),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encode values as little-endian `f32` bytes.
pub fn encode_f32_le(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Expected archive length, failing on overflow.
fn required_len(shape: &RasterShape) -> Result<usize> {
    shape.len().ok_or_else(|| {
        ForecastError::invalid_grid(format!("raster shape {} overflows", shape))
    })
}

/// Values of one grid cell across every timestep.
///
/// Fails instead of reading past the buffer: `IndexOutOfRange` for a cell
/// outside the geometry, `BufferTooShort` when the buffer holds fewer than
/// `rows * cols * time_steps` values.
pub fn extract_series(
    buffer: &[f32],
    row: usize,
    col: usize,
    shape: &RasterShape,
) -> Result<Vec<f32>> {
    if row >= shape.rows || col >= shape.cols {
        return Err(ForecastError::IndexOutOfRange {
            row,
            col,
            rows: shape.rows,
            cols: shape.cols,
        });
    }

    let expected = required_len(shape)?;
    if buffer.len() < expected {
        return Err(ForecastError::BufferTooShort {
            expected,
            actual: buffer.len(),
        });
    }

    let step = shape.rows * shape.cols;
    let base = row * shape.cols + col;
    Ok((0..shape.time_steps)
        .map(|t| buffer[t * step + base])
        .collect())
}

/// A decoded raster archive for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub name: String,
    pub shape: RasterShape,
    data: Vec<f32>,
}

impl Raster {
    /// Wrap decoded values, requiring exactly `shape.len()` of them.
    pub fn new(name: impl Into<String>, shape: RasterShape, data: Vec<f32>) -> Result<Self> {
        let name = name.into();
        let expected = required_len(&shape)?;

        if data.len() < expected {
            return Err(ForecastError::BufferTooShort {
                expected,
                actual: data.len(),
            });
        }
        if data.len() > expected {
            return Err(ForecastError::invalid_grid(format!(
                "raster '{}' holds {} values, shape {} expects {}",
                name,
                data.len(),
                shape,
                expected
            )));
        }

        Ok(Self { name, shape, data })
    }

    /// Decode little-endian bytes into a raster.
    pub fn from_le_bytes(name: impl Into<String>, shape: RasterShape, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let data = decode_f32_le(bytes).map_err(|e| match e {
            ForecastError::DataUnavailable { reason, .. } => {
                ForecastError::unavailable(name.clone(), reason)
            }
            other => other,
        })?;
        Self::new(name, shape, data)
    }

    /// Values of one cell across all timesteps.
    pub fn series(&self, row: usize, col: usize) -> Result<Vec<f32>> {
        extract_series(&self.data, row, col, &self.shape)
    }

    /// Single sample.
    pub fn get(&self, t: usize, row: usize, col: usize) -> Option<f32> {
        self.shape
            .offset(t, row, col)
            .and_then(|i| self.data.get(i).copied())
    }

    /// All values in archive order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}
