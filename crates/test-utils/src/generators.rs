//! Test data generators for synthetic forecast archives.
//!
//! Values follow predictable patterns so tests can check that the right
//! sample was read without keeping lookup tables around.

use chrono::{Duration, NaiveDate};

/// Format of baked timestamps: nanosecond precision, no zone designator.
pub const BAKED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

/// Creates a time-major raster with self-describing values.
///
/// Each sample is `t * 10000 + row * 100 + col`, so any extracted value
/// identifies the timestep and cell it came from (for rows/cols < 100).
///
/// # Example
///
/// ```
/// use test_utils::create_time_series_raster;
///
/// let data = create_time_series_raster(3, 2, 2);
/// assert_eq!(data.len(), 12);
/// assert_eq!(data[0], 0.0);       // t=0, row=0, col=0
/// assert_eq!(data[3], 101.0);     // t=0, row=1, col=1
/// assert_eq!(data[6], 10000.0);   // t=1, row=0, col=0
/// ```
pub fn create_time_series_raster(rows: usize, cols: usize, time_steps: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(rows * cols * time_steps);
    for t in 0..time_steps {
        for row in 0..rows {
            for col in 0..cols {
                data.push((t * 10000 + row * 100 + col) as f32);
            }
        }
    }
    data
}

/// Creates an evenly spaced coordinate axis.
///
/// ```
/// use test_utils::create_regular_axis;
///
/// assert_eq!(create_regular_axis(10.0, 5.0, 3), vec![10.0, 15.0, 20.0]);
/// ```
pub fn create_regular_axis(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Creates a raster where every sample of a timestep has the same value.
pub fn create_constant_steps(rows: usize, cols: usize, values: &[f32]) -> Vec<f32> {
    values
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(rows * cols))
        .collect()
}

/// Creates hourly zone-less timestamp strings in the baked format.
///
/// ```
/// use test_utils::create_hourly_timestamps;
///
/// let times = create_hourly_timestamps("2024-05-01", 22, 3);
/// assert_eq!(times[0], "2024-05-01T22:00:00.000000000");
/// assert_eq!(times[2], "2024-05-02T00:00:00.000000000");
/// ```
///
/// # Panics
///
/// Panics if `date` is not `YYYY-MM-DD` or `start_hour` is not a valid hour.
pub fn create_hourly_timestamps(date: &str, start_hour: u32, count: usize) -> Vec<String> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap_or_else(|e| panic!("invalid date '{}' (expected YYYY-MM-DD): {}", date, e));
    let start = day
        .and_hms_opt(start_hour, 0, 0)
        .unwrap_or_else(|| panic!("invalid start hour {}", start_hour));

    (0..count as i64)
        .map(|i| {
            (start + Duration::hours(i))
                .format(BAKED_TIMESTAMP_FORMAT)
                .to_string()
        })
        .collect()
}
