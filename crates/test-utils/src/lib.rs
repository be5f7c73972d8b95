//! Shared test utilities for the point forecast workspace.
//!
//! - Baked dataset lookup and scratch directories ([`paths`])
//! - Raster, axis and timestamp generators ([`generators`])
//! - Fixtures for the worked scenario, the DWD archive layout and timestamp
//!   shapes ([`fixtures`])
//!
//! ```ignore
//! use test_utils::{create_time_series_raster, scenario};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a baked file, or skip the current test when it is not present.
///
/// ```ignore
/// let gft = require_baked_file!("data_gft.bin");
/// ```
#[macro_export]
macro_rules! require_baked_file {
    ($name:expr) => {{
        match $crate::find_baked_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: baked file '{}' not found (set FORECAST_TEST_DATA to its directory)",
                    $name
                );
                return;
            }
        }
    }};
}

/// Assert two numbers differ by at most `epsilon` (compared as `f64`).
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `{} ≈ {}` (|diff| = {} > {})",
                left, right, diff, epsilon
            );
        }
    }};
}
