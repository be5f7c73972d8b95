//! Common test fixtures for point forecast tests.

/// The small worked example: a 3x2 grid with one two-step variable.
pub mod scenario {
    pub const LATITUDES: [f64; 3] = [10.0, 20.0, 30.0];
    pub const LONGITUDES: [f64; 2] = [100.0, 110.0];

    /// Variable `T`, time-major then row-major.
    pub const T_VALUES: [f32; 12] = [
        0.0, 1.0, 2.0, 3.0, 4.0, 5.0, // t = 0
        10.0, 11.0, 12.0, 13.0, 14.0, 15.0, // t = 1
    ];

    pub const ROWS: usize = 3;
    pub const COLS: usize = 2;
    pub const TIME_STEPS: usize = 2;

    /// Query point and its expected nearest cell.
    pub const QUERY: (f64, f64) = (21.0, 101.0);
    pub const EXPECTED_INDEX: (usize, usize) = (1, 0);
    pub const EXPECTED_SERIES: [f32; 2] = [2.0, 12.0];
}

/// Dimensions and resource names of the DWD health forecast archives.
pub mod dwd {
    pub const LAT_COUNT: usize = 425;
    pub const LON_COUNT: usize = 700;
    pub const TIME_STEPS: usize = 72;

    pub const LATITUDES: &str = "latitudes_uv_and_pt.json";
    pub const LONGITUDES: &str = "longitudes_uv_and_pt.json";
    pub const GFT: &str = "data_gft.bin";
    pub const UVI: &str = "data_uvi.bin";
    pub const UVH: &str = "data_uvh.bin";
    pub const GFT_TIMES: &str = "gft_forecast_times.json";
    pub const UVI_TIMES: &str = "uvi_forecast_times.json";
}

/// Timestamp strings in the shapes seen in baked timelines.
pub mod timestamps {
    /// Nanosecond precision, no zone designator.
    pub const NANOS: &str = "2024-05-01T12:00:00.123456789";

    /// Millisecond precision, no zone designator.
    pub const MILLIS: &str = "2024-05-01T12:00:00.123";

    /// Whole seconds.
    pub const SECONDS: &str = "2024-05-01T12:00:00";

    /// Explicit UTC designator.
    pub const ZULU: &str = "2024-05-01T12:00:00.123456Z";

    /// Explicit offset.
    pub const OFFSET: &str = "2024-05-01T14:00:00+02:00";

    pub const MALFORMED: [&str; 4] = ["", "not a time", "2024-13-01T00:00:00", "2024-05-01"];
}

/// Query points that exercise distinct corners of the globe.
pub mod points {
    pub const BERLIN: (f64, f64) = (52.52, 13.40);
    pub const NORTH_POLE: (f64, f64) = (90.0, 0.0);
    pub const ANTIMERIDIAN: (f64, f64) = (0.0, 179.9);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_is_consistent() {
        assert_eq!(scenario::LATITUDES.len(), scenario::ROWS);
        assert_eq!(scenario::LONGITUDES.len(), scenario::COLS);
        assert_eq!(
            scenario::T_VALUES.len(),
            scenario::ROWS * scenario::COLS * scenario::TIME_STEPS
        );

        let (row, col) = scenario::EXPECTED_INDEX;
        let step = scenario::ROWS * scenario::COLS;
        let series: Vec<f32> = (0..scenario::TIME_STEPS)
            .map(|t| scenario::T_VALUES[t * step + row * scenario::COLS + col])
            .collect();
        assert_eq!(series, scenario::EXPECTED_SERIES);
    }

    #[test]
    fn test_dwd_archive_size() {
        let bytes = dwd::LAT_COUNT * dwd::LON_COUNT * dwd::TIME_STEPS * 4;
        assert_eq!(bytes, 85_680_000);
    }
}
