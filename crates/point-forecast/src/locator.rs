//! Nearest grid point search.
//!
//! Two strategies are provided and they are not interchangeable:
//!
//! - [`locate_per_axis`] picks the closest latitude and the closest
//!   longitude independently. Cheap, O(rows + cols).
//! - [`locate_great_circle`] scans every cell of the cross product and picks
//!   the one with the smallest haversine angle. O(rows * cols).
//!
//! On grids where the closest latitude/longitude combination is not the
//! globally closest cell the two return different indices. Each grid names
//! its strategy explicitly through [`NearestMetric`].

use crate::error::{ForecastError, Result};
use crate::types::{Grid, MatchResult, NearestMetric, QueryPoint};

/// Index of the value closest to `target`.
///
/// Ties resolve to the lowest index. Returns `None` when nothing compares,
/// i.e. for an empty slice or when every difference is NaN.
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut min_diff = f64::INFINITY;

    for (i, value) in values.iter().enumerate() {
        let diff = (value - target).abs();
        if diff < min_diff {
            min_diff = diff;
            best = Some(i);
        }
    }

    best
}

/// Closest latitude and closest longitude, searched independently.
pub fn locate_per_axis(grid: &Grid, point: QueryPoint) -> Result<MatchResult> {
    let lat_index = nearest_index(&grid.latitudes, point.lat).ok_or_else(|| {
        ForecastError::invalid_grid(format!(
            "no latitude in grid '{}' is comparable to {}",
            grid.name, point.lat
        ))
    })?;
    let lon_index = nearest_index(&grid.longitudes, point.lon).ok_or_else(|| {
        ForecastError::invalid_grid(format!(
            "no longitude in grid '{}' is comparable to {}",
            grid.name, point.lon
        ))
    })?;

    let distance = (grid.latitudes[lat_index] - point.lat).abs()
        + (grid.longitudes[lon_index] - point.lon).abs();

    Ok(MatchResult {
        lat_index,
        lon_index,
        distance,
    })
}

/// Central angle in radians between two points given in degrees.
pub fn haversine_angle(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push `a` marginally above 1 for antipodal points.
    2.0 * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Cell with the smallest haversine angle to `point`.
///
/// Iterates latitude-major; the first minimal cell wins ties.
pub fn locate_great_circle(grid: &Grid, point: QueryPoint) -> Result<MatchResult> {
    let mut best: Option<MatchResult> = None;
    let mut min_angle = f64::INFINITY;

    for (lat_index, &lat) in grid.latitudes.iter().enumerate() {
        for (lon_index, &lon) in grid.longitudes.iter().enumerate() {
            let angle = haversine_angle(point.lat, point.lon, lat, lon);
            if angle < min_angle {
                min_angle = angle;
                best = Some(MatchResult {
                    lat_index,
                    lon_index,
                    distance: angle,
                });
            }
        }
    }

    best.ok_or_else(|| {
        ForecastError::invalid_grid(format!(
            "no cell in grid '{}' is comparable to ({}, {})",
            grid.name, point.lat, point.lon
        ))
    })
}

impl NearestMetric {
    /// Run this strategy against a grid.
    pub fn locate(&self, grid: &Grid, point: QueryPoint) -> Result<MatchResult> {
        match self {
            Self::PerAxis => locate_per_axis(grid, point),
            Self::GreatCircle => locate_great_circle(grid, point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, create_regular_axis, points};

    #[test]
    fn test_nearest_index_basic() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(nearest_index(&values, 21.0), Some(1));
        assert_eq!(nearest_index(&values, -100.0), Some(0));
        assert_eq!(nearest_index(&values, 100.0), Some(2));
    }

    #[test]
    fn test_nearest_index_tie_prefers_lowest() {
        assert_eq!(nearest_index(&[10.0, 20.0], 15.0), Some(0));
        assert_eq!(nearest_index(&[5.0, 1.0, 5.0], 5.0), Some(0));
    }

    #[test]
    fn test_nearest_index_unsorted() {
        let values = [30.0, 10.0, 22.0, 20.0];
        assert_eq!(nearest_index(&values, 21.5), Some(2));
    }

    #[test]
    fn test_nearest_index_empty_and_nan() {
        assert_eq!(nearest_index(&[], 1.0), None);
        assert_eq!(nearest_index(&[1.0, 2.0], f64::NAN), None);
        assert_eq!(nearest_index(&[f64::NAN, 2.0], 1.0), Some(1));
    }

    #[test]
    fn test_nearest_index_is_minimal() {
        let values: Vec<f64> = (0..57).map(|i| ((i * 37) % 23) as f64 * 0.7 - 4.0).collect();
        for step in 0..40 {
            let target = step as f64 * 0.45 - 5.0;
            let i = nearest_index(&values, target).unwrap();
            let best = (values[i] - target).abs();
            for (j, v) in values.iter().enumerate() {
                let diff = (v - target).abs();
                assert!(best <= diff, "index {} beats {} for {}", j, i, target);
                if diff == best {
                    assert!(i <= j, "tie at {} should resolve to lowest index", j);
                }
            }
        }
    }

    #[test]
    fn test_per_axis_scenario() {
        let grid = Grid::new("gft", vec![10.0, 20.0, 30.0], vec![100.0, 110.0]).unwrap();
        let m = locate_per_axis(&grid, QueryPoint::new(21.0, 101.0)).unwrap();
        assert_eq!((m.lat_index, m.lon_index), (1, 0));
        assert_approx_eq!(m.distance, 2.0, 1e-12);
    }

    #[test]
    fn test_per_axis_nan_query_is_invalid_grid() {
        let grid = Grid::new("gft", vec![10.0], vec![100.0]).unwrap();
        let err = locate_per_axis(&grid, QueryPoint::new(f64::NAN, 100.0)).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidGrid(_)));
    }

    #[test]
    fn test_haversine_known_values() {
        assert_approx_eq!(haversine_angle(0.0, 0.0, 0.0, 0.0), 0.0, 1e-15);
        assert_approx_eq!(
            haversine_angle(0.0, 0.0, 0.0, 90.0),
            std::f64::consts::FRAC_PI_2,
            1e-12
        );
        assert_approx_eq!(
            haversine_angle(90.0, 0.0, -90.0, 0.0),
            std::f64::consts::PI,
            1e-12
        );
        assert_approx_eq!(
            haversine_angle(0.0, 0.0, 0.0, 180.0),
            std::f64::consts::PI,
            1e-12
        );
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = haversine_angle(48.1, 11.6, 52.5, 13.4);
        let b = haversine_angle(52.5, 13.4, 48.1, 11.6);
        assert_approx_eq!(a, b, 1e-12);
        // Munich to Berlin is roughly 500 km
        assert!((a * crate::types::EARTH_RADIUS_KM - 504.0).abs() < 10.0);
    }

    #[test]
    fn test_great_circle_is_global_minimum() {
        let grid = Grid::new(
            "uv",
            create_regular_axis(40.0, 0.75, 12),
            create_regular_axis(-5.0, 1.25, 15),
        )
        .unwrap();

        let queries = [
            QueryPoint::new(48.16, 11.65),
            QueryPoint::new(39.0, -7.0),
            QueryPoint::new(60.0, 20.0),
            QueryPoint::new(44.3, 2.2),
            QueryPoint::new(points::BERLIN.0, points::BERLIN.1),
            QueryPoint::new(points::NORTH_POLE.0, points::NORTH_POLE.1),
            QueryPoint::new(points::ANTIMERIDIAN.0, points::ANTIMERIDIAN.1),
        ];

        for point in queries {
            let m = locate_great_circle(&grid, point).unwrap();
            for (i, &lat) in grid.latitudes.iter().enumerate() {
                for (j, &lon) in grid.longitudes.iter().enumerate() {
                    let angle = haversine_angle(point.lat, point.lon, lat, lon);
                    assert!(
                        m.distance <= angle,
                        "cell ({}, {}) closer than match for {:?}",
                        i,
                        j,
                        point
                    );
                }
            }
        }
    }

    #[test]
    fn test_great_circle_tie_prefers_first_cell() {
        // Both longitudes are equidistant from 0; the first one wins.
        let grid = Grid::new("g", vec![0.0], vec![-1.0, 1.0]).unwrap();
        let m = locate_great_circle(&grid, QueryPoint::new(0.0, 0.0)).unwrap();
        assert_eq!((m.lat_index, m.lon_index), (0, 0));
    }

    #[test]
    fn test_strategies_can_disagree() {
        // Latitude 40 is closer along the axis, but the 20 degree longitude
        // offset shrinks more at latitude 61, making that cell closer.
        let grid = Grid::new("offset", vec![40.0, 61.0], vec![20.0]).unwrap();
        let point = QueryPoint::new(50.0, 0.0);

        let axis = NearestMetric::PerAxis.locate(&grid, point).unwrap();
        let gc = NearestMetric::GreatCircle.locate(&grid, point).unwrap();

        assert_eq!((axis.lat_index, axis.lon_index), (0, 0));
        assert_eq!((gc.lat_index, gc.lon_index), (1, 0));
    }

    #[test]
    fn test_great_circle_distance_non_negative() {
        let grid = Grid::new("g", vec![10.0, 20.0], vec![100.0, 110.0]).unwrap();
        let m = locate_great_circle(&grid, QueryPoint::new(20.0, 110.0)).unwrap();
        assert_eq!((m.lat_index, m.lon_index), (1, 1));
        assert!(m.distance >= 0.0);
        assert!(m.distance < 1e-12);
    }
}
