//! Error types for point forecast extraction.

use thiserror::Error;

/// Errors that can occur while locating grid points and extracting series.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// A resource could not be fetched or parsed.
    #[error("data unavailable for '{resource}': {reason}")]
    DataUnavailable { resource: String, reason: String },

    /// A grid is empty or inconsistent with the variables bound to it.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// A row/column index lies outside the raster geometry.
    #[error("index ({row}, {col}) is outside raster geometry {rows}x{cols}")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A raster buffer holds fewer values than its geometry requires.
    #[error("raster buffer too short: expected {expected} values, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    /// A timestamp string could not be parsed.
    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// The forecast configuration is invalid.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// A background task failed to complete.
    #[error("internal error: {0}")]
    Internal(String),

    /// A forecast query failed; wraps the first error encountered.
    #[error("forecast query failed: {source}")]
    QueryFailed {
        #[source]
        source: Box<ForecastError>,
    },
}

impl ForecastError {
    /// Create a DataUnavailable error.
    pub fn unavailable(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create a MalformedTimestamp error.
    pub fn malformed_timestamp(raw: impl Into<String>) -> Self {
        Self::MalformedTimestamp(raw.into())
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Wrap an error as an aggregated query failure.
    ///
    /// Already-aggregated errors are returned unchanged.
    pub fn query_failed(err: ForecastError) -> Self {
        match err {
            Self::QueryFailed { .. } => err,
            other => Self::QueryFailed {
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, looking through query aggregation.
    pub fn root_cause(&self) -> &ForecastError {
        match self {
            Self::QueryFailed { source } => source.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        Self::unavailable("io", err)
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        Self::unavailable("json", err)
    }
}

impl From<serde_yaml::Error> for ForecastError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Result type for point forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failed_does_not_nest() {
        let inner = ForecastError::invalid_grid("empty latitudes");
        let once = ForecastError::query_failed(inner);
        let twice = ForecastError::query_failed(once);

        match &twice {
            ForecastError::QueryFailed { source } => {
                assert!(matches!(**source, ForecastError::InvalidGrid(_)));
            }
            other => panic!("expected QueryFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_root_cause() {
        let err = ForecastError::query_failed(ForecastError::BufferTooShort {
            expected: 8,
            actual: 6,
        });
        assert!(matches!(
            err.root_cause(),
            ForecastError::BufferTooShort {
                expected: 8,
                actual: 6
            }
        ));
    }

    #[test]
    fn test_display_messages() {
        let err = ForecastError::unavailable("data_gft.bin", "not found");
        assert_eq!(
            err.to_string(),
            "data unavailable for 'data_gft.bin': not found"
        );

        let err = ForecastError::IndexOutOfRange {
            row: 3,
            col: 0,
            rows: 3,
            cols: 2,
        };
        assert_eq!(
            err.to_string(),
            "index (3, 0) is outside raster geometry 3x2"
        );
    }
}
