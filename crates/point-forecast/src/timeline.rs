//! Forecast timeline normalization.
//!
//! Timestamp arrays are written by the baking step as ISO-8601-like strings,
//! often with nanosecond precision and no zone designator
//! (`2024-05-01T10:00:00.000000000`). Normalization truncates the fraction to
//! milliseconds and resolves the zone according to [`ZoneHandling`].

use std::borrow::Cow;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// How timestamps without a zone designator are interpreted.
///
/// Strings that carry `Z` or an explicit offset are honoured either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneHandling {
    /// Append `Z`, treating the timestamp as UTC.
    #[default]
    AppendUtc,
    /// Interpret the timestamp in the host's local zone.
    Local,
}

impl ZoneHandling {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "append_utc" | "utc" => Some(Self::AppendUtc),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Truncate the first fractional-seconds run of three or more digits to
/// exactly three. Shorter runs are left alone.
pub fn truncate_fraction(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();

    for (dot, _) in raw.match_indices('.') {
        let digits = bytes[dot + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 3 {
            let keep_end = dot + 4;
            let drop_end = dot + 1 + digits;
            let mut out = String::with_capacity(raw.len() - (drop_end - keep_end));
            out.push_str(&raw[..keep_end]);
            out.push_str(&raw[drop_end..]);
            return Cow::Owned(out);
        }
        if digits == 3 {
            return Cow::Borrowed(raw);
        }
    }

    Cow::Borrowed(raw)
}

/// Whether the time portion ends in `Z` or carries a `+hh:mm`/`-hh:mm` offset.
fn has_zone_designator(s: &str) -> bool {
    // Date part is `YYYY-MM-DD`; only look after the separator.
    let time = match s.get(11..) {
        Some(t) => t,
        None => return false,
    };
    time.ends_with('Z') || time.ends_with('z') || time.contains('+') || time.contains('-')
}

/// Converts raw timestamp strings into UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimelineNormalizer {
    zone: ZoneHandling,
}

impl TimelineNormalizer {
    pub fn new(zone: ZoneHandling) -> Self {
        Self { zone }
    }

    /// Normalizer that treats bare timestamps as UTC.
    pub fn utc() -> Self {
        Self::new(ZoneHandling::AppendUtc)
    }

    /// Normalizer that treats bare timestamps as host-local time.
    pub fn local() -> Self {
        Self::new(ZoneHandling::Local)
    }

    pub fn zone(&self) -> ZoneHandling {
        self.zone
    }

    /// Normalize one timestamp.
    pub fn normalize(&self, raw: &str) -> Result<DateTime<Utc>> {
        let trimmed = truncate_fraction(raw.trim());

        if has_zone_designator(&trimmed) {
            return parse_zoned(&trimmed).ok_or_else(|| ForecastError::malformed_timestamp(raw));
        }

        match self.zone {
            ZoneHandling::AppendUtc => {
                let suffixed = format!("{}Z", trimmed);
                parse_zoned(&suffixed).ok_or_else(|| ForecastError::malformed_timestamp(raw))
            }
            ZoneHandling::Local => {
                let naive =
                    parse_naive(&trimmed).ok_or_else(|| ForecastError::malformed_timestamp(raw))?;
                Local
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or_else(|| ForecastError::malformed_timestamp(raw))
            }
        }
    }

    /// Normalize a sequence, preserving order and count.
    pub fn normalize_all<S: AsRef<str>>(&self, raw: &[S]) -> Result<Vec<DateTime<Utc>>> {
        raw.iter().map(|s| self.normalize(s.as_ref())).collect()
    }
}

fn parse_zoned(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use test_utils::timestamps;

    #[test]
    fn test_truncate_fraction() {
        assert_eq!(
            truncate_fraction("2024-05-01T10:00:00.123456789"),
            "2024-05-01T10:00:00.123"
        );
        assert_eq!(
            truncate_fraction("2024-05-01T10:00:00.123456Z"),
            "2024-05-01T10:00:00.123Z"
        );
        assert_eq!(
            truncate_fraction("2024-05-01T10:00:00.123Z"),
            "2024-05-01T10:00:00.123Z"
        );
        assert_eq!(
            truncate_fraction("2024-05-01T10:00:00.5Z"),
            "2024-05-01T10:00:00.5Z"
        );
        assert_eq!(truncate_fraction("2024-05-01T10:00:00"), "2024-05-01T10:00:00");
    }

    #[test]
    fn test_truncation_drops_rather_than_rounds() {
        let n = TimelineNormalizer::utc();
        let dt = n.normalize("2024-05-01T10:00:00.999999Z").unwrap();
        assert_eq!(dt.second(), 0);
        assert_eq!(dt.timestamp_subsec_millis(), 999);
    }

    #[test]
    fn test_microseconds_equal_milliseconds() {
        let n = TimelineNormalizer::utc();
        let millis = n.normalize(timestamps::MILLIS).unwrap();
        assert_eq!(n.normalize(timestamps::ZULU).unwrap(), millis);
        assert_eq!(n.normalize(timestamps::NANOS).unwrap(), millis);
        assert_eq!(millis.timestamp_subsec_millis(), 123);
        assert_eq!(
            n.normalize(timestamps::SECONDS).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_append_utc_for_bare_timestamps() {
        let n = TimelineNormalizer::utc();
        let dt = n.normalize("2024-05-01T10:00:00.000000000").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_explicit_offset_honoured() {
        for n in [TimelineNormalizer::utc(), TimelineNormalizer::local()] {
            let dt = n.normalize(timestamps::OFFSET).unwrap();
            assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        }
    }

    #[test]
    fn test_local_zone_for_bare_timestamps() {
        let n = TimelineNormalizer::local();
        let dt = n.normalize("2024-05-01T10:00:00.000000").unwrap();
        let expected = Local
            .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(dt, expected);
    }

    #[test]
    fn test_space_separator() {
        let n = TimelineNormalizer::utc();
        let dt = n.normalize("2024-05-01 10:30:00").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_malformed() {
        let n = TimelineNormalizer::utc();
        let extra = ["2024-13-01T00:00:00Z", "2024-05-01T25:00:00"];
        for raw in timestamps::MALFORMED.iter().chain(&extra) {
            assert!(
                matches!(n.normalize(raw), Err(ForecastError::MalformedTimestamp(_))),
                "{:?} should be malformed",
                raw
            );
        }
    }

    #[test]
    fn test_normalize_all_preserves_order_and_duplicates() {
        let n = TimelineNormalizer::utc();
        let raw = [
            "2024-05-01T12:00:00.000000000",
            "2024-05-01T11:00:00.000000000",
            "2024-05-01T11:00:00.000000000",
        ];
        let times = n.normalize_all(&raw).unwrap();
        assert_eq!(times.len(), 3);
        assert_eq!(times[0].hour(), 12);
        assert_eq!(times[1], times[2]);
        assert_eq!(times[0].year(), 2024);
    }

    #[test]
    fn test_normalize_all_fails_fast() {
        let n = TimelineNormalizer::utc();
        let raw = vec!["2024-05-01T12:00:00".to_string(), "garbage".to_string()];
        assert!(n.normalize_all(&raw).is_err());
    }

    #[test]
    fn test_zone_handling_from_str() {
        assert_eq!(ZoneHandling::from_str("UTC"), Some(ZoneHandling::AppendUtc));
        assert_eq!(ZoneHandling::from_str("local"), Some(ZoneHandling::Local));
        assert_eq!(ZoneHandling::from_str("cet"), None);
    }
}
