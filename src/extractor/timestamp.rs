use chrono::format::ParseErrorKind;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, ParseError, TimeZone, Utc};
use filetime::FileTime;
use serde::{Deserialize, Serialize};

/// How naive manifest dates are mapped onto the Unix timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// Interpret dates in the process's local time zone.
    #[default]
    Local,
    Utc,
}

/// A point in time as whole Unix seconds. Sub-second precision in a parsed
/// value is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
}

impl Timestamp {
    pub fn to_file_time(self) -> FileTime {
        FileTime::from_unix_time(self.seconds, 0)
    }

    fn from_datetime<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self {
            seconds: dt.timestamp(),
        }
    }
}

/// Parse `raw` with a strftime-style `format`.
///
/// Formats without any time fields are accepted and yield midnight, so a
/// manifest of plain dates works with e.g. `%Y-%m-%d`.
pub fn parse_naive(raw: &str, format: &str) -> Result<NaiveDateTime, ParseError> {
    match NaiveDateTime::parse_from_str(raw, format) {
        Ok(dt) => Ok(dt),
        Err(err) if err.kind() == ParseErrorKind::NotEnough => NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or(err),
        Err(err) => Err(err),
    }
}

/// Map a naive datetime to an instant.
///
/// In local mode an ambiguous time (clocks turned back) resolves to the
/// earlier instant, and a time skipped by a forward transition is moved one
/// hour later, the way `mktime` normalises it.
pub fn resolve(naive: NaiveDateTime, mode: TimeZoneMode) -> Option<Timestamp> {
    match mode {
        TimeZoneMode::Utc => Some(Timestamp::from_datetime(Utc.from_utc_datetime(&naive))),
        TimeZoneMode::Local => {
            let resolved = match Local.from_local_datetime(&naive).earliest() {
                Some(dt) => Some(dt),
                None => naive
                    .checked_add_signed(Duration::hours(1))
                    .and_then(|shifted| Local.from_local_datetime(&shifted).earliest()),
            };
            resolved.map(Timestamp::from_datetime)
        }
    }
}

/// Parse and resolve in one step; `None` if the value does not fit `format`.
pub fn parse_timestamp(raw: &str, format: &str, mode: TimeZoneMode) -> Option<Timestamp> {
    parse_naive(raw, format)
        .ok()
        .and_then(|naive| resolve(naive, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DATE_FORMAT;

    #[test]
    fn test_parse_default_format() {
        let naive = parse_naive("2020-01-01T12:34:56", DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(naive.to_string(), "2020-01-01 12:34:56");
    }

    #[test]
    fn test_date_only_format_is_midnight() {
        let naive = parse_naive("2021-03-04", "%Y-%m-%d").unwrap();
        assert_eq!(naive.to_string(), "2021-03-04 00:00:00");
    }

    #[test]
    fn test_mismatched_value_fails() {
        assert!(parse_naive("2020/01/01 00:00", DEFAULT_DATE_FORMAT).is_err());
        assert!(parse_naive("not a date", "%Y-%m-%d").is_err());
        assert!(parse_timestamp("2020-13-01T00:00:00", DEFAULT_DATE_FORMAT, TimeZoneMode::Utc).is_none());
    }

    #[test]
    fn test_utc_resolution() {
        let ts = parse_timestamp("2020-01-01T00:00:00", DEFAULT_DATE_FORMAT, TimeZoneMode::Utc).unwrap();
        assert_eq!(ts, Timestamp { seconds: 1_577_836_800 });

        let ts = parse_timestamp("2020-06-01T00:00:00", DEFAULT_DATE_FORMAT, TimeZoneMode::Utc).unwrap();
        assert_eq!(ts.seconds, 1_590_969_600);
    }

    #[test]
    fn test_fractional_seconds_are_truncated() {
        let ts = parse_timestamp(
            "2020-01-01 00:00:00.75",
            "%Y-%m-%d %H:%M:%S%.f",
            TimeZoneMode::Utc,
        )
        .unwrap();
        assert_eq!(ts.seconds, 1_577_836_800);
        assert_eq!(ts.to_file_time(), FileTime::from_unix_time(1_577_836_800, 0));
    }

    #[test]
    fn test_local_resolution_matches_local_offset() {
        let naive = parse_naive("2020-01-01T00:00:00", DEFAULT_DATE_FORMAT).unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp());

        let ts = resolve(naive, TimeZoneMode::Local).map(|t| t.seconds);
        assert_eq!(ts, expected);
    }

    #[test]
    fn test_timezone_mode_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            tz: TimeZoneMode,
        }

        let parsed: Wrapper = toml::from_str("tz = \"utc\"").unwrap();
        assert_eq!(parsed.tz, TimeZoneMode::Utc);
        assert_eq!(TimeZoneMode::default(), TimeZoneMode::Local);
    }
}
