/// Time range expressions: relative offsets, absolute timestamps and compound ranges
///
/// Grammar, loosely:
///
/// ```text
/// input  := range ( "/" range )*
/// range  := point | point " to " point
/// point  := "now" | <int>("m"|"h"|"d"|"w") | absolute
/// ```
///
/// A bare point covers one hour either side of it. Absolute times are read in
/// the local timezone.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use tracing::debug;

use crate::core::{TimeRange, TrackerError, TrackerResult};

const RANGE_SEPARATOR: char = '/';
const RANGE_JOINER: &str = " to ";
const POINT_HALF_WIDTH_HOURS: i64 = 1;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const MONTH_DAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const TIME_FORMAT: &str = "%H:%M";

pub struct TimeExpressionParser {
    now: DateTime<Local>,
}

impl TimeExpressionParser {
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    /// Parser with a fixed notion of "now", for reproducible relative times
    pub fn at(now: DateTime<Local>) -> Self {
        Self { now }
    }

    /// Parse every `/`-separated range, in input order; any failure fails the whole input
    pub fn parse_ranges(&self, input: &str) -> TrackerResult<Vec<TimeRange>> {
        let mut ranges = Vec::new();
        for expression in input.split(RANGE_SEPARATOR) {
            let range = self.parse_range(expression).ok_or_else(|| {
                TrackerError::UnparseableTimeExpression {
                    expression: expression.trim().to_string(),
                }
            })?;
            debug!("Parsed '{}' as {} to {}", expression.trim(), range.start, range.end);
            ranges.push(range);
        }
        Ok(ranges)
    }

    fn parse_range(&self, expression: &str) -> Option<TimeRange> {
        let expression = expression.trim();
        match expression.split_once(RANGE_JOINER) {
            None => {
                let point = self.parse_point(expression)?;
                let half = ChronoDuration::hours(POINT_HALF_WIDTH_HOURS);
                Some(TimeRange::new(
                    (point - half).timestamp(),
                    (point + half).timestamp(),
                ))
            }
            Some((start, end)) => {
                if end.contains(RANGE_JOINER) {
                    return None;
                }
                let start = self.parse_point(start)?;
                let end = self.parse_point(end)?;
                Some(TimeRange::new(start.timestamp(), end.timestamp()))
            }
        }
    }

    /// A single time point, relative forms first
    pub fn parse_point(&self, token: &str) -> Option<DateTime<Local>> {
        let token = token.trim();
        self.parse_relative(token).or_else(|| self.parse_absolute(token))
    }

    fn parse_relative(&self, token: &str) -> Option<DateTime<Local>> {
        let token = token.to_ascii_lowercase();
        if token == "now" {
            return Some(self.now);
        }

        let unit = token.chars().last()?;
        let value: i64 = token[..token.len() - unit.len_utf8()].parse().ok()?;
        if value < 0 || token.starts_with('+') {
            return None;
        }
        let offset = match unit {
            'm' => ChronoDuration::try_minutes(value)?,
            'h' => ChronoDuration::try_hours(value)?,
            'd' => ChronoDuration::try_days(value)?,
            'w' => ChronoDuration::try_weeks(value)?,
            _ => return None,
        };
        self.now.checked_sub_signed(offset)
    }

    fn parse_absolute(&self, token: &str) -> Option<DateTime<Local>> {
        let naive = DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(token, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(token, DATE_FORMAT)
                    .ok()
                    .map(|date| date.and_time(NaiveTime::MIN))
            })
            .or_else(|| {
                let with_year = format!("{}-{}", self.now.year(), token);
                NaiveDateTime::parse_from_str(&with_year, MONTH_DAY_TIME_FORMAT).ok()
            })
            .or_else(|| {
                NaiveTime::parse_from_str(token, TIME_FORMAT)
                    .ok()
                    .map(|time| self.now.date_naive().and_time(time))
            })?;

        // Nonexistent local times (DST gaps) are rejected, ambiguous ones take the earlier
        Local.from_local_datetime(&naive).earliest()
    }
}

impl Default for TimeExpressionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse ranges relative to the current wall-clock time
pub fn parse_time_ranges(input: &str) -> TrackerResult<Vec<TimeRange>> {
    TimeExpressionParser::new().parse_ranges(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3600;
    const DAY: i64 = 24 * HOUR;

    fn fixed_now() -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    fn local_ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> i64 {
        let naive = NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap().timestamp()
    }

    #[test]
    fn test_relative_to_now() {
        let now = fixed_now();
        let ranges = TimeExpressionParser::at(now).parse_ranges("2h to now").unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, now.timestamp() - 2 * HOUR);
        assert_eq!(ranges[0].end, now.timestamp());
    }

    #[test]
    fn test_two_ranges_in_input_order() {
        let now = fixed_now();
        let ranges = TimeExpressionParser::at(now)
            .parse_ranges("1w to 6d/3d to 2d")
            .unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], TimeRange::new(now.timestamp() - 7 * DAY, now.timestamp() - 6 * DAY));
        assert_eq!(ranges[1], TimeRange::new(now.timestamp() - 3 * DAY, now.timestamp() - 2 * DAY));
    }

    #[test]
    fn test_out_of_order_bounds_swapped() {
        let now = fixed_now();
        let ranges = TimeExpressionParser::at(now).parse_ranges("now to 30m").unwrap();
        assert_eq!(ranges[0].start, now.timestamp() - 30 * 60);
        assert_eq!(ranges[0].end, now.timestamp());
    }

    #[test]
    fn test_bare_point_expands_one_hour_each_side() {
        let now = fixed_now();
        let ranges = TimeExpressionParser::at(now).parse_ranges("1d").unwrap();
        let point = now.timestamp() - DAY;
        assert_eq!(ranges, vec![TimeRange::new(point - HOUR, point + HOUR)]);
    }

    #[test]
    fn test_parse_twice_is_stable() {
        let first = parse_time_ranges("1d").unwrap();
        let second = parse_time_ranges("1d").unwrap();
        assert!((first[0].start - second[0].start).abs() <= 1);
        assert!((first[0].end - second[0].end).abs() <= 1);
    }

    #[test]
    fn test_absolute_formats_in_priority_order() {
        let parser = TimeExpressionParser::at(fixed_now());
        let point = |s: &str| parser.parse_point(s).map(|dt| dt.timestamp());

        assert_eq!(point("2025-02-28 18:30:15"), Some(local_ts(2025, 2, 28, 18, 30, 15)));
        assert_eq!(point("2025-02-28 18:30"), Some(local_ts(2025, 2, 28, 18, 30, 0)));
        assert_eq!(point("2025-02-28"), Some(local_ts(2025, 2, 28, 0, 0, 0)));
        // month-day takes the current year, time-only takes today
        assert_eq!(point("02-28 18:30"), Some(local_ts(2025, 2, 28, 18, 30, 0)));
        assert_eq!(point("09:15"), Some(local_ts(2025, 3, 1, 9, 15, 0)));
    }

    #[test]
    fn test_absolute_range_pair() {
        let ranges = TimeExpressionParser::at(fixed_now())
            .parse_ranges("02-28 18:30 to 03-01 18:30")
            .unwrap();
        assert_eq!(
            ranges,
            vec![TimeRange::new(local_ts(2025, 2, 28, 18, 30, 0), local_ts(2025, 3, 1, 18, 30, 0))]
        );
    }

    #[test]
    fn test_relative_units_and_case() {
        let now = fixed_now();
        let parser = TimeExpressionParser::at(now);
        let point = |s: &str| parser.parse_point(s).map(|dt| dt.timestamp());
        assert_eq!(point("30m"), Some(now.timestamp() - 30 * 60));
        assert_eq!(point("2H"), Some(now.timestamp() - 2 * HOUR));
        assert_eq!(point("1W"), Some(now.timestamp() - 7 * DAY));
        assert_eq!(point("NOW"), Some(now.timestamp()));
        assert_eq!(point("0d"), Some(now.timestamp()));
    }

    #[test]
    fn test_rejects_garbage_tokens() {
        let parser = TimeExpressionParser::at(fixed_now());
        for bad in ["", "d", "5y", "1dd", "-1d", "+1d", "yesterday", "25:00", "2025-13-01", "1.5h"] {
            assert!(parser.parse_point(bad).is_none(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_one_bad_range_fails_everything() {
        let parser = TimeExpressionParser::at(fixed_now());
        let err = parser.parse_ranges("1d to now/soonish to now/2d").unwrap_err();
        match err {
            TrackerError::UnparseableTimeExpression { expression } => {
                assert_eq!(expression, "soonish to now")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_double_joiner_and_empty_input_rejected() {
        let parser = TimeExpressionParser::at(fixed_now());
        assert!(parser.parse_ranges("3d to 2d to 1d").is_err());
        assert!(parser.parse_ranges("").is_err());
        assert!(parser.parse_ranges("1d/").is_err());
    }
}
