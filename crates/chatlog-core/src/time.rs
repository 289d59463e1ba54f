//! Time Points and Calendar Periods
//!
//! Every line in a log carries a `TimePoint` (milliseconds since the Unix
//! epoch, UTC). Every log covers a `TimePeriod`, a half-open range
//! `[begin, end)` that is normally one calendar month.
//!
//! ## Example
//! ```ignore
//! let september = TimePeriod::month(2018, 9)?;
//! assert!(september.contains(september.begin()));
//! assert!(!september.contains(september.end()));
//! assert_eq!(september.to_string(), "2018-09");
//! ```

use std::fmt;

use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Milliseconds since the Unix epoch (UTC)
pub type TimePoint = i64;

/// A half-open time range `[begin, end)` covered by one log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTimePeriod")]
pub struct TimePeriod {
    begin: TimePoint,
    end: TimePoint,
}

/// Unchecked serde form; deserialization goes through `TimePeriod::new`
#[derive(Deserialize)]
struct RawTimePeriod {
    begin: TimePoint,
    end: TimePoint,
}

impl TryFrom<RawTimePeriod> for TimePeriod {
    type Error = Error;

    fn try_from(raw: RawTimePeriod) -> Result<Self> {
        Self::new(raw.begin, raw.end)
    }
}

impl TimePeriod {
    /// Encoded size in a log file: begin and end as 64-bit integers
    pub const ENCODED_LEN: usize = 16;

    /// Create a period from explicit bounds
    pub fn new(begin: TimePoint, end: TimePoint) -> Result<Self> {
        if begin > end {
            return Err(Error::invariant(format!(
                "time period begins at {} after it ends at {}",
                begin, end
            )));
        }
        Ok(Self { begin, end })
    }

    /// The calendar month `year-month` in UTC
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let invalid = || Error::invariant(format!("invalid calendar month {}-{:02}", year, month));
        let (next_year, next_month) = next_month(year, month).ok_or_else(invalid)?;

        let begin = month_start(year, month).ok_or_else(invalid)?;
        let end = month_start(next_year, next_month).ok_or_else(invalid)?;
        Ok(Self { begin, end })
    }

    /// The calendar month containing `time`
    pub fn month_containing(time: TimePoint) -> Result<Self> {
        let dt = Utc
            .timestamp_millis_opt(time)
            .single()
            .ok_or_else(|| Error::invariant(format!("time point {} out of range", time)))?;
        Self::month(dt.year(), dt.month())
    }

    pub fn begin(&self) -> TimePoint {
        self.begin
    }

    pub fn end(&self) -> TimePoint {
        self.end
    }

    /// True if `time` lies inside `[begin, end)`
    pub fn contains(&self, time: TimePoint) -> bool {
        self.begin <= time && time < self.end
    }

    /// If this period is exactly one calendar month, its `(year, month)`
    pub fn as_month(&self) -> Option<(i32, u32)> {
        let dt = Utc.timestamp_millis_opt(self.begin).single()?;
        let (year, month) = (dt.year(), dt.month());
        let (next_year, next_month) = next_month(year, month)?;

        let exact = month_start(year, month)? == self.begin
            && month_start(next_year, next_month)? == self.end;
        exact.then_some((year, month))
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_month() {
            Some((year, month)) => write!(f, "{:04}-{:02}", year, month),
            None => write!(f, "{}-{}", self.begin, self.end),
        }
    }
}

fn next_month(year: i32, month: u32) -> Option<(i32, u32)> {
    if month == 12 {
        Some((year.checked_add(1)?, 1))
    } else {
        Some((year, month + 1))
    }
}

fn month_start(year: i32, month: u32) -> Option<TimePoint> {
    let naive = chrono::NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive).timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let period = TimePeriod::month(2018, 9).unwrap();
        // 2018-09-01T00:00:00Z and 2018-10-01T00:00:00Z
        assert_eq!(period.begin(), 1_535_760_000_000);
        assert_eq!(period.end(), 1_538_352_000_000);
    }

    #[test]
    fn test_december_rolls_over_year() {
        let period = TimePeriod::month(2019, 12).unwrap();
        let january = TimePeriod::month(2020, 1).unwrap();
        assert_eq!(period.end(), january.begin());
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(
            TimePeriod::month(2018, 13),
            Err(Error::InvariantViolation(_))
        ));
        assert!(TimePeriod::month(2018, 0).is_err());
    }

    #[test]
    fn test_last_representable_year_does_not_overflow() {
        assert!(matches!(
            TimePeriod::month(i32::MAX, 12),
            Err(Error::InvariantViolation(_))
        ));
        assert!(TimePeriod::month(i32::MIN, 1).is_err());
    }

    #[test]
    fn test_serde_goes_through_new() {
        let period: TimePeriod = serde_json::from_str(r#"{"begin":5,"end":10}"#).unwrap();
        assert_eq!(period, TimePeriod::new(5, 10).unwrap());

        let json = serde_json::to_string(&TimePeriod::month(2018, 9).unwrap()).unwrap();
        assert_eq!(
            serde_json::from_str::<TimePeriod>(&json).unwrap(),
            TimePeriod::month(2018, 9).unwrap()
        );

        assert!(serde_json::from_str::<TimePeriod>(r#"{"begin":10,"end":5}"#).is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(TimePeriod::new(10, 5).is_err());
        assert!(TimePeriod::new(5, 5).is_ok());
    }

    #[test]
    fn test_contains_is_half_open() {
        let period = TimePeriod::new(100, 200).unwrap();
        assert!(period.contains(100));
        assert!(period.contains(199));
        assert!(!period.contains(200));
        assert!(!period.contains(99));
    }

    #[test]
    fn test_month_containing() {
        let september = TimePeriod::month(2018, 9).unwrap();
        let mid = september.begin() + 15 * 24 * 3600 * 1000;
        assert_eq!(TimePeriod::month_containing(mid).unwrap(), september);
        assert_eq!(
            TimePeriod::month_containing(september.end()).unwrap(),
            TimePeriod::month(2018, 10).unwrap()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TimePeriod::month(2018, 9).unwrap().to_string(), "2018-09");
        assert_eq!(TimePeriod::new(1, 2).unwrap().to_string(), "1-2");
        assert_eq!(TimePeriod::month(2018, 9).unwrap().as_month(), Some((2018, 9)));
    }
}
