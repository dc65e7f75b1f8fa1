//! `TimeWindow` — the day/hour/timezone condition from spec §3.3.
//!
//! Matching semantics: inclusive start, exclusive end (`[start, end)`), with
//! the request timestamp converted into the window's timezone (UTC if
//! unset) before the day and hour checks run.

use crate::weekday::Weekday;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// An `HH:MM` hour-of-day bound, stored as the raw string so validation and
/// matching can share one parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    /// Inclusive lower bound, `HH:MM` 24-hour.
    pub start: String,
    /// Exclusive upper bound, `HH:MM` 24-hour.
    pub end: String,
}

/// The day/hour/timezone condition attached to a rule (or an auto-approve
/// sub-condition).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    /// Weekdays the window applies to. Empty ⇒ any day.
    #[serde(default)]
    pub days: HashSet<Weekday>,
    /// Hour-of-day bound. Absent ⇒ any hour.
    #[serde(default)]
    pub hours: Option<HourRange>,
    /// IANA timezone name. Absent ⇒ UTC.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// A malformed `TimeWindow` caught at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindowError {
    /// An `hours.start` or `hours.end` value is not `HH:MM` in range.
    MalformedHour(String),
    /// `timezone` is not a recognized IANA zone name.
    UnknownTimezone(String),
}

impl fmt::Display for TimeWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHour(s) => write!(f, "malformed hour '{s}', expected HH:MM"),
            Self::UnknownTimezone(s) => write!(f, "unknown timezone '{s}'"),
        }
    }
}

impl std::error::Error for TimeWindowError {}

/// Parse an `HH:MM` string into minutes-since-midnight, enforcing the
/// `^([01][0-9]|2[0-3]):([0-5][0-9])$` shape from spec §4.1.
fn parse_hhmm(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    let hh = &s[0..2];
    let mm = &s[3..5];
    if !hh.bytes().all(|b| b.is_ascii_digit()) || !mm.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let h: u32 = hh.parse().ok()?;
    let m: u32 = mm.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

impl TimeWindow {
    /// Validate the weekdays (always well-formed via the typed `Weekday`
    /// set), the hour bound format, and the timezone name.
    pub fn validate(&self) -> Result<(), TimeWindowError> {
        if let Some(hours) = &self.hours {
            if parse_hhmm(&hours.start).is_none() {
                return Err(TimeWindowError::MalformedHour(hours.start.clone()));
            }
            if parse_hhmm(&hours.end).is_none() {
                return Err(TimeWindowError::MalformedHour(hours.end.clone()));
            }
        }
        if let Some(tz) = &self.timezone {
            if Tz::from_str(tz).is_err() {
                return Err(TimeWindowError::UnknownTimezone(tz.clone()));
            }
        }
        Ok(())
    }

    /// Resolve the configured timezone, defaulting to UTC. Returns `None`
    /// if an (already-validated-away) unknown zone slipped through — the
    /// evaluator treats that as "did not match" rather than panicking.
    fn resolve_tz(&self) -> Option<Tz> {
        match &self.timezone {
            None => Some(Tz::UTC),
            Some(tz) => Tz::from_str(tz).ok(),
        }
    }

    /// Does `instant` fall within this window?
    ///
    /// Conservative on any internal failure (malformed timezone that should
    /// have been rejected at validation time): returns `false` rather than
    /// propagating an error, per spec §4.2 "Failure semantics".
    #[must_use]
    pub fn matches(&self, instant: DateTime<Utc>) -> bool {
        let Some(tz) = self.resolve_tz() else {
            return false;
        };
        let local = instant.with_timezone(&tz);

        if !self.days.is_empty() && !self.days.contains(&Weekday::from(local.weekday())) {
            return false;
        }

        if let Some(hours) = &self.hours {
            let (Some(start_m), Some(end_m)) = (parse_hhmm(&hours.start), parse_hhmm(&hours.end))
            else {
                return false;
            };
            let now_m = local.hour() * 60 + local.minute();
            if !(start_m <= now_m && now_m < end_m) {
                return false;
            }
        }

        true
    }

    /// True if every field is at its wildcard/default value.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.days.is_empty() && self.hours.is_none() && self.timezone.is_none()
    }
}

/// Construct a fixed UTC instant from a date and `HH:MM:SS` for tests.
#[cfg(test)]
pub(crate) fn utc_ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("valid date")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_matches_anything() {
        let w = TimeWindow::default();
        assert!(w.matches(utc_ymd_hms(2026, 1, 14, 3, 0, 0)));
    }

    #[test]
    fn hour_boundary_is_half_open() {
        let w = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "09:00".into(), end: "17:00".into() }),
            timezone: None,
        };
        assert!(w.matches(utc_ymd_hms(2026, 1, 14, 9, 0, 0)));
        assert!(w.matches(utc_ymd_hms(2026, 1, 14, 16, 59, 59)));
        assert!(!w.matches(utc_ymd_hms(2026, 1, 14, 17, 0, 0)));
        assert!(!w.matches(utc_ymd_hms(2026, 1, 14, 8, 59, 59)));
    }

    #[test]
    fn timezone_conversion_shifts_the_window() {
        // 2026-01-14T15:30:00Z is 2026-01-14T10:30:00-05:00 (EST, Jan = standard time).
        let w = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "09:00".into(), end: "17:00".into() }),
            timezone: Some("America/New_York".into()),
        };
        assert!(w.matches(utc_ymd_hms(2026, 1, 14, 15, 30, 0)));
        // 22:30Z is 17:30 EST, past the window.
        assert!(!w.matches(utc_ymd_hms(2026, 1, 14, 22, 30, 0)));
    }

    #[test]
    fn day_of_week_filters() {
        let mut days = HashSet::new();
        days.insert(Weekday::Tuesday);
        let w = TimeWindow { days, hours: None, timezone: None };
        // 2026-01-14 is a Wednesday.
        assert!(!w.matches(utc_ymd_hms(2026, 1, 14, 10, 0, 0)));
        // 2026-01-13 is a Tuesday.
        assert!(w.matches(utc_ymd_hms(2026, 1, 13, 10, 0, 0)));
    }

    #[test]
    fn validate_rejects_malformed_hours_and_unknown_timezone() {
        let bad_hour = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "9:00".into(), end: "17:00".into() }),
            timezone: None,
        };
        assert!(bad_hour.validate().is_err());

        let bad_tz = TimeWindow { days: HashSet::new(), hours: None, timezone: Some("Mars/Olympus".into()) };
        assert!(bad_tz.validate().is_err());

        let ok = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "09:00".into(), end: "17:00".into() }),
            timezone: Some("UTC".into()),
        };
        assert!(ok.validate().is_ok());
    }
}
