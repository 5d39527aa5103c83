//! Time utilities: timezone-aware hour/weekday classification.
//!
//! All analysis is done in the user's local timezone; storage stays UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Hour at or after which a session start counts as late-night.
pub const LATE_NIGHT_START_HOUR: u32 = 22;
/// Hour before which a session start still counts as late-night.
pub const LATE_NIGHT_END_HOUR: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("invalid local datetime '{0}': {1}")]
    InvalidLocalDatetime(String, String),
    #[error("ambiguous or invalid local time (DST?): {0} {1}")]
    AmbiguousLocalTime(String, String),
}

/// Parse an IANA timezone like "America/Chicago".
pub fn parse_timezone(tz: &str) -> Result<Tz, TimeError> {
    tz.parse()
        .map_err(|_| TimeError::InvalidTimezone(tz.to_string()))
}

/// Parse a local datetime like "2026-03-10 09:30" in an IANA tz, returning UTC.
pub fn parse_local_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>, TimeError> {
    let tz = parse_timezone(tz)?;

    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| TimeError::InvalidLocalDatetime(local.to_string(), e.to_string()))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| TimeError::AmbiguousLocalTime(local.to_string(), tz.to_string()))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Hour of day (0-23) in the given timezone.
pub fn local_hour(dt: DateTime<Utc>, tz: Tz) -> u32 {
    dt.with_timezone(&tz).hour()
}

/// Weekday as 0=Sunday .. 6=Saturday in the given timezone.
pub fn local_weekday(dt: DateTime<Utc>, tz: Tz) -> u32 {
    dt.with_timezone(&tz).weekday().num_days_from_sunday()
}

/// Calendar date in the given timezone; used for per-day grouping.
pub fn local_date(dt: DateTime<Utc>, tz: Tz) -> NaiveDate {
    dt.with_timezone(&tz).date_naive()
}

/// Late-night window: 22:00-05:59 local.
pub fn is_late_night_hour(hour: u32) -> bool {
    hour >= LATE_NIGHT_START_HOUR || hour < LATE_NIGHT_END_HOUR
}

pub fn is_late_night(dt: DateTime<Utc>, tz: Tz) -> bool {
    is_late_night_hour(local_hour(dt, tz))
}

/// Saturday or Sunday in the given timezone.
pub fn is_weekend(dt: DateTime<Utc>, tz: Tz) -> bool {
    matches!(local_weekday(dt, tz), 0 | 6)
}

/// English name for a 0=Sunday weekday index.
pub fn day_name(day: u32) -> &'static str {
    match day {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "unknown",
    }
}
