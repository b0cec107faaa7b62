//! Service-day time handling.
//!
//! Schedules express times as seconds since midnight of the service day.
//! Values past 24:00:00 are legal: a trip leaving at 23:50 and arriving
//! at 00:20 the next morning is stored as arriving at 24:20:00.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A point in time on the service day, in seconds since midnight.
///
/// # Examples
///
/// ```
/// use transit_router::domain::Time;
///
/// let time = Time::parse_hms("08:30:00").unwrap();
/// assert_eq!(time.seconds(), 8 * 3600 + 30 * 60);
/// assert_eq!(time.to_string(), "08:30:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "TimeRepr", into = "i32")]
pub struct Time(i32);

impl Time {
    /// Sentinel used for "not reached yet" in depart-at searches.
    pub const MAX: Time = Time(i32::MAX);

    /// Sentinel used for "not reached yet" in arrive-by searches.
    pub const MIN: Time = Time(i32::MIN);

    /// Create a time from seconds since midnight.
    pub const fn from_seconds(seconds: i32) -> Self {
        Self(seconds)
    }

    /// Create a time from hours, minutes and seconds.
    pub const fn from_hms(hours: i32, minutes: i32, seconds: i32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse `HH:MM:SS` or `HH:MM`.
    ///
    /// Hours may exceed 23 for trips running past midnight.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::Time;
    ///
    /// assert!(Time::parse_hms("00:00:00").is_ok());
    /// assert!(Time::parse_hms("25:10:00").is_ok());
    /// assert!(Time::parse_hms("7:05").is_ok());
    ///
    /// assert!(Time::parse_hms("12:60:00").is_err());
    /// assert!(Time::parse_hms("12-30").is_err());
    /// ```
    pub fn parse_hms(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');

        let hours = parts
            .next()
            .filter(|h| !h.is_empty() && h.len() <= 3)
            .and_then(parse_digits)
            .ok_or_else(|| TimeError::new("invalid hour digits"))?;

        let minutes = parts
            .next()
            .filter(|m| m.len() == 2)
            .and_then(parse_digits)
            .ok_or_else(|| TimeError::new("expected HH:MM or HH:MM:SS format"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds = match parts.next() {
            None => 0,
            Some(sec) => {
                let sec = Some(sec)
                    .filter(|s| s.len() == 2)
                    .and_then(parse_digits)
                    .ok_or_else(|| TimeError::new("invalid second digits"))?;
                if sec > 59 {
                    return Err(TimeError::new("second must be 0-59"));
                }
                sec
            }
        };

        if parts.next().is_some() {
            return Err(TimeError::new("too many components"));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Returns the number of seconds since midnight.
    pub const fn seconds(&self) -> i32 {
        self.0
    }

    /// Returns the signed number of seconds from `earlier` to `self`.
    pub fn duration_since(&self, earlier: Time) -> i32 {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns this time as an offset from midnight.
    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.0))
    }
}

impl Add<i32> for Time {
    type Output = Self;

    fn add(self, rhs: i32) -> Self::Output {
        Time(self.0.saturating_add(rhs))
    }
}

impl Sub<i32> for Time {
    type Output = Self;

    fn sub(self, rhs: i32) -> Self::Output {
        Time(self.0.saturating_sub(rhs))
    }
}

impl From<Time> for i32 {
    fn from(time: Time) -> Self {
        time.0
    }
}

/// Wire form accepted when deserializing: raw seconds or `"HH:MM:SS"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimeRepr {
    Seconds(i32),
    Text(String),
}

impl TryFrom<TimeRepr> for Time {
    type Error = TimeError;

    fn try_from(repr: TimeRepr) -> Result<Self, Self::Error> {
        match repr {
            TimeRepr::Seconds(seconds) => Ok(Time(seconds)),
            TimeRepr::Text(text) => Time::parse_hms(&text),
        }
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time({self})")
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Time::MAX || *self == Time::MIN {
            return f.write_str("--:--:--");
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{:02}:{:02}:{:02}",
            abs / 3600,
            (abs / 60) % 60,
            abs % 60
        )
    }
}

/// Parse a run of ASCII digits.
fn parse_digits(s: &str) -> Option<i32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
