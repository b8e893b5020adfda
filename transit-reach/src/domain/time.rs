//! Service-day time handling.
//!
//! Timetables express every instant as an offset from local midnight of the
//! service day. Trips that run past midnight keep counting, so "25:10:00" is
//! ten past one on the following morning. Instants are therefore plain
//! integers and never wrapped modulo a day.

use std::fmt;
use std::ops::Add;

use chrono::{NaiveTime, Timelike};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Largest hour accepted when parsing. Feeds rarely exceed 30.
const MAX_HOUR: u32 = 99;

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

/// An instant on a service day, in seconds since local midnight.
///
/// # Examples
///
/// ```
/// use transit_reach::domain::ServiceTime;
///
/// let t = ServiceTime::parse("25:10:00").unwrap();
/// assert_eq!(t.as_secs(), 25 * 3600 + 600);
/// assert!(t.is_past_midnight());
/// assert_eq!(t.to_string(), "25:10:00");
///
/// // "HH:MM" is accepted too
/// assert_eq!(ServiceTime::parse("09:00").unwrap(), ServiceTime::from_hms(9, 0, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: ServiceTime = ServiceTime(0);

    /// Create from a raw number of seconds since midnight.
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Create from hour, minute and second components. Hours may exceed 23.
    pub const fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        Self(hour * 3600 + minute * 60 + second)
    }

    /// Create from a wall-clock time of day.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }

    /// Parse `HH:MM` or `HH:MM:SS`.
    ///
    /// The hour may have one or two digits and may be 24 or more, as feeds
    /// use for trips that continue after midnight.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');

        let hour_str = parts.next().ok_or_else(|| TimeError::new("empty input"))?;
        if hour_str.is_empty() || hour_str.len() > 2 {
            return Err(TimeError::new("hour must have one or two digits"));
        }
        let hour = hour_str
            .bytes()
            .try_fold(0u32, |acc, b| {
                (b as char).to_digit(10).map(|d| acc * 10 + d)
            })
            .ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > MAX_HOUR {
            return Err(TimeError::new("hour out of range"));
        }

        let minute = parts
            .next()
            .ok_or_else(|| TimeError::new("expected HH:MM or HH:MM:SS format"))
            .and_then(|m| {
                parse_two_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute digits"))
            })?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = match parts.next() {
            None => 0,
            Some(sec) => parse_two_digits(sec.as_bytes())
                .ok_or_else(|| TimeError::new("invalid second digits"))?,
        };
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        if parts.next().is_some() {
            return Err(TimeError::new("too many components"));
        }

        Ok(Self::from_hms(hour, minute, second))
    }

    /// Returns the raw number of seconds since midnight.
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Hour component, possibly 24 or more.
    pub fn hour(self) -> u32 {
        self.0 / 3600
    }

    /// Minute component (0-59).
    pub fn minute(self) -> u32 {
        (self.0 % 3600) / 60
    }

    /// Second component (0-59).
    pub fn second(self) -> u32 {
        self.0 % 60
    }

    /// True if the instant falls after the end of the service day's calendar date.
    pub fn is_past_midnight(self) -> bool {
        self.0 >= SECONDS_PER_DAY
    }

    /// Signed number of seconds from `earlier` to `self`.
    pub fn secs_since(self, earlier: ServiceTime) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }

    /// Add seconds, returning `None` on overflow.
    pub fn checked_add_secs(self, secs: u32) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// Add seconds, clamping at the largest representable instant.
    pub fn saturating_add_secs(self, secs: u32) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl Add<u32> for ServiceTime {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        self.saturating_add_secs(rhs)
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl std::str::FromStr for ServiceTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ServiceTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for ServiceTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ServiceTimeVisitor)
    }
}

/// Accepts either seconds since midnight or a time string.
struct ServiceTimeVisitor;

impl Visitor<'_> for ServiceTimeVisitor {
    type Value = ServiceTime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("seconds since midnight or an HH:MM[:SS] string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        u32::try_from(v)
            .map(ServiceTime)
            .map_err(|_| E::custom("time out of range"))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u32::try_from(v)
            .map(ServiceTime)
            .map_err(|_| E::custom("time must be a non-negative number of seconds"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        ServiceTime::parse(v).map_err(E::custom)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display output parses back to the same instant
        #[test]
        fn display_parse_roundtrip(hour in 0u32..=MAX_HOUR, minute in 0u32..60, second in 0u32..60) {
            let t = ServiceTime::from_hms(hour, minute, second);
            prop_assert_eq!(ServiceTime::parse(&t.to_string()).unwrap(), t);
        }

        /// Components recombine to the raw value
        #[test]
        fn components_recombine(secs in 0u32..(MAX_HOUR * 3600)) {
            let t = ServiceTime::from_secs(secs);
            prop_assert_eq!(ServiceTime::from_hms(t.hour(), t.minute(), t.second()), t);
        }

        /// Ordering agrees with the signed difference
        #[test]
        fn ordering_consistent(a in 0u32..200_000, b in 0u32..200_000) {
            let (ta, tb) = (ServiceTime::from_secs(a), ServiceTime::from_secs(b));
            prop_assert_eq!(ta < tb, tb.secs_since(ta) > 0);
        }

        #[test]
        fn invalid_minute_rejected(hour in 0u32..24, minute in 60u32..100) {
            let s = format!("{:02}:{:02}", hour, minute);
            prop_assert!(ServiceTime::parse(&s).is_err());
        }
    }
}
