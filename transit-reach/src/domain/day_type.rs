//! Calendar day-types.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown day-type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid day type {0:?}: expected weekday, saturday or sunday")]
pub struct InvalidDayType(String);

/// The calendar category that selects which trips run.
///
/// Each day-type has its own independent `ScheduleGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    /// A typical Monday to Friday.
    Weekday,
    Saturday,
    Sunday,
}

impl DayType {
    /// Every day-type, in a fixed order.
    pub const ALL: [DayType; 3] = [DayType::Weekday, DayType::Saturday, DayType::Sunday];

    /// Returns the lowercase name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::Saturday => "saturday",
            DayType::Sunday => "sunday",
        }
    }

    /// The day-type a given weekday falls into.
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat => DayType::Saturday,
            Weekday::Sun => DayType::Sunday,
            _ => DayType::Weekday,
        }
    }

    /// The day-type of a calendar date. Public holidays are not considered.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_weekday(date.weekday())
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayType {
    type Err = InvalidDayType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekday" => Ok(DayType::Weekday),
            "saturday" => Ok(DayType::Saturday),
            "sunday" => Ok(DayType::Sunday),
            _ => Err(InvalidDayType(s.to_string())),
        }
    }
}
