//! Normalized timetable tables.
//!
//! These are the records the graph builder consumes. Producing them from a
//! raw feed (download, unzip, CSV validation) happens upstream, and reading
//! them from disk is the caller's business; this module only defines their
//! shape.

use serde::{Deserialize, Serialize};

use crate::domain::{DayType, ServiceTime, StopId, TripId};

/// A row of the stop table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub stop_id: StopId,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

/// A row of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: Option<String>,
}

/// A row of the trip table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: TripId,
    pub route_id: String,
    pub service_id: String,
}

/// One timed visit of a trip to a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopVisit {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub stop_sequence: u32,
    pub arrival_time: ServiceTime,
    pub departure_time: ServiceTime,
}

/// Weekly operating pattern of a service id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceCalendar {
    pub service_id: String,
    #[serde(default)]
    pub monday: bool,
    #[serde(default)]
    pub tuesday: bool,
    #[serde(default)]
    pub wednesday: bool,
    #[serde(default)]
    pub thursday: bool,
    #[serde(default)]
    pub friday: bool,
    #[serde(default)]
    pub saturday: bool,
    #[serde(default)]
    pub sunday: bool,
}

impl ServiceCalendar {
    /// Whether the service runs on the given day-type.
    ///
    /// A service counts as a weekday service if it runs on any of Monday to
    /// Friday, so mixed patterns land in every day-type they touch.
    pub fn is_active(&self, day_type: DayType) -> bool {
        match day_type {
            DayType::Weekday => {
                self.monday || self.tuesday || self.wednesday || self.thursday || self.friday
            }
            DayType::Saturday => self.saturday,
            DayType::Sunday => self.sunday,
        }
    }
}

/// A walking transfer between two stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootpathRecord {
    pub from_stop_id: StopId,
    pub to_stop_id: StopId,
    /// Walking time in seconds. Falls back to the builder's default when absent.
    #[serde(default)]
    pub min_transfer_time: Option<u32>,
}

/// The complete set of normalized tables for one feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timetable {
    pub stops: Vec<StopRecord>,
    #[serde(default)]
    pub routes: Vec<RouteRecord>,
    pub trips: Vec<TripRecord>,
    pub stop_visits: Vec<StopVisit>,
    pub calendars: Vec<ServiceCalendar>,
    #[serde(default)]
    pub footpaths: Vec<FootpathRecord>,
}
