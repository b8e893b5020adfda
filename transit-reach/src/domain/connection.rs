//! Timed movements between stops.

use serde::Serialize;

use super::{RouteLabel, ServiceTime, StopId, TripId};

/// One scheduled, timed movement between two consecutive stops of a trip.
///
/// Both instants are service-day times, so a connection that crosses
/// midnight simply has `arrival > 86400`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub from: StopId,
    pub to: StopId,
    pub departure: ServiceTime,
    pub arrival: ServiceTime,
    pub trip: TripId,
    pub route: RouteLabel,
}

impl Connection {
    /// Travel time in seconds. Negative only for malformed data, which the
    /// graph rejects.
    pub fn duration_secs(&self) -> i64 {
        self.arrival.secs_since(self.departure)
    }
}

/// A time-independent walking link between two stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footpath {
    pub from: StopId,
    pub to: StopId,
    pub duration_secs: u32,
}
