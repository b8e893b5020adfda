//! Graph construction errors.
//!
//! `DataIntegrityError` describes a single malformed input record. The
//! builder recovers from these by skipping the record and reporting it;
//! only `BuildError` aborts a build.

use crate::domain::{DayType, ServiceTime, StopId, TripId};

/// A malformed or inconsistent timetable record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataIntegrityError {
    /// The stop table lists the same id twice; the later row is ignored
    #[error("duplicate stop id {stop}")]
    DuplicateStop { stop: StopId },

    /// A trip visits a stop that is not in the stop table
    #[error("trip {trip} references unknown stop {stop}")]
    UnknownStop { trip: TripId, stop: StopId },

    /// A trip has fewer than two visits and cannot yield a connection
    #[error("trip {trip} has {count} stop visit(s), need at least 2")]
    TooFewVisits { trip: TripId, count: usize },

    /// Two visits of one trip share a sequence number, so their order is unknown
    #[error("trip {trip} repeats stop sequence {sequence}")]
    DuplicateSequence { trip: TripId, sequence: u32 },

    /// A connection arrives before it departs
    #[error("trip {trip} arrives at {to} ({arrival}) before leaving {from} ({departure})")]
    NegativeDuration {
        trip: TripId,
        from: StopId,
        to: StopId,
        departure: ServiceTime,
        arrival: ServiceTime,
    },

    /// A trip names a service id with no calendar row
    #[error("service {service_id} has no calendar entry")]
    UnknownService { service_id: String },

    /// The trip table lists the same trip id twice; the later row is ignored
    #[error("duplicate trip id {trip}")]
    DuplicateTrip { trip: TripId },

    /// A footpath names a stop that is not in the stop table
    #[error("footpath {from} -> {to} references an unknown stop")]
    UnknownFootpathStop { from: StopId, to: StopId },
}

/// A `ScheduleGraph` invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two stops share an id
    #[error("duplicate stop id {0}")]
    DuplicateStop(StopId),

    /// A connection or footpath endpoint is missing from the stop set
    #[error("unknown stop {0}")]
    UnknownStop(StopId),

    /// A connection has arrival < departure
    #[error("connection {from} -> {to} on trip {trip} has negative duration")]
    NegativeDuration {
        trip: TripId,
        from: StopId,
        to: StopId,
    },

    /// More stops than a `StopIdx` can address
    #[error("too many stops: {0}")]
    TooManyStops(usize),

    #[error("too many connections: {0}")]
    TooManyConnections(usize),
}

/// A build that produced no usable graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// After skipping malformed data nothing was left to route on
    #[error("no connections for day type {0}")]
    NoConnections(DayType),

    /// The assembled graph failed validation
    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),
}
