//! Domain types for the reachability engine.
//!
//! Identifiers, service-day instants, day-types and the stop/connection
//! records that make up a schedule graph.

mod connection;
mod day_type;
mod ids;
mod stop;
mod time;

pub use connection::{Connection, Footpath};
pub use day_type::{DayType, InvalidDayType};
pub use ids::{RouteLabel, StopId, StopIdx, TripId, TripIdx};
pub use stop::Stop;
pub use time::{SECONDS_PER_DAY, ServiceTime, TimeError};
