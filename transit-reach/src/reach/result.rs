//! Output of a reachability search.

use serde::Serialize;

use crate::domain::{DayType, ServiceTime, Stop, StopId};

/// A stop reached within the budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachedStop {
    pub stop_id: StopId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub arrival: ServiceTime,
    pub elapsed_secs: u32,
    /// `elapsed_secs / 60`, unrounded.
    pub elapsed_minutes: f64,
    pub transfers: u32,
}

impl ReachedStop {
    pub(crate) fn new(stop: &Stop, departure: ServiceTime, arrival: ServiceTime, transfers: u32) -> Self {
        let elapsed_secs = arrival.as_secs().saturating_sub(departure.as_secs());
        Self {
            stop_id: stop.id.clone(),
            name: stop.name.clone(),
            lat: stop.lat,
            lon: stop.lon,
            arrival,
            elapsed_secs,
            elapsed_minutes: f64::from(elapsed_secs) / 60.0,
            transfers,
        }
    }
}

/// Every stop reachable from one origin, ordered by elapsed time then stop id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachabilityResult {
    pub origin: Stop,
    pub departure: ServiceTime,
    pub budget_secs: u32,
    pub day_type: DayType,
    pub entries: Vec<ReachedStop>,
    /// Number of stops finalized by the search, including the origin.
    pub stops_settled: usize,
}

impl ReachabilityResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry for a stop.
    pub fn get(&self, stop_id: &StopId) -> Option<&ReachedStop> {
        self.entries.iter().find(|e| &e.stop_id == stop_id)
    }

    /// The budget in whole minutes, rounded up.
    pub fn budget_minutes(&self) -> u32 {
        self.budget_secs.div_ceil(60)
    }
}
