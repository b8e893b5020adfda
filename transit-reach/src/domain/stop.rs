//! Stops: fixed locations served by scheduled transit.

use serde::{Deserialize, Serialize};

use super::StopId;

/// A stop as it appears in the schedule graph.
///
/// Immutable once loaded; replaced only when a new graph is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Stop {
    /// Create a new stop.
    pub fn new(id: impl Into<StopId>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
        }
    }
}
