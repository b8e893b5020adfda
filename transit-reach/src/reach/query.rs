//! Reachability query parameters.

use serde::{Deserialize, Serialize};

use crate::domain::{ServiceTime, StopId};

use super::search::SearchError;

/// Which trip changes must respect the minimum transfer buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferScope {
    /// Any change to a different trip needs the buffer.
    #[default]
    EveryTripChange,
    /// Only changes to a different route need the buffer. Changing between
    /// two trips of the same route is treated like a cross-platform change.
    RouteChangeOnly,
}

/// Minimum time a rider needs to change vehicles.
///
/// Staying on the same trip never needs a buffer, and neither does the first
/// boarding at the origin or boarding after a footpath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransferRule {
    pub min_transfer_secs: u32,
    pub scope: BufferScope,
}

impl TransferRule {
    /// A rule that buffers every trip change.
    pub fn new(min_transfer_secs: u32) -> Self {
        Self {
            min_transfer_secs,
            scope: BufferScope::EveryTripChange,
        }
    }

    /// Restrict the buffer to route changes.
    pub fn route_change_only(mut self) -> Self {
        self.scope = BufferScope::RouteChangeOnly;
        self
    }
}

/// One reachability question: from `origin`, leaving at `departure`, which
/// stops can be reached within `budget_secs`?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachQuery {
    pub origin: StopId,
    pub departure: ServiceTime,
    /// Must be positive. Kept signed so bad input can be reported instead
    /// of wrapping.
    pub budget_secs: i64,
    pub transfer: TransferRule,
    /// Report the origin itself as a zero-minute entry.
    pub include_origin: bool,
}

impl ReachQuery {
    /// Create a query with no transfer buffer.
    pub fn new(origin: impl Into<StopId>, departure: ServiceTime, budget_secs: i64) -> Self {
        Self {
            origin: origin.into(),
            departure,
            budget_secs,
            transfer: TransferRule::default(),
            include_origin: false,
        }
    }

    pub fn with_min_transfer_secs(mut self, secs: u32) -> Self {
        self.transfer.min_transfer_secs = secs;
        self
    }

    pub fn with_transfer_rule(mut self, rule: TransferRule) -> Self {
        self.transfer = rule;
        self
    }

    pub fn including_origin(mut self, include: bool) -> Self {
        self.include_origin = include;
        self
    }

    /// Check the numeric parameters.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.budget_secs <= 0 {
            return Err(SearchError::InvalidParameter(format!(
                "time budget must be positive, got {} seconds",
                self.budget_secs
            )));
        }
        if u32::try_from(self.budget_secs).is_err() {
            return Err(SearchError::InvalidParameter(format!(
                "time budget of {} seconds is too large",
                self.budget_secs
            )));
        }
        Ok(())
    }

    /// Latest arrival instant that still counts as reachable.
    ///
    /// Only meaningful after `validate` succeeded.
    pub fn deadline(&self) -> ServiceTime {
        let budget = u32::try_from(self.budget_secs).unwrap_or(0);
        self.departure.saturating_add_secs(budget)
    }
}
