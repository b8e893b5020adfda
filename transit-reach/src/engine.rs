//! Query facade over the published graphs.
//!
//! `Engine` is what a request-handling layer holds: it resolves the
//! day-type to a graph once per request, applies configured defaults and
//! limits, and reports every failure as a classified `ReachError`.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::{DayType, ServiceTime, Stop, StopId};
use crate::error::ReachError;
use crate::graph::{GraphStore, RefreshSummary};
use crate::reach::{CancelFlag, ReachQuery, ReachabilityResult, SearchError, search_with_cancel};
use crate::timeline::{Timeline, build_timeline};
use crate::timetable::Timetable;

/// A reachability request as it arrives from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachRequest {
    pub origin: StopId,
    pub departure: ServiceTime,
    pub day_type: DayType,
    pub budget_minutes: i64,
    /// Falls back to the configured default step.
    pub step_minutes: Option<i64>,
}

impl ReachRequest {
    pub fn new(
        origin: impl Into<StopId>,
        departure: ServiceTime,
        day_type: DayType,
        budget_minutes: i64,
    ) -> Self {
        Self {
            origin: origin.into(),
            departure,
            day_type,
            budget_minutes,
            step_minutes: None,
        }
    }

    /// A request leaving at a local wall-clock instant. The day-type comes
    /// from the date, the departure from the time of day.
    pub fn at(origin: impl Into<StopId>, when: NaiveDateTime, budget_minutes: i64) -> Self {
        Self::new(
            origin,
            ServiceTime::from_naive_time(when.time()),
            DayType::from_date(when.date()),
            budget_minutes,
        )
    }

    pub fn with_step_minutes(mut self, step: i64) -> Self {
        self.step_minutes = Some(step);
        self
    }
}

/// Entry point for reachability queries.
#[derive(Clone)]
pub struct Engine {
    store: GraphStore,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: GraphStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rebuild and publish graphs from new timetable data.
    pub async fn refresh(&self, timetable: Arc<Timetable>) -> Result<RefreshSummary, ReachError> {
        let summary = self
            .store
            .refresh(timetable, self.config.default_footpath_secs)
            .await?;
        Ok(summary)
    }

    /// Every stop reachable within the request's budget.
    pub fn reachability(&self, request: &ReachRequest) -> Result<ReachabilityResult, ReachError> {
        self.reachability_with_cancel(request, &CancelFlag::new())
    }

    /// Like `reachability`, abandoning the search once `cancel` is set.
    pub fn reachability_with_cancel(
        &self,
        request: &ReachRequest,
        cancel: &CancelFlag,
    ) -> Result<ReachabilityResult, ReachError> {
        if request.budget_minutes > i64::from(self.config.max_budget_minutes) {
            return Err(ReachError::InvalidRequest(format!(
                "time budget of {} minutes exceeds the maximum of {}",
                request.budget_minutes, self.config.max_budget_minutes
            )));
        }

        let graph = self.store.get(request.day_type)?;
        let query = ReachQuery::new(
            request.origin.clone(),
            request.departure,
            request.budget_minutes.saturating_mul(60),
        )
        .with_transfer_rule(self.config.transfer)
        .including_origin(self.config.include_origin);

        let result = search_with_cancel(&graph, &query, cancel)?;
        debug!(
            origin = %request.origin,
            day_type = %request.day_type,
            reached = result.len(),
            "Reachability query answered"
        );
        Ok(result)
    }

    /// Reachability bucketed into cumulative animation frames.
    pub fn timeline(&self, request: &ReachRequest) -> Result<Timeline, ReachError> {
        let step = request
            .step_minutes
            .unwrap_or_else(|| i64::from(self.config.default_step_minutes));
        // Reject a bad step before paying for the search
        if step <= 0 {
            return Err(ReachError::InvalidRequest(format!(
                "time step must be positive, got {step} minutes"
            )));
        }
        let result = self.reachability(request)?;
        Ok(build_timeline(&result, step)?)
    }

    /// Look up one stop.
    pub fn stop(&self, day_type: DayType, id: &StopId) -> Result<Stop, ReachError> {
        let graph = self.store.get(day_type)?;
        graph
            .stop_by_id(id)
            .cloned()
            .ok_or_else(|| SearchError::UnknownStop(id.clone()).into())
    }

    /// Every stop of a day-type's graph, ordered by name.
    pub fn stops(&self, day_type: DayType) -> Result<Vec<Stop>, ReachError> {
        let graph = self.store.get(day_type)?;
        let mut stops = graph.stops().to_vec();
        stops.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(stops)
    }
}
