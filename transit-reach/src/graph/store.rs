//! Publication point for built schedule graphs.
//!
//! Queries take a cheap `Arc` snapshot of the current graph and keep using
//! it for as long as they run. A refresh builds a complete new set of
//! graphs off to the side and swaps it in as a unit, so a query sees either
//! the fully-old or the fully-new data.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::DayType;
use crate::timetable::Timetable;

use super::builder::GraphBuilder;
use super::error::BuildError;
use super::schedule::ScheduleGraph;

/// Errors from the graph store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No graph has been published for this day-type yet
    #[error("no schedule graph available for {0}")]
    GraphUnavailable(DayType),

    /// A build failed; the previously published graphs are still in place
    #[error("graph build failed: {0}")]
    Build(#[from] BuildError),

    /// Every day-type came out empty, so nothing was published
    #[error("refresh produced no graphs")]
    NothingBuilt,

    /// A background build task panicked or was cancelled
    #[error("graph build task failed: {0}")]
    TaskFailed(String),
}

/// One immutable graph per day-type.
pub type DayGraphs = BTreeMap<DayType, Arc<ScheduleGraph>>;

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Day-types that now have a fresh graph.
    pub built: Vec<DayType>,
    /// Day-types with no service in the new data. They are left unpublished.
    pub empty: Vec<DayType>,
    /// Total number of skipped records across all builds.
    pub warnings: usize,
}

struct StoreInner {
    published: RwLock<Arc<DayGraphs>>,
    /// Held by every writer. Readers never touch it.
    writer: Mutex<()>,
}

/// Thread-safe holder of the currently published graphs.
///
/// Cloning is cheap; all clones share the same publication point.
#[derive(Clone)]
pub struct GraphStore {
    inner: Arc<StoreInner>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// Create an empty store. Every lookup fails until something is published.
    pub fn new() -> Self {
        Self::with_graphs(DayGraphs::new())
    }

    /// Create a store with an initial set of graphs.
    pub fn with_graphs(graphs: DayGraphs) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                published: RwLock::new(Arc::new(graphs)),
                writer: Mutex::new(()),
            }),
        }
    }

    /// The current set of graphs.
    pub fn snapshot(&self) -> Arc<DayGraphs> {
        let guard = self
            .inner
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// The current graph for a day-type.
    pub fn get(&self, day_type: DayType) -> Result<Arc<ScheduleGraph>, StoreError> {
        self.snapshot()
            .get(&day_type)
            .cloned()
            .ok_or(StoreError::GraphUnavailable(day_type))
    }

    /// Day-types that currently have a graph.
    pub fn available(&self) -> Vec<DayType> {
        self.snapshot().keys().copied().collect()
    }

    /// Publish one graph, replacing any previous graph for its day-type.
    ///
    /// Waits for a running refresh to finish first.
    pub async fn publish(&self, graph: ScheduleGraph) {
        let _writer = self.inner.writer.lock().await;
        let day_type = graph.day_type();
        let mut next = DayGraphs::clone(&self.snapshot());
        next.insert(day_type, Arc::new(graph));
        self.swap(next);
    }

    /// Replace the whole set of graphs at once.
    pub async fn publish_all(&self, graphs: DayGraphs) {
        let _writer = self.inner.writer.lock().await;
        self.swap(graphs);
    }

    /// Caller must hold the writer lock.
    fn swap(&self, graphs: DayGraphs) {
        let days: Vec<DayType> = graphs.keys().copied().collect();
        let mut guard = self
            .inner
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(graphs);
        info!(day_types = ?days, "Published schedule graphs");
    }

    /// Rebuild every day-type from `timetable` and publish the result.
    ///
    /// Builds run on the blocking pool while queries keep reading the old
    /// graphs. Writers wait for each other. On error nothing is published.
    pub async fn refresh(
        &self,
        timetable: Arc<Timetable>,
        default_footpath_secs: u32,
    ) -> Result<RefreshSummary, StoreError> {
        let _writer = self.inner.writer.lock().await;

        let tasks = DayType::ALL.map(|day| {
            let timetable = Arc::clone(&timetable);
            tokio::task::spawn_blocking(move || {
                GraphBuilder::new(&timetable)
                    .with_default_footpath_secs(default_footpath_secs)
                    .build(day)
            })
        });

        let mut graphs = DayGraphs::new();
        let mut summary = RefreshSummary {
            built: Vec::new(),
            empty: Vec::new(),
            warnings: 0,
        };

        for (day, joined) in DayType::ALL.into_iter().zip(join_all(tasks).await) {
            let result = joined.map_err(|e| StoreError::TaskFailed(e.to_string()))?;
            match result {
                Ok(output) => {
                    summary.warnings += output.warnings.len();
                    summary.built.push(day);
                    graphs.insert(day, Arc::new(output.graph));
                }
                Err(BuildError::NoConnections(_)) => {
                    warn!(day_type = %day, "No service in refreshed timetable");
                    summary.empty.push(day);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if graphs.is_empty() {
            return Err(StoreError::NothingBuilt);
        }

        self.swap(graphs);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ServiceTime, StopId, TripId};
    use crate::timetable::{ServiceCalendar, StopRecord, StopVisit, TripRecord};

    fn timetable(weekday: bool, sunday: bool) -> Timetable {
        let stop = |id: &str| StopRecord {
            stop_id: StopId::new(id),
            stop_name: id.to_string(),
            stop_lat: 0.0,
            stop_lon: 0.0,
        };
        let visit = |stop: &str, seq: u32, secs: u32| StopVisit {
            trip_id: TripId::new("t1"),
            stop_id: StopId::new(stop),
            stop_sequence: seq,
            arrival_time: ServiceTime::from_secs(secs),
            departure_time: ServiceTime::from_secs(secs),
        };
        Timetable {
            stops: vec![stop("A"), stop("B")],
            routes: vec![],
            trips: vec![TripRecord {
                trip_id: TripId::new("t1"),
                route_id: "r".to_string(),
                service_id: "s".to_string(),
            }],
            stop_visits: vec![visit("A", 1, 1000), visit("B", 2, 1200)],
            calendars: vec![ServiceCalendar {
                service_id: "s".to_string(),
                monday: weekday,
                sunday,
                ..Default::default()
            }],
            footpaths: vec![],
        }
    }

    #[test]
    fn empty_store_is_unavailable() {
        let store = GraphStore::new();
        let err = store.get(DayType::Weekday).unwrap_err();
        assert!(matches!(err, StoreError::GraphUnavailable(DayType::Weekday)));
        assert!(store.available().is_empty());
    }

    #[tokio::test]
    async fn publish_replaces_single_day() {
        let store = GraphStore::new();
        let tt = timetable(true, true);
        let first = GraphBuilder::new(&tt).build(DayType::Weekday).unwrap().graph;
        store.publish(first).await;
        let held = store.get(DayType::Weekday).unwrap();

        let second = GraphBuilder::new(&tt).build(DayType::Weekday).unwrap().graph;
        store.publish(second).await;
        let current = store.get(DayType::Weekday).unwrap();

        // The old snapshot is untouched and still usable
        assert!(!Arc::ptr_eq(&held, &current));
        assert_eq!(held.connection_count(), 1);
        assert!(store.get(DayType::Sunday).is_err());
    }

    #[tokio::test]
    async fn refresh_publishes_non_empty_days() {
        let store = GraphStore::new();
        let summary = store
            .refresh(Arc::new(timetable(true, false)), 180)
            .await
            .unwrap();

        assert_eq!(summary.built, vec![DayType::Weekday]);
        assert_eq!(summary.empty, vec![DayType::Saturday, DayType::Sunday]);
        assert_eq!(summary.warnings, 0);
        assert!(store.get(DayType::Weekday).is_ok());
        assert!(matches!(
            store.get(DayType::Sunday),
            Err(StoreError::GraphUnavailable(DayType::Sunday))
        ));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_old_graphs() {
        let store = GraphStore::new();
        store
            .refresh(Arc::new(timetable(true, true)), 180)
            .await
            .unwrap();
        let before = store.get(DayType::Weekday).unwrap();

        let err = store
            .refresh(Arc::new(timetable(false, false)), 180)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NothingBuilt));

        let after = store.get(DayType::Weekday).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(store.available(), vec![DayType::Weekday, DayType::Sunday]);
    }

    #[tokio::test]
    async fn refresh_swaps_whole_set() {
        let store = GraphStore::new();
        store
            .refresh(Arc::new(timetable(true, true)), 180)
            .await
            .unwrap();
        store
            .refresh(Arc::new(timetable(true, false)), 180)
            .await
            .unwrap();
        // Sunday disappeared together with the rest of the old set
        assert_eq!(store.available(), vec![DayType::Weekday]);
    }

    #[tokio::test]
    async fn clones_share_publication_point() {
        let store = GraphStore::new();
        let clone = store.clone();
        let tt = timetable(true, false);
        clone
            .publish(GraphBuilder::new(&tt).build(DayType::Weekday).unwrap().graph)
            .await;
        assert!(store.get(DayType::Weekday).is_ok());
    }

    #[tokio::test]
    async fn publish_waits_for_writer_lock() {
        let store = GraphStore::new();
        let tt = timetable(true, false);
        let graph = GraphBuilder::new(&tt).build(DayType::Weekday).unwrap().graph;

        let held = store.inner.writer.lock().await;
        let publisher = {
            let store = store.clone();
            tokio::spawn(async move { store.publish(graph).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(store.available().is_empty());

        drop(held);
        publisher.await.unwrap();
        assert_eq!(store.available(), vec![DayType::Weekday]);
    }

    #[tokio::test]
    async fn publish_during_refresh_is_not_lost() {
        let store = GraphStore::new();
        let sunday = GraphBuilder::new(&timetable(false, true))
            .build(DayType::Sunday)
            .unwrap()
            .graph;

        let (refreshed, ()) = tokio::join!(
            store.refresh(Arc::new(timetable(true, false)), 180),
            store.publish(sunday),
        );
        refreshed.unwrap();

        // The refresh took the lock first, so the publish lands on top of it
        assert_eq!(store.available(), vec![DayType::Weekday, DayType::Sunday]);
    }
}
