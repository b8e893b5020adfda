//! Time-dependent earliest-arrival search.
//!
//! A label-setting search in the style of Dijkstra. Each stop carries two
//! labels: the earliest instant the rider gets there, and the earliest
//! instant they can board a different trip there. After a ride the second
//! trails the first by the transfer buffer; after a walk they coincide. Both
//! kinds are finalized in time order from one heap.
//!
//! Boarding a trip rides it to the end of its run, so staying aboard never
//! depends on which trip first reached an intermediate stop.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::domain::{ServiceTime, StopId, StopIdx};
use crate::graph::{Edge, ScheduleGraph};

use super::cancel::CancelFlag;
use super::query::{BufferScope, ReachQuery, TransferRule};
use super::result::{ReachabilityResult, ReachedStop};

/// Error from a reachability search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The origin is not a stop of the graph
    #[error("unknown stop {0}")]
    UnknownStop(StopId),

    /// A numeric parameter is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller cancelled the search
    #[error("search cancelled")]
    Cancelled,
}

/// Earliest arrival at a stop.
///
/// Field order is the ranking: earlier first, then fewer transfers, then a
/// rider who has not used a vehicle yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Arrival {
    time: ServiceTime,
    transfers: u32,
    ridden: bool,
}

/// Earliest instant a different trip can be boarded at a stop, with the
/// transfer count that boarding ends up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Ready {
    time: ServiceTime,
    transfers: u32,
}

trait Timed: Copy + Ord {
    fn time(&self) -> ServiceTime;
}

impl Timed for Arrival {
    fn time(&self) -> ServiceTime {
        self.time
    }
}

impl Timed for Ready {
    fn time(&self) -> ServiceTime {
        self.time
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot<L> {
    label: L,
    finalized: bool,
}

/// Offer a candidate label. Earlier wins; on equal time the lower-ranked
/// label wins. Finalized slots are never relabeled.
///
/// Returns whether the slot needs a new heap entry.
fn offer<L: Timed>(slot: &mut Option<Slot<L>>, label: L) -> bool {
    let queue = match slot.as_ref() {
        None => true,
        Some(current) if current.finalized => return false,
        Some(current) if label.time() < current.label.time() => true,
        // Same heap key, so the queued entry stays valid
        Some(current) if label < current.label => false,
        Some(_) => return false,
    };
    *slot = Some(Slot {
        label,
        finalized: false,
    });
    queue
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Arrive,
    Board,
}

/// Heap entry. Stale entries are skipped on pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct State {
    time: ServiceTime,
    stop: StopIdx,
    phase: Phase,
}

// Reversed so `BinaryHeap` pops the earliest instant first, then the lowest
// stop index, arrivals before boardings
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.stop.cmp(&self.stop))
            .then_with(|| other.phase.cmp(&self.phase))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Legs `[from, until)` of a trip already ridden with `transfers`.
#[derive(Debug, Clone, Copy)]
struct Ridden {
    from: u32,
    until: u32,
    transfers: u32,
}

impl Ridden {
    fn covers(&self, leg: u32, transfers: u32) -> bool {
        self.from <= leg && leg < self.until && self.transfers <= transfers
    }
}

struct Search<'g> {
    graph: &'g ScheduleGraph,
    rule: TransferRule,
    deadline: ServiceTime,
    arrivals: Vec<Option<Slot<Arrival>>>,
    ready: Vec<Option<Slot<Ready>>>,
    ridden: Vec<Option<Ridden>>,
    heap: BinaryHeap<State>,
    scanned: usize,
}

impl<'g> Search<'g> {
    fn arrive(&mut self, stop: StopIdx, label: Arrival) {
        if offer(&mut self.arrivals[stop.as_usize()], label) {
            self.heap.push(State {
                time: label.time,
                stop,
                phase: Phase::Arrive,
            });
        }
    }

    fn ready(&mut self, stop: StopIdx, label: Ready) {
        if label.time > self.deadline {
            return;
        }
        if offer(&mut self.ready[stop.as_usize()], label) {
            self.heap.push(State {
                time: label.time,
                stop,
                phase: Phase::Board,
            });
        }
    }

    /// Board `edge` and ride its trip until the run ends or passes the
    /// deadline.
    ///
    /// Under `RouteChangeOnly`, same-route trips leaving a visited stop
    /// within the buffer are boarded straight from the vehicle; later
    /// departures are left to the stop's ready label.
    fn board(&mut self, edge: &'g Edge, transfers: u32) {
        let graph = self.graph;
        let buffer = self.rule.min_transfer_secs;
        let waive_same_route = self.rule.scope == BufferScope::RouteChangeOnly && buffer > 0;

        let mut pending = vec![(edge, transfers)];
        while let Some((edge, transfers)) = pending.pop() {
            let trip = edge.trip;
            if self.ridden[trip.as_usize()].is_some_and(|r| r.covers(edge.leg, transfers)) {
                continue;
            }

            let mut until = edge.leg;
            let mut vehicle: Option<(StopIdx, ServiceTime)> = None;
            for (from, leg) in graph.ride(trip, edge.leg) {
                let connection = &leg.connection;
                if let Some((at, since)) = vehicle {
                    // A gap left by skipped data ends the run
                    if from != at || connection.departure < since {
                        break;
                    }
                }
                if connection.arrival > self.deadline {
                    break;
                }
                until += 1;

                self.arrive(
                    leg.target,
                    Arrival {
                        time: connection.arrival,
                        transfers,
                        ridden: true,
                    },
                );
                self.ready(
                    leg.target,
                    Ready {
                        time: connection.arrival.saturating_add_secs(buffer),
                        transfers: transfers + 1,
                    },
                );

                if waive_same_route {
                    let waived_until = connection.arrival.saturating_add_secs(buffer);
                    for next in graph.departures_from(leg.target, connection.arrival) {
                        let departure = next.connection.departure;
                        if departure >= waived_until || departure > self.deadline {
                            break;
                        }
                        if next.trip != trip && next.connection.route == connection.route {
                            pending.push((next, transfers + 1));
                        }
                    }
                }

                vehicle = Some((leg.target, connection.arrival));
            }

            self.ridden[trip.as_usize()] = Some(Ridden {
                from: edge.leg,
                until,
                transfers,
            });
        }
    }
}

/// Run a reachability search to completion.
pub fn search(graph: &ScheduleGraph, query: &ReachQuery) -> Result<ReachabilityResult, SearchError> {
    search_with_cancel(graph, query, &CancelFlag::new())
}

/// Run a reachability search that stops early once `cancel` is set.
///
/// A cancelled search returns `SearchError::Cancelled` and no partial result.
pub fn search_with_cancel(
    graph: &ScheduleGraph,
    query: &ReachQuery,
    cancel: &CancelFlag,
) -> Result<ReachabilityResult, SearchError> {
    let origin = graph
        .lookup(&query.origin)
        .ok_or_else(|| SearchError::UnknownStop(query.origin.clone()))?;
    query.validate()?;

    let departure = query.departure;
    let deadline = query.deadline();

    let mut search = Search {
        graph,
        rule: query.transfer,
        deadline,
        arrivals: vec![None; graph.stop_count()],
        ready: vec![None; graph.stop_count()],
        ridden: vec![None; graph.trip_count()],
        heap: BinaryHeap::new(),
        scanned: 0,
    };
    search.arrive(
        origin,
        Arrival {
            time: departure,
            transfers: 0,
            ridden: false,
        },
    );
    search.ready(
        origin,
        Ready {
            time: departure,
            transfers: 0,
        },
    );

    let mut settled = 0usize;

    while let Some(State { time, stop, phase }) = search.heap.pop() {
        if cancel.is_cancelled() {
            debug!(origin = %query.origin, settled, "Search cancelled");
            return Err(SearchError::Cancelled);
        }
        // Everything still queued is even later
        if time > deadline {
            break;
        }

        match phase {
            Phase::Arrive => {
                let Some(slot) = search.arrivals[stop.as_usize()].as_mut() else {
                    continue;
                };
                if slot.finalized || slot.label.time != time {
                    continue;
                }
                slot.finalized = true;
                let label = slot.label;
                settled += 1;

                for walk in graph.walks(stop) {
                    let time = label.time.saturating_add_secs(walk.duration_secs);
                    if time > deadline {
                        continue;
                    }
                    search.arrive(walk.target, Arrival { time, ..label });
                    // The walk itself covers the change
                    search.ready(
                        walk.target,
                        Ready {
                            time,
                            transfers: label.transfers + u32::from(label.ridden),
                        },
                    );
                }
            }
            Phase::Board => {
                let Some(slot) = search.ready[stop.as_usize()].as_mut() else {
                    continue;
                };
                if slot.finalized || slot.label.time != time {
                    continue;
                }
                slot.finalized = true;
                let label = slot.label;

                for edge in graph.departures_from(stop, label.time) {
                    if edge.connection.departure > deadline {
                        break;
                    }
                    search.scanned += 1;
                    search.board(edge, label.transfers);
                }
            }
        }
    }

    let mut entries: Vec<ReachedStop> = graph
        .stops()
        .iter()
        .zip(&search.arrivals)
        .enumerate()
        .filter_map(|(i, (stop, slot))| {
            let label = slot.as_ref().filter(|s| s.finalized)?.label;
            if i == origin.as_usize() && !query.include_origin {
                return None;
            }
            Some(ReachedStop::new(stop, departure, label.time, label.transfers))
        })
        .collect();
    entries.sort_by(|a, b| {
        a.elapsed_secs
            .cmp(&b.elapsed_secs)
            .then_with(|| a.stop_id.cmp(&b.stop_id))
    });

    debug!(
        origin = %query.origin,
        departure = %departure,
        budget_secs = query.budget_secs,
        settled,
        scanned = search.scanned,
        reached = entries.len(),
        "Reachability search finished"
    );

    Ok(ReachabilityResult {
        origin: graph.stop(origin).clone(),
        departure,
        budget_secs: deadline.as_secs() - departure.as_secs(),
        day_type: graph.day_type(),
        entries,
        stops_settled: settled,
    })
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
