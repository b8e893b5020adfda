//! The immutable per-day-type schedule graph.

use std::collections::HashMap;

use crate::domain::{Connection, DayType, Footpath, ServiceTime, Stop, StopId, StopIdx, TripId, TripIdx};

use super::error::GraphError;

/// An outgoing connection together with the dense indices it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub target: StopIdx,
    pub trip: TripIdx,
    /// Position of this connection within its trip, counting from 0.
    pub leg: u32,
    pub connection: Connection,
}

/// Where a trip's leg sits in the per-stop departure lists.
#[derive(Debug, Clone, Copy)]
struct LegRef {
    stop: StopIdx,
    slot: u32,
}

/// An outgoing footpath together with the dense index of its target stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEdge {
    pub target: StopIdx,
    pub duration_secs: u32,
}

/// Directed multigraph of stops and timed connections for one day-type.
///
/// Stops are held in ascending id order, which fixes the meaning of every
/// `StopIdx`. Each stop's outgoing connections are sorted by departure
/// instant, with ties kept in insertion order, so the first connection
/// leaving at or after any instant is found by binary search.
///
/// Each trip also keeps its legs in travel order, so a rider who boards can
/// follow the vehicle without going back through the stop lists.
///
/// A graph is never mutated after construction. Refreshing data means
/// building a new graph and publishing it through a `GraphStore`.
#[derive(Debug)]
pub struct ScheduleGraph {
    day_type: DayType,
    stops: Vec<Stop>,
    index: HashMap<StopId, StopIdx>,
    departures: Vec<Vec<Edge>>,
    trips: Vec<Vec<LegRef>>,
    walks: Vec<Vec<WalkEdge>>,
    connection_count: usize,
    footpath_count: usize,
}

impl ScheduleGraph {
    /// Assemble a graph, enforcing its invariants.
    ///
    /// Connections keep their relative order among equal departure instants,
    /// and a trip's connections must be given in travel order. This is also
    /// the entry point for graphs restored by an external persistence layer.
    pub fn new(
        day_type: DayType,
        mut stops: Vec<Stop>,
        connections: Vec<Connection>,
        footpaths: Vec<Footpath>,
    ) -> Result<Self, GraphError> {
        stops.sort_by(|a, b| a.id.cmp(&b.id));

        if u32::try_from(stops.len()).is_err() {
            return Err(GraphError::TooManyStops(stops.len()));
        }
        if u32::try_from(connections.len()).is_err() {
            return Err(GraphError::TooManyConnections(connections.len()));
        }

        let mut index = HashMap::with_capacity(stops.len());
        for (i, stop) in stops.iter().enumerate() {
            if index.insert(stop.id.clone(), StopIdx(i as u32)).is_some() {
                return Err(GraphError::DuplicateStop(stop.id.clone()));
            }
        }

        let resolve = |id: &StopId| {
            index
                .get(id)
                .copied()
                .ok_or_else(|| GraphError::UnknownStop(id.clone()))
        };

        let mut trip_index: HashMap<TripId, TripIdx> = HashMap::new();
        // Paired with feed position until trips are laid out
        let mut pending: Vec<Vec<(usize, Edge)>> = vec![Vec::new(); stops.len()];
        let connection_count = connections.len();
        for (ordinal, connection) in connections.into_iter().enumerate() {
            let from = resolve(&connection.from)?;
            let target = resolve(&connection.to)?;
            if connection.duration_secs() < 0 {
                return Err(GraphError::NegativeDuration {
                    trip: connection.trip,
                    from: connection.from,
                    to: connection.to,
                });
            }
            let next = TripIdx(trip_index.len() as u32);
            let trip = *trip_index.entry(connection.trip.clone()).or_insert(next);
            pending[from.as_usize()].push((
                ordinal,
                Edge {
                    target,
                    trip,
                    leg: 0,
                    connection,
                },
            ));
        }

        // Stable: equal departures keep feed order
        for list in &mut pending {
            list.sort_by_key(|(_, edge)| edge.connection.departure);
        }

        let mut legs: Vec<Vec<(ServiceTime, usize, LegRef)>> = vec![Vec::new(); trip_index.len()];
        for (stop, list) in pending.iter().enumerate() {
            for (slot, (ordinal, edge)) in list.iter().enumerate() {
                legs[edge.trip.as_usize()].push((
                    edge.connection.departure,
                    *ordinal,
                    LegRef {
                        stop: StopIdx(stop as u32),
                        slot: slot as u32,
                    },
                ));
            }
        }
        let trips: Vec<Vec<LegRef>> = legs
            .into_iter()
            .map(|mut trip| {
                trip.sort_by_key(|&(departure, ordinal, _)| (departure, ordinal));
                trip.into_iter().map(|(_, _, leg)| leg).collect()
            })
            .collect();

        let mut departures: Vec<Vec<Edge>> = pending
            .into_iter()
            .map(|list| list.into_iter().map(|(_, edge)| edge).collect())
            .collect();
        for trip in &trips {
            for (position, leg) in trip.iter().enumerate() {
                departures[leg.stop.as_usize()][leg.slot as usize].leg = position as u32;
            }
        }

        let mut walks: Vec<Vec<WalkEdge>> = vec![Vec::new(); stops.len()];
        let footpath_count = footpaths.len();
        for footpath in footpaths {
            let from = resolve(&footpath.from)?;
            let target = resolve(&footpath.to)?;
            walks[from.as_usize()].push(WalkEdge {
                target,
                duration_secs: footpath.duration_secs,
            });
        }

        Ok(Self {
            day_type,
            stops,
            index,
            departures,
            trips,
            walks,
            connection_count,
            footpath_count,
        })
    }

    /// The day-type this graph was built for.
    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    /// All stops, in ascending id order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_count
    }

    pub fn footpath_count(&self) -> usize {
        self.footpath_count
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// Resolve a stop id to its dense index.
    pub fn lookup(&self, id: &StopId) -> Option<StopIdx> {
        self.index.get(id).copied()
    }

    /// Check whether a stop exists.
    pub fn contains(&self, id: &StopId) -> bool {
        self.index.contains_key(id)
    }

    /// The stop at a dense index.
    ///
    /// # Panics
    ///
    /// Panics if `idx` did not come from this graph.
    pub fn stop(&self, idx: StopIdx) -> &Stop {
        &self.stops[idx.as_usize()]
    }

    /// Look up a stop by id.
    pub fn stop_by_id(&self, id: &StopId) -> Option<&Stop> {
        self.lookup(id).map(|idx| self.stop(idx))
    }

    /// Every connection leaving a stop, ascending by departure.
    pub fn departures(&self, idx: StopIdx) -> &[Edge] {
        &self.departures[idx.as_usize()]
    }

    /// Connections leaving a stop at or after `earliest`.
    ///
    /// O(log k) in the stop's out-degree.
    pub fn departures_from(&self, idx: StopIdx, earliest: ServiceTime) -> &[Edge] {
        let list = self.departures(idx);
        let start = list.partition_point(|edge| edge.connection.departure < earliest);
        &list[start..]
    }

    /// A trip's legs from position `from_leg` onwards, in travel order,
    /// each paired with the stop it leaves from.
    pub fn ride(&self, trip: TripIdx, from_leg: u32) -> impl Iterator<Item = (StopIdx, &Edge)> {
        self.trips[trip.as_usize()]
            .iter()
            .skip(from_leg as usize)
            .map(|leg| (leg.stop, &self.departures[leg.stop.as_usize()][leg.slot as usize]))
    }

    /// Footpaths leaving a stop, in feed order.
    pub fn walks(&self, idx: StopIdx) -> &[WalkEdge] {
        &self.walks[idx.as_usize()]
    }

    /// Iterate over every connection, grouped by origin stop.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.departures
            .iter()
            .flat_map(|list| list.iter().map(|edge| &edge.connection))
    }

    /// Earliest and latest departure instants in the graph.
    pub fn service_span(&self) -> Option<(ServiceTime, ServiceTime)> {
        let first = self
            .departures
            .iter()
            .filter_map(|list| list.first())
            .map(|edge| edge.connection.departure)
            .min()?;
        let last = self
            .departures
            .iter()
            .filter_map(|list| list.last())
            .map(|edge| edge.connection.departure)
            .max()?;
        Some((first, last))
    }
}
