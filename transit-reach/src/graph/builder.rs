//! Builds a `ScheduleGraph` from normalized timetable tables.
//!
//! One graph is produced per day-type. Malformed trips, connections and
//! footpaths are skipped and reported as `DataIntegrityError` warnings;
//! the build only fails when nothing routable is left.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::domain::{Connection, DayType, Footpath, RouteLabel, Stop, StopId, TripId};
use crate::timetable::{ServiceCalendar, StopVisit, Timetable};

use super::error::{BuildError, DataIntegrityError};
use super::schedule::ScheduleGraph;

/// Walking time used for footpaths that carry none (3 minutes).
pub const DEFAULT_FOOTPATH_SECS: u32 = 180;

/// A freshly built graph and the problems skipped while building it.
#[derive(Debug)]
pub struct BuildOutput {
    pub graph: ScheduleGraph,
    pub warnings: Vec<DataIntegrityError>,
}

/// Turns a `Timetable` into schedule graphs.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    timetable: &'a Timetable,
    default_footpath_secs: u32,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over the given tables.
    pub fn new(timetable: &'a Timetable) -> Self {
        Self {
            timetable,
            default_footpath_secs: DEFAULT_FOOTPATH_SECS,
        }
    }

    /// Override the walking time used for footpaths without one.
    pub fn with_default_footpath_secs(mut self, secs: u32) -> Self {
        self.default_footpath_secs = secs;
        self
    }

    /// Build the graph for one day-type.
    pub fn build(&self, day_type: DayType) -> Result<BuildOutput, BuildError> {
        let mut warnings = Vec::new();

        let stops = self.collect_stops(&mut warnings);
        let known: HashSet<&StopId> = stops.iter().map(|s| &s.id).collect();

        let active = self.active_trips(day_type, &mut warnings);
        let mut visits_by_trip: HashMap<&TripId, Vec<&StopVisit>> = HashMap::new();
        for visit in &self.timetable.stop_visits {
            if active.contains_key(&visit.trip_id) {
                visits_by_trip.entry(&visit.trip_id).or_default().push(visit);
            }
        }

        let mut connections = Vec::new();
        let mut trips_used = 0usize;
        let mut seen_trips = HashSet::new();
        // Trip-table order fixes the tie-break among equal departures
        for trip in &self.timetable.trips {
            if !seen_trips.insert(&trip.trip_id) {
                warnings.push(DataIntegrityError::DuplicateTrip {
                    trip: trip.trip_id.clone(),
                });
                continue;
            }
            let Some(route) = active.get(&trip.trip_id) else {
                continue;
            };
            let Some(mut visits) = visits_by_trip.remove(&trip.trip_id) else {
                warnings.push(DataIntegrityError::TooFewVisits {
                    trip: trip.trip_id.clone(),
                    count: 0,
                });
                continue;
            };

            let before = connections.len();
            match trip_connections(&trip.trip_id, route, &mut visits, &known) {
                Ok((trip_conns, skipped)) => {
                    connections.extend(trip_conns);
                    warnings.extend(skipped);
                }
                Err(e) => warnings.push(e),
            }
            if connections.len() > before {
                trips_used += 1;
            }
        }

        let footpaths = self.collect_footpaths(&known, &mut warnings);

        for warning in &warnings {
            warn!(day_type = %day_type, error = %warning, "Skipping malformed timetable data");
        }

        if connections.is_empty() {
            return Err(BuildError::NoConnections(day_type));
        }

        let graph = ScheduleGraph::new(day_type, stops, connections, footpaths)?;

        info!(
            day_type = %day_type,
            stops = graph.stop_count(),
            trips = trips_used,
            connections = graph.connection_count(),
            footpaths = graph.footpath_count(),
            warnings = warnings.len(),
            "Schedule graph built"
        );

        Ok(BuildOutput { graph, warnings })
    }

    /// Build a graph for every day-type. The first failure aborts the batch.
    pub fn build_all(&self) -> Result<Vec<BuildOutput>, BuildError> {
        DayType::ALL.iter().map(|&day| self.build(day)).collect()
    }

    /// Stops from the stop table, first occurrence wins.
    fn collect_stops(&self, warnings: &mut Vec<DataIntegrityError>) -> Vec<Stop> {
        let mut seen = HashSet::new();
        let mut stops = Vec::with_capacity(self.timetable.stops.len());

        for record in &self.timetable.stops {
            if !seen.insert(&record.stop_id) {
                warnings.push(DataIntegrityError::DuplicateStop {
                    stop: record.stop_id.clone(),
                });
                continue;
            }
            stops.push(Stop::new(
                record.stop_id.clone(),
                record.stop_name.clone(),
                record.stop_lat,
                record.stop_lon,
            ));
        }

        stops
    }

    /// Trips running on `day_type`, mapped to their route label.
    fn active_trips(
        &self,
        day_type: DayType,
        warnings: &mut Vec<DataIntegrityError>,
    ) -> HashMap<&'a TripId, RouteLabel> {
        let timetable = self.timetable;
        let calendars: HashMap<&str, &ServiceCalendar> = timetable
            .calendars
            .iter()
            .map(|c| (c.service_id.as_str(), c))
            .collect();

        let routes: HashMap<&str, RouteLabel> = timetable
            .routes
            .iter()
            .map(|r| {
                let label = r
                    .route_short_name
                    .as_deref()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or(&r.route_id);
                (r.route_id.as_str(), RouteLabel::new(label))
            })
            .collect();

        let mut unknown_services = HashSet::new();
        let mut active = HashMap::new();

        for trip in &timetable.trips {
            match calendars.get(trip.service_id.as_str()) {
                Some(calendar) if calendar.is_active(day_type) => {
                    let label = routes
                        .get(trip.route_id.as_str())
                        .cloned()
                        .unwrap_or_else(|| RouteLabel::new(&trip.route_id));
                    active.entry(&trip.trip_id).or_insert(label);
                }
                Some(_) => {}
                None => {
                    if unknown_services.insert(trip.service_id.as_str()) {
                        warnings.push(DataIntegrityError::UnknownService {
                            service_id: trip.service_id.clone(),
                        });
                    }
                }
            }
        }

        debug!(
            day_type = %day_type,
            active = active.len(),
            total = timetable.trips.len(),
            "Selected active trips"
        );

        active
    }

    fn collect_footpaths(
        &self,
        known: &HashSet<&StopId>,
        warnings: &mut Vec<DataIntegrityError>,
    ) -> Vec<Footpath> {
        let mut footpaths = Vec::new();

        for record in &self.timetable.footpaths {
            if record.from_stop_id == record.to_stop_id {
                continue;
            }
            if !known.contains(&record.from_stop_id) || !known.contains(&record.to_stop_id) {
                warnings.push(DataIntegrityError::UnknownFootpathStop {
                    from: record.from_stop_id.clone(),
                    to: record.to_stop_id.clone(),
                });
                continue;
            }
            footpaths.push(Footpath {
                from: record.from_stop_id.clone(),
                to: record.to_stop_id.clone(),
                duration_secs: record
                    .min_transfer_time
                    .unwrap_or(self.default_footpath_secs),
            });
        }

        footpaths
    }
}

/// Build a single day-type's graph with default settings.
pub fn build(timetable: &Timetable, day_type: DayType) -> Result<BuildOutput, BuildError> {
    GraphBuilder::new(timetable).build(day_type)
}

/// Emit one connection per consecutive pair of visits.
///
/// Whole-trip problems are returned as `Err`; individual bad connections are
/// dropped and returned alongside the good ones.
fn trip_connections(
    trip: &TripId,
    route: &RouteLabel,
    visits: &mut [&StopVisit],
    known: &HashSet<&StopId>,
) -> Result<(Vec<Connection>, Vec<DataIntegrityError>), DataIntegrityError> {
    if visits.len() < 2 {
        return Err(DataIntegrityError::TooFewVisits {
            trip: trip.clone(),
            count: visits.len(),
        });
    }

    visits.sort_by_key(|v| v.stop_sequence);

    if let Some(pair) = visits
        .windows(2)
        .find(|pair| pair[0].stop_sequence == pair[1].stop_sequence)
    {
        return Err(DataIntegrityError::DuplicateSequence {
            trip: trip.clone(),
            sequence: pair[0].stop_sequence,
        });
    }

    if let Some(visit) = visits.iter().find(|v| !known.contains(&v.stop_id)) {
        return Err(DataIntegrityError::UnknownStop {
            trip: trip.clone(),
            stop: visit.stop_id.clone(),
        });
    }

    let mut connections = Vec::with_capacity(visits.len() - 1);
    let mut skipped = Vec::new();

    for pair in visits.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if to.arrival_time < from.departure_time {
            skipped.push(DataIntegrityError::NegativeDuration {
                trip: trip.clone(),
                from: from.stop_id.clone(),
                to: to.stop_id.clone(),
                departure: from.departure_time,
                arrival: to.arrival_time,
            });
            continue;
        }
        connections.push(Connection {
            from: from.stop_id.clone(),
            to: to.stop_id.clone(),
            departure: from.departure_time,
            arrival: to.arrival_time,
            trip: trip.clone(),
            route: route.clone(),
        });
    }

    Ok((connections, skipped))
}
