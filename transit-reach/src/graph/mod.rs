//! Schedule graphs: construction, structure and publication.
//!
//! A `GraphBuilder` turns timetable tables into one immutable
//! `ScheduleGraph` per day-type, and a `GraphStore` publishes complete sets
//! of graphs to concurrent readers.

mod builder;
mod error;
mod schedule;
mod store;

pub use builder::{BuildOutput, DEFAULT_FOOTPATH_SECS, GraphBuilder, build};
pub use error::{BuildError, DataIntegrityError, GraphError};
pub use schedule::{Edge, ScheduleGraph, WalkEdge};
pub use store::{DayGraphs, GraphStore, RefreshSummary, StoreError};
