//! Transit reachability engine.
//!
//! Answers: "starting from stop S at time T, which stops can be reached
//! within B minutes, and how does the reachable set grow over time?"
//!
//! Timetable tables are built into one immutable schedule graph per
//! day-type, published through a `GraphStore`, searched with a
//! time-dependent earliest-arrival search and bucketed into animation
//! frames.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod graph;
pub mod reach;
pub mod timeline;
pub mod timetable;

pub use config::EngineConfig;
pub use engine::{Engine, ReachRequest};
pub use error::{ErrorClass, ReachError};
