//! Reachability search over a schedule graph.
//!
//! Answers "starting from stop S at time T, which stops can be reached
//! within B minutes?" with an earliest-arrival search that respects a
//! minimum transfer buffer and counts trip changes.

mod cancel;
mod query;
mod result;
mod search;

pub use cancel::CancelFlag;
pub use query::{BufferScope, ReachQuery, TransferRule};
pub use result::{ReachabilityResult, ReachedStop};
pub use search::{SearchError, search, search_with_cancel};
