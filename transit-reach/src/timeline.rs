//! Animation frames over a single reachability result.
//!
//! Frames are cumulative: the frame at threshold `t` holds every stop
//! reached within `t` minutes, so each frame's stops include the previous
//! frame's. Building a timeline never re-runs the search.

use serde::Serialize;

use crate::domain::{DayType, ServiceTime, StopId};
use crate::reach::{ReachabilityResult, ReachedStop};

/// Error building a timeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// All stops reached within `threshold_minutes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub threshold_minutes: u32,
    /// Stops first reached in this frame.
    pub newly_reached: usize,
    pub entries: Vec<ReachedStop>,
}

/// Ordered frames for one origin and departure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub origin: StopId,
    pub departure: ServiceTime,
    pub day_type: DayType,
    pub step_minutes: u32,
    pub budget_minutes: u32,
    pub frames: Vec<Frame>,
}

impl Timeline {
    /// The last frame, which always equals the full result.
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

/// Bucket a search result into cumulative frames every `step_minutes`.
///
/// Thresholds run `step, 2*step, ...` up to the result's budget. When the
/// budget is not a whole number of steps a final frame at the budget is
/// appended.
pub fn build_timeline(
    result: &ReachabilityResult,
    step_minutes: i64,
) -> Result<Timeline, TimelineError> {
    if step_minutes <= 0 {
        return Err(TimelineError::InvalidParameter(format!(
            "time step must be positive, got {step_minutes} minutes"
        )));
    }
    let budget_minutes = result.budget_minutes();
    let step = u32::try_from(step_minutes).unwrap_or(u32::MAX);

    // A step longer than the budget leaves just the budget frame
    let mut thresholds: Vec<u32> = (1..=budget_minutes / step).map(|k| k * step).collect();
    if thresholds.last() != Some(&budget_minutes) {
        thresholds.push(budget_minutes);
    }

    let mut frames = Vec::with_capacity(thresholds.len());
    let mut previous = 0;
    for threshold in thresholds {
        let limit = u64::from(threshold) * 60;
        // Entries are sorted by elapsed time, so each frame is a prefix
        let end = result
            .entries
            .partition_point(|e| u64::from(e.elapsed_secs) <= limit);
        frames.push(Frame {
            threshold_minutes: threshold,
            newly_reached: end - previous,
            entries: result.entries[..end].to_vec(),
        });
        previous = end;
    }

    Ok(Timeline {
        origin: result.origin.id.clone(),
        departure: result.departure,
        day_type: result.day_type,
        step_minutes: step,
        budget_minutes,
        frames,
    })
}
