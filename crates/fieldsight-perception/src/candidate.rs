//! Per-cycle outputs of the source adapters.

use fieldsight_geometry::Pose2d;
use fieldsight_types::SourceId;
use serde::{Deserialize, Serialize};

/// A robot pose proposed by one source for one control cycle.
///
/// `ambiguity` and `target_count` only mean something when `has_target`
/// is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseCandidate {
    /// Robot pose in the field frame.
    pub pose: Pose2d,
    /// When the image behind this pose was captured, robot clock seconds.
    pub capture_timestamp: f64,
    /// Capture-to-publish latency of the frame, seconds.
    pub latency_seconds: f64,
    pub source: SourceId,
    pub has_target: bool,
    pub target_count: usize,
    /// Single-marker solve ambiguity in `[0, 1]`; `0` for joint solves and
    /// sources that do not report one.
    pub ambiguity: f64,
}

impl PoseCandidate {
    pub fn multiple_targets(&self) -> bool {
        self.target_count > 1
    }
}

/// Raw angular reading of the tracked object for the current cycle.
///
/// `horizontal_offset_deg` is counter-clockwise positive (target to the
/// left of the optical axis is positive).  Angles are stale when `visible`
/// is false.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectObservation {
    pub horizontal_offset_deg: f64,
    pub vertical_offset_deg: f64,
    pub visible: bool,
}
