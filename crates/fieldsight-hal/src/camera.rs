//! Generic `TagCamera` trait and supporting types for cameras that solve
//! 3-D fiducial poses themselves (PhotonVision-style).

use fieldsight_geometry::Transform3d;

/// One marker tracked in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedTarget {
    pub fiducial_id: u32,
    /// Ratio of the best to the alternate reprojection error, in `[0, 1]`.
    /// Lower means a less ambiguous single-marker solve.
    pub pose_ambiguity: f64,
    /// Marker pose in the camera frame, best of the two planar solutions.
    pub best_camera_to_target: Transform3d,
}

/// Joint solve over every marker visible in the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiTagResult {
    pub field_to_camera: Transform3d,
    pub fiducial_ids: Vec<u32>,
}

/// Everything a tag camera reports for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineResult {
    /// Estimated exposure time, seconds on the robot clock.
    pub timestamp_seconds: f64,
    /// Targets ordered best first.
    pub targets: Vec<TrackedTarget>,
    pub multi_tag: Option<MultiTagResult>,
}

impl PipelineResult {
    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn best_target(&self) -> Option<&TrackedTarget> {
        self.targets.first()
    }
}

/// A camera that hands back its latest cached [`PipelineResult`].
pub trait TagCamera: Send {
    /// Stable identifier for this camera, e.g. `"photon_front"`.
    fn id(&self) -> &str;

    /// Latest cached result, or `None` if the camera has never produced one.
    /// Never blocks waiting for a new frame.
    fn latest_result(&mut self) -> Option<PipelineResult>;
}
