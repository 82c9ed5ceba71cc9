//! Capability traits for the two table-driven pipeline families.
//!
//! Adapters in `fieldsight-perception` only see these traits, so they can be
//! exercised with synthetic pipelines and stay independent of the vendor.

use fieldsight_geometry::{Pose2d, Transform3d};
use serde::{Deserialize, Serialize};

/// LED behaviour requested from a pipeline at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedMode {
    /// Whatever the active pipeline specifies.
    #[default]
    PipelineDefault,
    ForceOff,
    ForceBlink,
    ForceOn,
}

/// Startup configuration pushed to a pipeline once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineSettings {
    pub pipeline_index: u32,
    pub led_mode: LedMode,
    /// Camera pose in the robot frame, when the coprocessor needs it to
    /// report robot poses.
    pub robot_to_camera: Option<Transform3d>,
}

/// One fiducial-pipeline frame, already expressed in the field frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FiducialReading {
    /// At least one marker is in view.
    pub has_target: bool,
    /// Robot pose in the field frame, or `None` when the pipeline did not
    /// publish a complete solve.
    pub robot_pose: Option<Pose2d>,
    /// Ids of every marker contributing to this frame.
    pub tag_ids: Vec<u32>,
    /// Time spent in the vision pipeline, milliseconds.
    pub pipeline_latency_ms: f64,
    /// Time between exposure and the start of processing, milliseconds.
    pub capture_latency_ms: f64,
}

impl FiducialReading {
    pub fn target_count(&self) -> usize {
        self.tag_ids.len()
    }

    pub fn total_latency_ms(&self) -> f64 {
        self.pipeline_latency_ms + self.capture_latency_ms
    }
}

/// One detector-pipeline frame: raw angles exactly as the vendor reports
/// them (horizontal offset positive to the right).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectorReading {
    pub has_target: bool,
    pub tx_deg: f64,
    pub ty_deg: f64,
}

/// Behaviour shared by every table-driven pipeline.
pub trait VisionPipeline: Send {
    /// Stable identifier, e.g. `"limelight"`.
    fn id(&self) -> &str;

    /// Push startup settings.  Called once by the owning adapter.
    fn configure(&mut self, settings: &PipelineSettings);
}

/// A pipeline that solves the robot's field pose from fiducial markers.
pub trait FiducialPipeline: VisionPipeline {
    /// Latest frame, or `None` when the pipeline has not published fresh
    /// data (disconnected or empty result dump).
    fn latest_fiducial(&mut self) -> Option<FiducialReading>;

    /// Robot pose with the primary in-view marker as origin.
    fn robot_pose_target_space(&self) -> Option<Pose2d> {
        None
    }

    /// Primary in-view marker with the robot as origin.
    fn target_pose_robot_space(&self) -> Option<Pose2d> {
        None
    }
}

/// A pipeline that detects game objects and reports their bearing and
/// elevation.
pub trait DetectorPipeline: VisionPipeline {
    /// Latest frame, or `None` when the pipeline has not published fresh
    /// data.
    fn latest_detection(&mut self) -> Option<DetectorReading>;
}
