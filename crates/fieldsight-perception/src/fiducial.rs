//! [`FiducialAdapter`] – fiducial pipelines that report a field pose directly.

use fieldsight_geometry::Pose2d;
use fieldsight_hal::{FiducialPipeline, PipelineSettings, VisionPipeline};
use fieldsight_types::{SourceFamily, SourceId};
use tracing::trace;

use crate::candidate::PoseCandidate;

/// Normalizes a [`FiducialPipeline`] into [`PoseCandidate`]s.
pub struct FiducialAdapter {
    source: SourceId,
    pipeline: Box<dyn FiducialPipeline>,
    last_latency_seconds: f64,
}

impl FiducialAdapter {
    /// Wrap `pipeline`, pushing `settings` to it once.
    pub fn new(mut pipeline: Box<dyn FiducialPipeline>, settings: &PipelineSettings) -> Self {
        pipeline.configure(settings);
        Self {
            source: SourceId::new(SourceFamily::Fiducial, pipeline.id()),
            pipeline,
            last_latency_seconds: 0.0,
        }
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Latest candidate, or `None` when the pipeline published nothing fresh
    /// or no complete pose.  `now` is the robot clock, seconds.
    pub fn poll(&mut self, now: f64) -> Option<PoseCandidate> {
        let reading = self.pipeline.latest_fiducial()?;
        let pose = reading.robot_pose?;
        let latency_seconds = reading.total_latency_ms() / 1000.0;
        self.last_latency_seconds = latency_seconds;
        trace!(source = %self.source, ?pose, tags = ?reading.tag_ids, "fiducial reading");
        Some(PoseCandidate {
            pose,
            capture_timestamp: capture_timestamp(now, reading.total_latency_ms()),
            latency_seconds,
            source: self.source.clone(),
            has_target: reading.has_target,
            target_count: reading.target_count(),
            ambiguity: 0.0,
        })
    }

    /// Pipeline + capture latency of the most recent reading, seconds.
    pub fn last_latency_seconds(&self) -> f64 {
        self.last_latency_seconds
    }

    /// Robot pose with the primary visible marker as origin, for commands
    /// that line up on a marker.
    pub fn robot_pose_target_space(&self) -> Option<Pose2d> {
        self.pipeline.robot_pose_target_space()
    }

    /// Primary visible marker relative to the robot.
    pub fn target_pose_robot_space(&self) -> Option<Pose2d> {
        self.pipeline.target_pose_robot_space()
    }
}

/// Capture time of a frame published at `now` with `latency_ms` of total
/// latency.
pub fn capture_timestamp(now: f64, latency_ms: f64) -> f64 {
    now - latency_ms / 1000.0
}
