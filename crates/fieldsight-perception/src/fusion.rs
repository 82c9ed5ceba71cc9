//! Pose Fusion Engine.
//!
//! Owns the single accepted robot pose and decides, once per control cycle,
//! which source may overwrite it.
//!
//! Families are polled in a fixed order:
//! - **Fiducial** – one candidate at most; written only when the
//!   [`ConfidenceGate`] accepts it.  Total latency is recomputed from the
//!   candidate.
//! - **Multi-camera** – one candidate per camera with a successful solve;
//!   each overwrites the pose unconditionally.
//!
//! Whatever is written last in a cycle wins.
//!
//! # Example
//!
//! ```rust
//! use fieldsight_geometry::{Pose2d, Rotation2d};
//! use fieldsight_hal::{LimelightPipeline, MemoryTable, PipelineSettings, SimLimelight};
//! use fieldsight_perception::fiducial::FiducialAdapter;
//! use fieldsight_perception::field_layout::FieldDimensions;
//! use fieldsight_perception::fusion::FusionEngine;
//! use fieldsight_perception::gate::ConfidenceGate;
//!
//! let table = MemoryTable::new("limelight");
//! let sim = SimLimelight::new(table.clone());
//! let adapter = FiducialAdapter::new(
//!     Box::new(LimelightPipeline::new(table)),
//!     &PipelineSettings::default(),
//! );
//! let mut fusion = FusionEngine::new(ConfidenceGate::new(FieldDimensions::default()))
//!     .with_fiducial(adapter);
//!
//! sim.publish_fiducials(Pose2d::new(3.0, 2.0, Rotation2d::identity()), &[4], 10.0, 10.0);
//! assert!(fusion.update(1.0).is_some());
//! assert!((fusion.state().accepted_pose.x() - 3.0).abs() < 1e-9);
//! ```

use fieldsight_geometry::Pose2d;
use fieldsight_types::{SourceFamily, SourceId, VisionError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::candidate::PoseCandidate;
use crate::fiducial::FiducialAdapter;
use crate::gate::ConfidenceGate;
use crate::multi_camera::MultiCameraAdapter;

// ────────────────────────────────────────────────────────────────────────────
// Output type
// ────────────────────────────────────────────────────────────────────────────

/// The pose estimate maintained by [`FusionEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedPoseState {
    /// Current best robot pose in the field frame.
    pub accepted_pose: Pose2d,
    /// Capture timestamp of the frame behind `accepted_pose`, seconds.
    pub accepted_at: f64,
    /// Pipeline + capture latency of the last accepted fiducial frame,
    /// seconds.
    pub total_latency_seconds: f64,
    /// Source of the last write, `None` until the first acceptance.
    pub last_source: Option<SourceId>,
    pub fiducial_has_target: bool,
    pub fiducial_target_count: usize,
    pub multi_camera_has_targets: bool,
    /// Capture timestamp of the last successful multi-camera solve.
    pub multi_camera_timestamp: f64,
}

impl Default for FusedPoseState {
    fn default() -> Self {
        Self {
            accepted_pose: Pose2d::identity(),
            accepted_at: 0.0,
            total_latency_seconds: 0.0,
            last_source: None,
            fiducial_has_target: false,
            fiducial_target_count: 0,
            multi_camera_has_targets: false,
            multi_camera_timestamp: 0.0,
        }
    }
}

impl FusedPoseState {
    fn write(&mut self, candidate: &PoseCandidate) {
        self.accepted_pose = candidate.pose;
        self.accepted_at = candidate.capture_timestamp;
        self.last_source = Some(candidate.source.clone());
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FusionEngine
// ────────────────────────────────────────────────────────────────────────────

/// Combines the fiducial and multi-camera families into one
/// [`FusedPoseState`].
///
/// Either family may be absent.  A family whose construction failed is
/// recorded with [`FusionEngine::disable_family`] and stays off for the
/// session.
pub struct FusionEngine {
    gate: ConfidenceGate,
    fiducial: Option<FiducialAdapter>,
    multi_camera: Option<MultiCameraAdapter>,
    disabled: Vec<(SourceFamily, VisionError)>,
    state: FusedPoseState,
}

impl FusionEngine {
    pub fn new(gate: ConfidenceGate) -> Self {
        Self {
            gate,
            fiducial: None,
            multi_camera: None,
            disabled: Vec::new(),
            state: FusedPoseState::default(),
        }
    }

    pub fn with_fiducial(mut self, adapter: FiducialAdapter) -> Self {
        if !self.is_disabled(SourceFamily::Fiducial) {
            self.fiducial = Some(adapter);
        }
        self
    }

    pub fn with_multi_camera(mut self, adapter: MultiCameraAdapter) -> Self {
        if !self.is_disabled(SourceFamily::MultiCamera) {
            self.multi_camera = Some(adapter);
        }
        self
    }

    /// Turn `family` off for the rest of the session.  Logs once per family.
    pub fn disable_family(&mut self, family: SourceFamily, error: VisionError) {
        if self.is_disabled(family) {
            return;
        }
        warn!(%family, %error, "vision source family disabled");
        match family {
            SourceFamily::Fiducial => self.fiducial = None,
            SourceFamily::MultiCamera => self.multi_camera = None,
            SourceFamily::ObjectDetection => {}
        }
        self.disabled.push((family, error));
    }

    pub fn is_disabled(&self, family: SourceFamily) -> bool {
        self.disabled.iter().any(|(f, _)| *f == family)
    }

    /// Families switched off at startup, with the reason.
    pub fn disabled_families(&self) -> &[(SourceFamily, VisionError)] {
        &self.disabled
    }

    pub fn state(&self) -> &FusedPoseState {
        &self.state
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    /// The fiducial adapter, for its target-space helpers.
    pub fn fiducial(&self) -> Option<&FiducialAdapter> {
        self.fiducial.as_ref()
    }

    /// Poll every enabled family once and fold the results into the state.
    ///
    /// Returns the source of the last write this cycle, or `None` when the
    /// pose was left unchanged.
    pub fn update(&mut self, now: f64) -> Option<SourceId> {
        let mut written = None;

        if let Some(adapter) = self.fiducial.as_mut() {
            match adapter.poll(now) {
                Some(candidate) => {
                    self.state.fiducial_has_target = candidate.has_target;
                    self.state.fiducial_target_count = candidate.target_count;
                    if self.gate.accept(&candidate, &self.state.accepted_pose) {
                        self.state.write(&candidate);
                        self.state.total_latency_seconds = candidate.latency_seconds;
                        written = Some(candidate.source);
                    }
                }
                None => {
                    self.state.fiducial_has_target = false;
                    self.state.fiducial_target_count = 0;
                }
            }
        }

        if let Some(adapter) = self.multi_camera.as_mut() {
            for candidate in adapter.poll(now) {
                self.state.write(&candidate);
                self.state.multi_camera_timestamp = candidate.capture_timestamp;
                written = Some(candidate.source);
            }
            self.state.multi_camera_has_targets = adapter.has_targets();
        }

        if let Some(source) = &written {
            debug!(
                %source,
                x = self.state.accepted_pose.x(),
                y = self.state.accepted_pose.y(),
                heading_deg = self.state.accepted_pose.heading().degrees(),
                "pose accepted"
            );
        }
        written
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_layout::{FieldDimensions, FieldLayout};
    use fieldsight_geometry::{Pose3d, Rotation2d, Rotation3d, Transform3d, Translation3d};
    use fieldsight_hal::{
        LimelightPipeline, MemoryTable, MultiTagResult, PipelineResult, PipelineSettings,
        SimLimelight, SimTagCamera, TrackedTarget,
    };

    fn gate() -> ConfidenceGate {
        ConfidenceGate::new(FieldDimensions::new(16.5, 8.2))
    }

    fn fiducial() -> (SimLimelight, FiducialAdapter) {
        let table = MemoryTable::new("limelight");
        let sim = SimLimelight::new(table.clone());
        let adapter = FiducialAdapter::new(
            Box::new(LimelightPipeline::new(table)),
            &PipelineSettings::default(),
        );
        (sim, adapter)
    }

    fn multi_tag_frame(robot: Pose2d, timestamp: f64) -> PipelineResult {
        let field_to_robot = Transform3d::new(
            Translation3d::new(robot.x(), robot.y(), 0.0),
            Rotation3d::from_yaw(robot.heading().radians()),
        );
        PipelineResult {
            timestamp_seconds: timestamp,
            targets: vec![TrackedTarget {
                fiducial_id: 1,
                pose_ambiguity: 0.5,
                best_camera_to_target: Transform3d::identity(),
            }],
            multi_tag: Some(MultiTagResult {
                // Camera at the robot origin.
                field_to_camera: field_to_robot,
                fiducial_ids: vec![1, 2],
            }),
        }
    }

    fn multi_camera(frame: Option<PipelineResult>) -> MultiCameraAdapter {
        let mut camera = SimTagCamera::new("photon_front");
        if let Some(frame) = frame {
            camera.push(frame);
        }
        let layout = FieldLayout::from_tags(FieldDimensions::default(), [(1, Pose3d::default())]);
        MultiCameraAdapter::new(layout, 0.2).with_camera(Box::new(camera), Transform3d::identity())
    }

    #[test]
    fn starts_at_identity() {
        let fusion = FusionEngine::new(gate());
        assert_eq!(fusion.state(), &FusedPoseState::default());
        assert!(fusion.state().accepted_pose.approx_eq(Pose2d::identity(), 0.0, 0.0));
    }

    #[test]
    fn accepted_fiducial_updates_pose_and_latency() {
        let (sim, adapter) = fiducial();
        let mut fusion = FusionEngine::new(gate()).with_fiducial(adapter);
        sim.publish_fiducials(Pose2d::new(4.0, 2.0, Rotation2d::from_degrees(90.0)), &[7], 20.0, 30.0);

        let source = fusion.update(2.0).expect("accepted");
        assert_eq!(source.family, SourceFamily::Fiducial);
        let state = fusion.state();
        assert!(state.accepted_pose.approx_eq(Pose2d::new(4.0, 2.0, Rotation2d::from_degrees(90.0)), 1e-9, 1e-9));
        assert!((state.total_latency_seconds - 0.05).abs() < 1e-12);
        assert!((state.accepted_at - 1.95).abs() < 1e-12);
        assert!(state.fiducial_has_target);
        assert_eq!(state.fiducial_target_count, 1);
    }

    #[test]
    fn rejected_fiducial_keeps_previous_pose() {
        let (sim, adapter) = fiducial();
        let mut fusion = FusionEngine::new(gate()).with_fiducial(adapter);
        sim.publish_fiducials(Pose2d::new(5.0, 5.0, Rotation2d::identity()), &[7], 0.0, 0.0);
        fusion.update(1.0);

        sim.publish_fiducials(Pose2d::new(20.0, 5.0, Rotation2d::identity()), &[7], 0.0, 0.0);
        assert!(fusion.update(2.0).is_none());
        assert!((fusion.state().accepted_pose.x() - 5.0).abs() < 1e-12);
        assert!((fusion.state().accepted_at - 1.0).abs() < 1e-12);

        // Same pose seen by two markers passes the gate.
        sim.publish_fiducials(Pose2d::new(20.0, 5.0, Rotation2d::identity()), &[7, 8], 0.0, 0.0);
        assert!(fusion.update(3.0).is_some());
        assert!((fusion.state().accepted_pose.x() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn disconnected_fiducial_clears_visibility() {
        let (sim, adapter) = fiducial();
        let mut fusion = FusionEngine::new(gate()).with_fiducial(adapter);
        sim.publish_fiducials(Pose2d::new(5.0, 5.0, Rotation2d::identity()), &[7, 8], 0.0, 0.0);
        fusion.update(1.0);
        sim.disconnect();
        assert!(fusion.update(2.0).is_none());
        assert!(!fusion.state().fiducial_has_target);
        assert!((fusion.state().accepted_pose.x() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn multi_camera_wins_when_both_write() {
        let (sim, adapter) = fiducial();
        let robot = Pose2d::new(10.0, 3.0, Rotation2d::from_degrees(-45.0));
        let mut fusion = FusionEngine::new(gate())
            .with_fiducial(adapter)
            .with_multi_camera(multi_camera(Some(multi_tag_frame(robot, 0.98))));
        sim.publish_fiducials(Pose2d::new(5.0, 5.0, Rotation2d::identity()), &[7], 0.0, 0.0);

        let source = fusion.update(1.0).expect("written");
        assert_eq!(source.family, SourceFamily::MultiCamera);
        let state = fusion.state();
        assert!(state.accepted_pose.approx_eq(robot, 1e-9, 1e-9));
        assert!(state.multi_camera_has_targets);
        assert!((state.multi_camera_timestamp - 0.98).abs() < 1e-12);
        assert!((state.accepted_at - 0.98).abs() < 1e-12);
        assert!(state.fiducial_has_target);
    }

    #[test]
    fn multi_camera_bypasses_gate() {
        let robot = Pose2d::new(-3.0, 50.0, Rotation2d::identity());
        let mut fusion =
            FusionEngine::new(gate()).with_multi_camera(multi_camera(Some(multi_tag_frame(robot, 0.5))));
        assert!(fusion.update(1.0).is_some());
        assert!(fusion.state().accepted_pose.approx_eq(robot, 1e-9, 1e-9));
    }

    #[test]
    fn disabled_family_warns_once_and_is_skipped() {
        let mut fusion = FusionEngine::new(gate());
        let err = VisionError::LayoutLoad {
            path: "missing.json".into(),
            details: "not found".into(),
        };
        fusion.disable_family(SourceFamily::MultiCamera, err.clone());
        fusion.disable_family(SourceFamily::MultiCamera, err);
        assert_eq!(fusion.disabled_families().len(), 1);

        let robot = Pose2d::new(1.0, 1.0, Rotation2d::identity());
        let mut fusion = fusion.with_multi_camera(multi_camera(Some(multi_tag_frame(robot, 0.5))));
        assert!(fusion.update(1.0).is_none());
        assert!(fusion.is_disabled(SourceFamily::MultiCamera));
        assert!(!fusion.is_disabled(SourceFamily::Fiducial));
    }

    #[test]
    fn idle_cycle_changes_nothing() {
        let (_sim, adapter) = fiducial();
        let mut fusion = FusionEngine::new(gate())
            .with_fiducial(adapter)
            .with_multi_camera(multi_camera(None));
        assert!(fusion.update(1.0).is_none());
        assert_eq!(fusion.state().last_source, None);
        assert!(!fusion.state().multi_camera_has_targets);
    }

    #[test]
    fn ambiguous_multi_camera_frame_has_no_targets() {
        let mut frame = multi_tag_frame(Pose2d::new(2.0, 2.0, Rotation2d::identity()), 0.5);
        frame.multi_tag = None;
        frame.targets[0].pose_ambiguity = 0.9;
        let mut fusion = FusionEngine::new(gate()).with_multi_camera(multi_camera(Some(frame)));
        assert!(fusion.update(1.0).is_none());
        assert_eq!(fusion.state().last_source, None);
        assert!(!fusion.state().multi_camera_has_targets);
    }
}
