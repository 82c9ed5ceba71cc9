//! [`MultiCameraAdapter`] – cameras that solve 3-D tag poses themselves.
//!
//! For each camera, two strategies are tried in order:
//!
//! 1. **Multi-tag** – the camera's joint solve gives `field_to_camera`;
//!    composing with the mount's `camera_to_robot` yields the robot pose.
//! 2. **Single-tag** – the best target, if its ambiguity is below the
//!    cutoff, is looked up in the [`FieldLayout`] and the robot pose is
//!    `tag_pose ⊕ camera_to_target⁻¹ ⊕ camera_to_robot`.
//!
//! When neither applies the camera reports no targets and contributes no
//! candidate this cycle.

use fieldsight_geometry::{Pose2d, Transform3d};
use fieldsight_hal::{PipelineResult, TagCamera};
use fieldsight_types::{SourceFamily, SourceId};
use tracing::{debug, trace};

use crate::candidate::PoseCandidate;
use crate::field_layout::FieldLayout;

/// Which strategy produced a [`TagSolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStrategy {
    MultiTag,
    SingleTag { fiducial_id: u32 },
}

/// A robot pose solved from one camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagSolve {
    pub pose: Pose2d,
    pub strategy: SolveStrategy,
    pub target_count: usize,
    pub ambiguity: f64,
}

/// Solve the robot's field pose from one frame, or `None` when neither
/// strategy applies.
pub fn solve_robot_pose(
    result: &PipelineResult,
    camera_to_robot: Transform3d,
    layout: &FieldLayout,
    ambiguity_cutoff: f64,
) -> Option<TagSolve> {
    if let Some(multi) = &result.multi_tag {
        let field_to_robot = multi.field_to_camera.compose(camera_to_robot);
        return Some(TagSolve {
            pose: field_to_robot.as_pose().to_pose2d(),
            strategy: SolveStrategy::MultiTag,
            target_count: multi.fiducial_ids.len().max(result.targets.len()),
            ambiguity: 0.0,
        });
    }

    let target = result.best_target()?;
    if target.pose_ambiguity >= ambiguity_cutoff {
        trace!(
            id = target.fiducial_id,
            ambiguity = target.pose_ambiguity,
            "single-tag solve too ambiguous"
        );
        return None;
    }
    let tag_pose = match layout.require_tag(target.fiducial_id) {
        Ok(pose) => pose,
        Err(e) => {
            debug!(error = %e, "single-tag solve skipped");
            return None;
        }
    };
    let field_to_robot = tag_pose
        .transform_by(target.best_camera_to_target.inverse())
        .transform_by(camera_to_robot);
    Some(TagSolve {
        pose: field_to_robot.to_pose2d(),
        strategy: SolveStrategy::SingleTag {
            fiducial_id: target.fiducial_id,
        },
        target_count: result.targets.len(),
        ambiguity: target.pose_ambiguity,
    })
}

struct CameraSlot {
    source: SourceId,
    camera: Box<dyn TagCamera>,
    camera_to_robot: Transform3d,
    has_targets: bool,
}

/// Polls every configured [`TagCamera`] and solves robot poses.
pub struct MultiCameraAdapter {
    layout: FieldLayout,
    ambiguity_cutoff: f64,
    cameras: Vec<CameraSlot>,
    last_timestamp: f64,
}

impl MultiCameraAdapter {
    pub fn new(layout: FieldLayout, ambiguity_cutoff: f64) -> Self {
        Self {
            layout,
            ambiguity_cutoff,
            cameras: Vec::new(),
            last_timestamp: 0.0,
        }
    }

    /// Add a camera mounted at `robot_to_camera`.  Cameras are polled in the
    /// order they are added.
    pub fn add_camera(&mut self, camera: Box<dyn TagCamera>, robot_to_camera: Transform3d) {
        self.cameras.push(CameraSlot {
            source: SourceId::new(SourceFamily::MultiCamera, camera.id()),
            camera,
            camera_to_robot: robot_to_camera.inverse(),
            has_targets: false,
        });
    }

    pub fn with_camera(mut self, camera: Box<dyn TagCamera>, robot_to_camera: Transform3d) -> Self {
        self.add_camera(camera, robot_to_camera);
        self
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Poll each camera once and return one candidate per successful solve,
    /// in camera order.  `now` is the robot clock, seconds.
    pub fn poll(&mut self, now: f64) -> Vec<PoseCandidate> {
        let mut candidates = Vec::new();
        for slot in &mut self.cameras {
            let Some(result) = slot.camera.latest_result() else {
                slot.has_targets = false;
                continue;
            };
            let solve = solve_robot_pose(
                &result,
                slot.camera_to_robot,
                &self.layout,
                self.ambiguity_cutoff,
            );
            slot.has_targets = solve.is_some();
            let Some(solve) = solve else {
                continue;
            };
            trace!(source = %slot.source, ?solve, "tag solve");
            self.last_timestamp = result.timestamp_seconds;
            candidates.push(PoseCandidate {
                pose: solve.pose,
                capture_timestamp: result.timestamp_seconds,
                latency_seconds: (now - result.timestamp_seconds).max(0.0),
                source: slot.source.clone(),
                has_target: true,
                target_count: solve.target_count,
                ambiguity: solve.ambiguity,
            });
        }
        candidates
    }

    /// `true` when any camera produced a robot pose on its last poll.  A frame
    /// whose only targets are too ambiguous or unknown does not count.
    pub fn has_targets(&self) -> bool {
        self.cameras.iter().any(|slot| slot.has_targets)
    }

    /// Capture timestamp of the most recent successful solve, seconds.
    pub fn last_timestamp(&self) -> f64 {
        self.last_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_layout::FieldDimensions;
    use fieldsight_geometry::{Pose3d, Rotation2d, Rotation3d, Translation3d};
    use fieldsight_hal::{MultiTagResult, SimTagCamera, TrackedTarget};
    use std::f64::consts::PI;

    const TAG_ID: u32 = 7;

    fn tag_pose() -> Pose3d {
        Pose3d::new(Translation3d::new(0.0, 5.5, 1.45), Rotation3d::identity())
    }

    fn layout() -> FieldLayout {
        FieldLayout::from_tags(FieldDimensions::default(), [(TAG_ID, tag_pose())])
    }

    fn mount() -> Transform3d {
        Transform3d::new(
            Translation3d::new(0.25, -0.1, 0.5),
            Rotation3d::from_rpy(0.0, -15f64.to_radians(), PI),
        )
    }

    fn robot_pose3d(pose: Pose2d) -> Transform3d {
        Transform3d::new(
            Translation3d::new(pose.x(), pose.y(), 0.0),
            Rotation3d::from_yaw(pose.heading().radians()),
        )
    }

    /// What a perfect camera on a robot at `robot` would report.
    fn frame_for(robot: Pose2d, ambiguity: f64, multi: bool) -> PipelineResult {
        let field_to_camera = robot_pose3d(robot).compose(mount());
        let tag = tag_pose();
        let camera_to_target =
            field_to_camera.inverse().compose(Transform3d::new(tag.translation, tag.rotation));
        PipelineResult {
            timestamp_seconds: 4.2,
            targets: vec![TrackedTarget {
                fiducial_id: TAG_ID,
                pose_ambiguity: ambiguity,
                best_camera_to_target: camera_to_target,
            }],
            multi_tag: multi.then(|| MultiTagResult {
                field_to_camera,
                fiducial_ids: vec![TAG_ID, 8],
            }),
        }
    }

    fn robot() -> Pose2d {
        Pose2d::new(3.0, 5.0, Rotation2d::from_degrees(170.0))
    }

    #[test]
    fn multi_tag_solve_recovers_robot_pose() {
        let solve =
            solve_robot_pose(&frame_for(robot(), 0.9, true), mount().inverse(), &layout(), 0.2)
                .expect("multi-tag result present");
        assert_eq!(solve.strategy, SolveStrategy::MultiTag);
        assert_eq!(solve.target_count, 2);
        assert!(solve.pose.approx_eq(robot(), 1e-9, 1e-9), "{:?}", solve.pose);
    }

    #[test]
    fn single_tag_solve_recovers_robot_pose() {
        let solve =
            solve_robot_pose(&frame_for(robot(), 0.05, false), mount().inverse(), &layout(), 0.2)
                .expect("unambiguous single tag");
        assert_eq!(solve.strategy, SolveStrategy::SingleTag { fiducial_id: TAG_ID });
        assert!(solve.pose.approx_eq(robot(), 1e-9, 1e-9), "{:?}", solve.pose);
        assert_eq!(solve.ambiguity, 0.05);
    }

    #[test]
    fn ambiguous_single_tag_is_discarded() {
        assert!(
            solve_robot_pose(&frame_for(robot(), 0.2, false), mount().inverse(), &layout(), 0.2)
                .is_none()
        );
    }

    #[test]
    fn unknown_tag_is_discarded() {
        let empty = FieldLayout::from_tags(FieldDimensions::default(), []);
        assert!(
            solve_robot_pose(&frame_for(robot(), 0.05, false), mount().inverse(), &empty, 0.2)
                .is_none()
        );
    }

    #[test]
    fn empty_frame_yields_nothing() {
        assert!(
            solve_robot_pose(&PipelineResult::default(), mount().inverse(), &layout(), 0.2)
                .is_none()
        );
    }

    #[test]
    fn adapter_polls_cameras_in_order() {
        let other = Pose2d::new(4.0, 4.0, Rotation2d::from_degrees(-150.0));
        let mut adapter = MultiCameraAdapter::new(layout(), 0.2)
            .with_camera(
                Box::new(SimTagCamera::new("photon_front").with_frame(frame_for(robot(), 0.9, true))),
                mount(),
            )
            .with_camera(
                Box::new(SimTagCamera::new("photon_rear").with_frame(frame_for(other, 0.1, false))),
                mount(),
            );
        assert_eq!(adapter.camera_count(), 2);

        let candidates = adapter.poll(4.25);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].source.name, "photon_front");
        assert_eq!(candidates[1].source.name, "photon_rear");
        assert!(candidates[1].pose.approx_eq(other, 1e-9, 1e-9));
        assert!((candidates[0].latency_seconds - 0.05).abs() < 1e-9);
        assert!(adapter.has_targets());
        assert_eq!(adapter.last_timestamp(), 4.2);
    }

    #[test]
    fn adapter_without_frames_reports_no_targets() {
        let mut adapter = MultiCameraAdapter::new(layout(), 0.2)
            .with_camera(Box::new(SimTagCamera::new("photon_front")), mount());
        assert!(adapter.poll(0.0).is_empty());
        assert!(!adapter.has_targets());
        assert_eq!(adapter.layout().len(), 1);
    }

    #[test]
    fn ambiguous_only_frame_reports_no_targets() {
        let mut adapter = MultiCameraAdapter::new(layout(), 0.2).with_camera(
            Box::new(SimTagCamera::new("photon_front").with_frame(frame_for(robot(), 0.9, false))),
            mount(),
        );
        assert!(adapter.poll(4.25).is_empty());
        assert!(!adapter.has_targets());
        assert_eq!(adapter.last_timestamp(), 0.0);
    }

    #[test]
    fn unknown_tag_frame_reports_no_targets() {
        let empty = FieldLayout::from_tags(FieldDimensions::default(), []);
        let mut adapter = MultiCameraAdapter::new(empty, 0.2).with_camera(
            Box::new(SimTagCamera::new("photon_front").with_frame(frame_for(robot(), 0.05, false))),
            mount(),
        );
        assert!(adapter.poll(4.25).is_empty());
        assert!(!adapter.has_targets());
    }
}
