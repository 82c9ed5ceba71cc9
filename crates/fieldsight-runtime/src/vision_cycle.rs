//! [`VisionCycle`] – one control cycle of the vision core.
//!
//! Each [`VisionCycle::tick`]:
//!
//! 1. **Fuse** – [`FusionEngine::update`] polls the fiducial and
//!    multi-camera families and updates the accepted pose.
//! 2. **Localize** – the detector observation is projected onto the field
//!    using the caller's odometry pose, or the just-fused pose when none is
//!    supplied.
//! 3. **Publish** – a [`VisionSnapshot`] is written to the [`PoseBoard`].
//!
//! Construction never fails: a family whose backend or field layout is
//! missing is disabled for the session and the rest keeps running.
//!
//! # Example
//!
//! ```rust
//! use fieldsight_hal::{LimelightPipeline, MemoryTable};
//! use fieldsight_perception::VisionConfig;
//! use fieldsight_runtime::{VisionBackends, VisionCycle};
//!
//! let config = VisionConfig::default();
//! let backends = VisionBackends {
//!     fiducial: Some(Box::new(LimelightPipeline::new(MemoryTable::new("limelight")))),
//!     ..VisionBackends::default()
//! };
//! let mut cycle = VisionCycle::new(&config, backends);
//! let snapshot = cycle.tick(0.02, None);
//! assert_eq!(snapshot.tick, 1);
//! assert_eq!(cycle.board().read().tick, 1);
//! ```

use std::sync::{Arc, RwLock};

use fieldsight_geometry::Pose2d;
use fieldsight_hal::{DetectorPipeline, FiducialPipeline, TagCamera};
use fieldsight_perception::{
    ConfidenceGate, DetectorAdapter, DetectorGeometry, FiducialAdapter, FieldLayout,
    FusedPoseState, FusionEngine, MultiCameraAdapter, ObjectPoses, TargetLocalizer, VisionConfig,
};
use fieldsight_types::{SourceFamily, SourceId, VisionError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot + board
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the rest of the robot reads from the vision core.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisionSnapshot {
    /// Number of ticks run so far.
    pub tick: u64,
    /// Robot clock at the tick, seconds.
    pub timestamp: f64,
    pub fused: FusedPoseState,
    /// Source that wrote the pose this tick, if any.
    pub accepted_source: Option<SourceId>,
    pub object: ObjectPoses,
    /// `true` when the object poses were refreshed this tick.  A detection
    /// that could not be localized leaves this `false`.
    pub object_visible: bool,
}

/// Shared, copy-on-read holder of the latest [`VisionSnapshot`].
///
/// Cloning the board clones the handle; all clones see the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct PoseBoard {
    inner: Arc<RwLock<VisionSnapshot>>,
}

impl PoseBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: VisionSnapshot) {
        let mut current = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *current = snapshot;
    }

    /// A copy of the latest snapshot.
    pub fn read(&self) -> VisionSnapshot {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backends
// ─────────────────────────────────────────────────────────────────────────────

/// Hardware (or simulated) pipelines handed to [`VisionCycle::new`].
///
/// Tag cameras are matched to `VisionConfig::tag_cameras` by name.
#[derive(Default)]
pub struct VisionBackends {
    pub fiducial: Option<Box<dyn FiducialPipeline>>,
    pub detector: Option<Box<dyn DetectorPipeline>>,
    pub tag_cameras: Vec<Box<dyn TagCamera>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// VisionCycle
// ─────────────────────────────────────────────────────────────────────────────

/// Owns every vision component and runs them in a fixed order.
pub struct VisionCycle {
    fusion: FusionEngine,
    detector: Option<DetectorAdapter>,
    localizer: TargetLocalizer,
    board: PoseBoard,
    ticks: u64,
}

impl VisionCycle {
    /// Build the cycle from startup constants and the available backends.
    pub fn new(config: &VisionConfig, backends: VisionBackends) -> Self {
        let mut fusion = FusionEngine::new(ConfidenceGate::new(config.field));

        if config.fiducial_enabled {
            match backends.fiducial {
                Some(pipeline) => {
                    let adapter = FiducialAdapter::new(pipeline, &config.fiducial_settings());
                    info!(source = %adapter.source(), "fiducial family enabled");
                    fusion = fusion.with_fiducial(adapter);
                }
                None => fusion.disable_family(
                    SourceFamily::Fiducial,
                    unavailable(&config.fiducial_table, "no pipeline backend"),
                ),
            }
        }

        if config.multi_camera_enabled {
            match build_multi_camera(config, backends.tag_cameras) {
                Ok(adapter) => {
                    info!(cameras = adapter.camera_count(), tags = adapter.layout().len(), "multi-camera family enabled");
                    fusion = fusion.with_multi_camera(adapter);
                }
                Err(e) => fusion.disable_family(SourceFamily::MultiCamera, e),
            }
        }

        let detector = match (config.detector_enabled, backends.detector) {
            (true, Some(pipeline)) => Some(DetectorAdapter::new(pipeline, &config.detector_settings())),
            (true, None) => {
                warn!(table = %config.detector_table, "object detection disabled: no pipeline backend");
                None
            }
            (false, _) => None,
        };

        Self {
            fusion,
            detector,
            localizer: TargetLocalizer::new(DetectorGeometry::from_config(config)),
            board: PoseBoard::new(),
            ticks: 0,
        }
    }

    /// Run one cycle at robot time `now` (seconds).  `odometry` is the
    /// drivetrain's current field pose, if the caller has one.
    #[instrument(name = "vision_cycle", skip(self, odometry), fields(tick = self.ticks + 1))]
    pub fn tick(&mut self, now: f64, odometry: Option<Pose2d>) -> VisionSnapshot {
        self.ticks += 1;

        let accepted_source = self.fusion.update(now);

        let reference = odometry.unwrap_or(self.fusion.state().accepted_pose);
        let observation = self.detector.as_mut().and_then(|d| d.poll());
        let object_fresh = match self.localizer.update(observation, reference) {
            Ok(fresh) => fresh,
            Err(e) => {
                debug!(error = %e, "object localization skipped");
                false
            }
        };

        let snapshot = VisionSnapshot {
            tick: self.ticks,
            timestamp: now,
            fused: self.fusion.state().clone(),
            accepted_source,
            object: self.localizer.poses(),
            object_visible: object_fresh,
        };
        self.board.publish(snapshot.clone());
        snapshot
    }

    /// A handle to the published snapshots, for telemetry readers.
    pub fn board(&self) -> PoseBoard {
        self.board.clone()
    }

    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    pub fn localizer(&self) -> &TargetLocalizer {
        &self.localizer
    }

    /// Robot pose with the primary marker as origin, when the fiducial
    /// family is running and sees one.
    pub fn robot_pose_target_space(&self) -> Option<Pose2d> {
        self.fusion.fiducial().and_then(|f| f.robot_pose_target_space())
    }

    /// Primary marker relative to the robot.
    pub fn target_pose_robot_space(&self) -> Option<Pose2d> {
        self.fusion.fiducial().and_then(|f| f.target_pose_robot_space())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn unavailable(component: &str, details: &str) -> VisionError {
    VisionError::SourceUnavailable {
        component: component.to_string(),
        details: details.to_string(),
    }
}

fn build_multi_camera(
    config: &VisionConfig,
    cameras: Vec<Box<dyn TagCamera>>,
) -> Result<MultiCameraAdapter, VisionError> {
    let path = config
        .field_layout_path
        .as_deref()
        .ok_or_else(|| VisionError::Config("field_layout_path is not set".to_string()))?;
    let layout = FieldLayout::load(path)?;

    let mut adapter = MultiCameraAdapter::new(layout, config.ambiguity_cutoff);
    for camera in cameras {
        let Some(entry) = config.tag_cameras.iter().find(|c| c.name == camera.id()) else {
            warn!(camera = camera.id(), "tag camera has no configured mount; ignored");
            continue;
        };
        let mount = entry.mount.robot_to_camera();
        adapter.add_camera(camera, mount);
    }
    if adapter.camera_count() == 0 {
        return Err(unavailable("tag_cameras", "no configured camera has a backend"));
    }
    Ok(adapter)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use fieldsight_geometry::{Rotation2d, Rotation3d, Transform3d, Translation3d};
    use fieldsight_hal::{
        LimelightPipeline, MemoryTable, MultiTagResult, PipelineResult, SimLimelight,
        SimTagCamera, TrackedTarget,
    };

    const LAYOUT: &str = r#"{
        "tags": [
            { "ID": 7, "pose": { "translation": { "x": -0.0381, "y": 5.547868, "z": 1.451102 },
              "rotation": { "quaternion": { "W": 1.0, "X": 0.0, "Y": 0.0, "Z": 0.0 } } } }
        ],
        "field": { "length": 16.541, "width": 8.211 }
    }"#;

    struct Rig {
        fiducial: SimLimelight,
        detector: SimLimelight,
    }

    fn rig(config: &VisionConfig, cameras: Vec<Box<dyn TagCamera>>) -> (Rig, VisionCycle) {
        let fid_table = MemoryTable::new("limelight");
        let det_table = MemoryTable::new("limelight-nn");
        let rig = Rig {
            fiducial: SimLimelight::new(fid_table.clone()),
            detector: SimLimelight::new(det_table.clone()),
        };
        let backends = VisionBackends {
            fiducial: Some(Box::new(LimelightPipeline::new(fid_table))),
            detector: Some(Box::new(LimelightPipeline::new(det_table))),
            tag_cameras: cameras,
        };
        (rig, VisionCycle::new(config, backends))
    }

    fn layout_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LAYOUT.as_bytes()).unwrap();
        file
    }

    #[test]
    fn tick_fuses_then_localizes_against_fused_pose() {
        let config = VisionConfig::default();
        let (rig, mut cycle) = rig(&config, Vec::new());
        let robot = Pose2d::new(5.0, 4.0, Rotation2d::from_degrees(90.0));
        rig.fiducial.publish_fiducials(robot, &[7, 8], 11.0, 9.0);
        rig.detector.publish_detection(0.0, -25.0);

        let snap = cycle.tick(3.0, None);
        assert_eq!(snap.accepted_source.as_ref().map(|s| s.family), Some(SourceFamily::Fiducial));
        assert!(snap.fused.accepted_pose.approx_eq(robot, 1e-9, 1e-9));
        assert!((snap.fused.total_latency_seconds - 0.02).abs() < 1e-12);
        assert!(snap.object_visible);
        // Robot faces +Y, so the object lies straight ahead along +Y.
        assert!((snap.object.field_relative.x() - 5.0).abs() < 1e-9);
        assert!(snap.object.field_relative.y() > 4.0);
        assert_eq!(cycle.board().read(), snap);
    }

    #[test]
    fn odometry_pose_is_the_localizer_reference() {
        let config = VisionConfig::default();
        let (rig, mut cycle) = rig(&config, Vec::new());
        rig.detector.publish_detection(0.0, -25.0);

        let odometry = Pose2d::new(10.0, 2.0, Rotation2d::identity());
        let snap = cycle.tick(1.0, Some(odometry));
        assert!(snap.object.field_relative.x() > 10.0);
        assert!((snap.object.field_relative.y() - 2.0).abs() < 1e-9);
        assert!(snap.accepted_source.is_none());
    }

    #[test]
    fn hidden_object_keeps_last_known_pose() {
        let config = VisionConfig::default();
        let (rig, mut cycle) = rig(&config, Vec::new());
        rig.detector.publish_detection(5.0, -25.0);
        let first = cycle.tick(1.0, Some(Pose2d::identity()));

        rig.detector.publish_no_target();
        let second = cycle.tick(1.02, Some(Pose2d::new(3.0, 3.0, Rotation2d::identity())));
        assert!(!second.object_visible);
        assert_eq!(second.object, first.object);
        assert_eq!(second.tick, 2);
    }

    #[test]
    fn unlocalizable_detection_is_not_visible() {
        let config = VisionConfig::default();
        let (rig, mut cycle) = rig(&config, Vec::new());
        rig.detector.publish_detection(0.0, -25.0);
        let first = cycle.tick(1.0, Some(Pose2d::identity()));
        assert!(first.object_visible);

        // Line of sight parallel to the floor: the distance is undefined.
        let pitch = config.detector_mount.pitch_deg;
        rig.detector.publish_detection(0.0, -pitch);
        let second = cycle.tick(1.02, Some(Pose2d::new(3.0, 3.0, Rotation2d::identity())));
        assert!(!second.object_visible);
        assert_eq!(second.object, first.object);
    }

    #[test]
    fn missing_layout_disables_multi_camera_only() {
        let config = VisionConfig {
            multi_camera_enabled: true,
            field_layout_path: Some("/nonexistent/layout.json".into()),
            ..VisionConfig::default()
        };
        let (rig, mut cycle) = rig(&config, vec![Box::new(SimTagCamera::new("photon_front"))]);
        assert!(cycle.fusion().is_disabled(SourceFamily::MultiCamera));
        assert!(!cycle.fusion().is_disabled(SourceFamily::Fiducial));

        rig.fiducial.publish_fiducials(Pose2d::new(1.0, 1.0, Rotation2d::identity()), &[1], 0.0, 0.0);
        assert!(cycle.tick(1.0, None).accepted_source.is_some());
    }

    #[test]
    fn multi_camera_overrides_fiducial_in_the_same_tick() {
        let file = layout_file();
        let mut config = VisionConfig {
            multi_camera_enabled: true,
            field_layout_path: Some(file.path().to_path_buf()),
            ..VisionConfig::default()
        };
        config.tag_cameras[0].mount = Default::default();

        let robot = Pose2d::new(2.0, 5.5, Rotation2d::from_degrees(180.0));
        let field_to_camera = Transform3d::new(
            Translation3d::new(robot.x(), robot.y(), 0.0),
            Rotation3d::from_yaw(robot.heading().radians()),
        );
        let frame = PipelineResult {
            timestamp_seconds: 0.97,
            targets: vec![TrackedTarget {
                fiducial_id: 7,
                pose_ambiguity: 0.4,
                best_camera_to_target: Transform3d::identity(),
            }],
            multi_tag: Some(MultiTagResult {
                field_to_camera,
                fiducial_ids: vec![7, 8],
            }),
        };
        let camera = SimTagCamera::new("photon_front").with_frame(frame);
        let (rig, mut cycle) = rig(&config, vec![Box::new(camera)]);
        rig.fiducial.publish_fiducials(Pose2d::new(8.0, 4.0, Rotation2d::identity()), &[3], 0.0, 0.0);

        let snap = cycle.tick(1.0, None);
        let source = snap.accepted_source.expect("written");
        assert_eq!(source.family, SourceFamily::MultiCamera);
        assert_eq!(source.name, "photon_front");
        assert!(snap.fused.accepted_pose.approx_eq(robot, 1e-9, 1e-9));
        assert!(snap.fused.fiducial_has_target);
        assert!(snap.fused.multi_camera_has_targets);
    }

    #[test]
    fn unmatched_tag_camera_disables_family() {
        let file = layout_file();
        let config = VisionConfig {
            multi_camera_enabled: true,
            field_layout_path: Some(file.path().to_path_buf()),
            ..VisionConfig::default()
        };
        let (_rig, cycle) = rig(&config, vec![Box::new(SimTagCamera::new("photon_rear"))]);
        let disabled = cycle.fusion().disabled_families();
        assert_eq!(disabled.len(), 1);
        assert!(matches!(disabled[0].1, VisionError::SourceUnavailable { .. }));
    }

    #[test]
    fn missing_backends_do_not_stop_the_cycle() {
        let mut cycle = VisionCycle::new(&VisionConfig::default(), VisionBackends::default());
        assert!(cycle.fusion().is_disabled(SourceFamily::Fiducial));
        let snap = cycle.tick(0.5, None);
        assert!(snap.accepted_source.is_none());
        assert!(!snap.object_visible);
        assert!(cycle.robot_pose_target_space().is_none());
        assert_eq!(cycle.ticks(), 1);
    }

    #[test]
    fn board_clones_share_the_snapshot() {
        let board = PoseBoard::new();
        let reader = board.clone();
        board.publish(VisionSnapshot {
            tick: 9,
            ..VisionSnapshot::default()
        });
        assert_eq!(reader.read().tick, 9);
    }
}
