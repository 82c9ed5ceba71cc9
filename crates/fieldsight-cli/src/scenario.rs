//! Simulated match: a robot driving laps around the field centre.
//!
//! The scenario owns the ground truth and publishes what each pipeline
//! would report for it.  A few deliberate faults keep the gate honest:
//! the fiducial pipeline drops out for a short window every lap and now
//! and then reports a single-marker pose outside the field.

use std::f64::consts::TAU;
use std::sync::{Arc, RwLock};

use fieldsight_geometry::{Pose2d, Rotation2d, Rotation3d, Transform3d, Translation2d, Translation3d};
use fieldsight_hal::{MemoryTable, MultiTagResult, PipelineResult, SimLimelight, TagCamera};
use fieldsight_perception::{CameraMount, VisionConfig};

const CENTRE: (f64, f64) = (8.27, 4.1);
const RADIUS_X: f64 = 5.0;
const RADIUS_Y: f64 = 2.5;
/// Seconds per lap.
const LAP_S: f64 = 16.0;
/// The game object lies on the floor here.
pub const OBJECT: (f64, f64) = (13.6, 4.1);
/// Horizontal half field of view of the detector, degrees.
const DETECTOR_HALF_FOV_DEG: f64 = 29.8;

/// Ground truth shared between the scenario and its simulated cameras.
#[derive(Debug, Clone, Default)]
pub struct Truth {
    inner: Arc<RwLock<(Pose2d, f64)>>,
}

impl Truth {
    fn set(&self, pose: Pose2d, now: f64) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = (pose, now);
    }

    fn get(&self) -> (Pose2d, f64) {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Robot pose at time `t` on the elliptical lap, facing along the path.
pub fn truth_at(t: f64) -> Pose2d {
    let phase = TAU * t / LAP_S;
    let x = CENTRE.0 + RADIUS_X * phase.cos();
    let y = CENTRE.1 + RADIUS_Y * phase.sin();
    let heading = Rotation2d::from_vector(-RADIUS_X * phase.sin(), RADIUS_Y * phase.cos());
    Pose2d::new(x, y, heading)
}

/// Joint-solve tag camera that reports only when two markers are in view,
/// which the scenario approximates as "robot in the far half of the field".
pub struct ScenarioCamera {
    name: String,
    truth: Truth,
    robot_to_camera: Transform3d,
    latency_s: f64,
}

impl ScenarioCamera {
    pub fn new(name: impl Into<String>, mount: &CameraMount, truth: Truth) -> Self {
        Self {
            name: name.into(),
            truth,
            robot_to_camera: mount.robot_to_camera(),
            latency_s: 0.03,
        }
    }
}

impl TagCamera for ScenarioCamera {
    fn id(&self) -> &str {
        &self.name
    }

    fn latest_result(&mut self) -> Option<PipelineResult> {
        let (robot, now) = self.truth.get();
        if robot.x() < CENTRE.0 {
            return Some(PipelineResult {
                timestamp_seconds: now - self.latency_s,
                ..PipelineResult::default()
            });
        }
        let field_to_robot = Transform3d::new(
            Translation3d::new(robot.x(), robot.y(), 0.0),
            Rotation3d::from_yaw(robot.heading().radians()),
        );
        Some(PipelineResult {
            timestamp_seconds: now - self.latency_s,
            targets: Vec::new(),
            multi_tag: Some(MultiTagResult {
                field_to_camera: field_to_robot.compose(self.robot_to_camera),
                fiducial_ids: vec![3, 4],
            }),
        })
    }
}

/// Drives the simulated pipelines from the ground truth.
pub struct Scenario {
    truth: Truth,
    fiducial: SimLimelight,
    detector: SimLimelight,
    detector_mount: CameraMount,
    object_height_m: f64,
}

impl Scenario {
    pub fn new(config: &VisionConfig, fiducial: MemoryTable, detector: MemoryTable) -> Self {
        Self {
            truth: Truth::default(),
            fiducial: SimLimelight::new(fiducial),
            detector: SimLimelight::new(detector),
            detector_mount: config.detector_mount,
            object_height_m: config.object_height_m,
        }
    }

    pub fn truth(&self) -> Truth {
        self.truth.clone()
    }

    /// Advance to tick `tick` at time `now` and publish every pipeline.
    /// Returns the ground-truth pose.
    pub fn step(&self, tick: u64, now: f64) -> Pose2d {
        let robot = truth_at(now);
        self.truth.set(robot, now);
        self.publish_fiducial(tick, now, robot);
        self.publish_detector(robot);
        robot
    }

    fn publish_fiducial(&self, tick: u64, now: f64, robot: Pose2d) {
        if (2.0..2.5).contains(&now.rem_euclid(LAP_S)) {
            self.fiducial.disconnect();
            return;
        }
        if tick % 37 == 0 {
            // Reflection off the driver station glass.
            let ghost = Pose2d::new(robot.x() + 17.0, robot.y(), robot.heading());
            self.fiducial.publish_fiducials(ghost, &[7], 11.0, 25.0);
            return;
        }
        let tags: &[u32] = if robot.x() < CENTRE.0 { &[7, 8] } else { &[4] };
        self.fiducial.publish_fiducials(robot, tags, 11.0, 25.0);
    }

    fn publish_detector(&self, robot: Pose2d) {
        let camera = robot.transform_by(self.detector_mount.robot_to_camera_2d());
        let object = Pose2d::new(OBJECT.0, OBJECT.1, Rotation2d::identity());
        let rel: Translation2d = object.relative_to(camera).translation;
        let bearing_deg = rel.angle().degrees();
        if rel.x <= 0.2 || bearing_deg.abs() > DETECTOR_HALF_FOV_DEG {
            self.detector.publish_no_target();
            return;
        }
        let sight_deg = ((self.object_height_m - self.detector_mount.up_m) / rel.norm())
            .atan()
            .to_degrees();
        self.detector
            .publish_detection(-bearing_deg, sight_deg - self.detector_mount.pitch_deg);
    }
}
