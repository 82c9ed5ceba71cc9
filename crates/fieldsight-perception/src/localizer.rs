//! [`TargetLocalizer`] – monocular position of the tracked game object.
//!
//! The detector camera only reports two angles.  With a known camera height
//! and elevation and a known object height, the vertical angle gives the
//! floor distance and the horizontal angle gives the bearing:
//!
//! ```text
//! distance = (object_height − camera_height) / tan(elevation + vertical_offset)
//! camera→object = (distance·cos(bearing), distance·sin(bearing))
//! ```
//!
//! The result is expressed both relative to the robot and in the field frame.
//! A cycle without a usable observation keeps the previous poses.

use std::f64::consts::PI;

use fieldsight_geometry::{Pose2d, Rotation2d, Transform2d, Translation2d};
use fieldsight_types::VisionError;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::candidate::ObjectObservation;
use crate::config::VisionConfig;

/// `tan` values smaller than this make the distance meaningless.
const MIN_TAN: f64 = 1e-9;

// ────────────────────────────────────────────────────────────────────────────
// Geometry helpers
// ────────────────────────────────────────────────────────────────────────────

/// Floor distance from the camera to an object seen `vertical_offset_deg`
/// above the optical axis.
///
/// Fails with [`VisionError::DegenerateGeometry`] when the line of sight is
/// (nearly) horizontal or the result is not finite.
pub fn target_distance(
    camera_height_m: f64,
    camera_pitch_rad: f64,
    target_height_m: f64,
    vertical_offset_deg: f64,
) -> Result<f64, VisionError> {
    let angle_rad = camera_pitch_rad + vertical_offset_deg.to_radians();
    let tan = angle_rad.tan();
    if !tan.is_finite() || tan.abs() < MIN_TAN {
        return Err(VisionError::DegenerateGeometry { angle_rad });
    }
    let distance = (target_height_m - camera_height_m) / tan;
    if !distance.is_finite() {
        return Err(VisionError::DegenerateGeometry { angle_rad });
    }
    Ok(distance)
}

/// Camera → object offset on the floor plane.  `bearing_deg` is
/// counter-clockwise positive.
pub fn camera_to_target_translation(distance_m: f64, bearing_deg: f64) -> Translation2d {
    Translation2d::from_polar(distance_m, Rotation2d::from_degrees(bearing_deg))
}

/// The object as a pose in the camera frame, facing along the bearing.
pub fn camera_to_target_pose(translation: Translation2d, bearing_deg: f64) -> Pose2d {
    Pose2d::from_parts(translation, Rotation2d::from_degrees(bearing_deg))
}

/// Re-express a camera-frame object pose through `camera_to_robot`.
pub fn camera_pose_to_robot_relative(camera_to_target: Pose2d, camera_to_robot: Transform2d) -> Pose2d {
    camera_to_target.transform_by(camera_to_robot)
}

/// Field pose of an object given its robot-relative pose and the robot's
/// field pose.
pub fn object_pose_field_space(object_robot_relative: Pose2d, robot_field: Pose2d) -> Pose2d {
    robot_field.transform_by(Transform2d::from(object_robot_relative))
}

/// Robot-relative object pose.  The heading points from the object back
/// toward the robot origin.
pub fn robot_relative_object_pose(robot_to_camera: Transform2d, camera_to_object: Translation2d) -> Pose2d {
    let robot_to_object = robot_to_camera + Transform2d::new(camera_to_object, Rotation2d::identity());
    Pose2d::from_parts(
        robot_to_object.translation,
        robot_to_object.translation.angle() + Rotation2d::new(PI),
    )
}

/// Field-relative object pose.  The heading is the direction of the vector
/// from the object to the robot.
pub fn field_relative_object_pose(
    robot_field: Pose2d,
    robot_to_camera: Transform2d,
    camera_to_object: Translation2d,
) -> Pose2d {
    let camera_field = robot_field.transform_by(robot_to_camera);
    let object = camera_field.transform_by(Transform2d::new(camera_to_object, Rotation2d::identity()));
    let toward_robot = robot_field.translation - object.translation;
    Pose2d::from_parts(object.translation, toward_robot.angle())
}

// ────────────────────────────────────────────────────────────────────────────
// TargetLocalizer
// ────────────────────────────────────────────────────────────────────────────

/// Fixed detector camera geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorGeometry {
    pub camera_height_m: f64,
    /// Elevation of the optical axis, radians, positive up.
    pub camera_pitch_rad: f64,
    pub robot_to_camera: Transform2d,
    pub object_height_m: f64,
}

impl DetectorGeometry {
    pub fn from_config(config: &VisionConfig) -> Self {
        Self {
            camera_height_m: config.detector_mount.up_m,
            camera_pitch_rad: config.detector_mount.elevation_rad(),
            robot_to_camera: config.detector_mount.robot_to_camera_2d(),
            object_height_m: config.object_height_m,
        }
    }
}

/// Last known position of the tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectPoses {
    pub field_relative: Pose2d,
    pub robot_relative: Pose2d,
}

/// Keeps [`ObjectPoses`] current from detector observations.
#[derive(Debug, Clone)]
pub struct TargetLocalizer {
    geometry: DetectorGeometry,
    poses: ObjectPoses,
    has_fix: bool,
}

impl TargetLocalizer {
    pub fn new(geometry: DetectorGeometry) -> Self {
        Self {
            geometry,
            poses: ObjectPoses::default(),
            has_fix: false,
        }
    }

    pub fn geometry(&self) -> &DetectorGeometry {
        &self.geometry
    }

    /// Fold one cycle's observation into the cached poses.
    ///
    /// `reference` is the robot's field pose for this cycle.  Returns
    /// `Ok(true)` when the poses were refreshed, `Ok(false)` when nothing was
    /// visible.  On [`VisionError::DegenerateGeometry`] the cache is left
    /// untouched.
    pub fn update(
        &mut self,
        observation: Option<ObjectObservation>,
        reference: Pose2d,
    ) -> Result<bool, VisionError> {
        let Some(obs) = observation.filter(|o| o.visible) else {
            return Ok(false);
        };
        let g = &self.geometry;
        let distance = target_distance(
            g.camera_height_m,
            g.camera_pitch_rad,
            g.object_height_m,
            obs.vertical_offset_deg,
        )?;
        let offset = camera_to_target_translation(distance, obs.horizontal_offset_deg);

        self.poses = ObjectPoses {
            robot_relative: robot_relative_object_pose(g.robot_to_camera, offset),
            field_relative: field_relative_object_pose(reference, g.robot_to_camera, offset),
        };
        self.has_fix = true;
        trace!(distance, poses = ?self.poses, "object localized");
        Ok(true)
    }

    pub fn poses(&self) -> ObjectPoses {
        self.poses
    }

    /// `true` once any observation has been localized.
    pub fn has_fix(&self) -> bool {
        self.has_fix
    }
}
