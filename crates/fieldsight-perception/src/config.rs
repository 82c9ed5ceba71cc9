//! Static vision constants, read once at startup.
//!
//! Every field has a serde default so a partial TOML table is enough.

use std::path::PathBuf;

use fieldsight_geometry::{Rotation2d, Rotation3d, Transform2d, Transform3d, Translation2d, Translation3d};
use fieldsight_hal::{LedMode, PipelineSettings};
use serde::{Deserialize, Serialize};

use crate::field_layout::FieldDimensions;

/// Where a camera sits on the robot, in the robot frame.
///
/// `pitch_deg` is an elevation angle: positive tilts the lens upward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraMount {
    pub forward_m: f64,
    pub left_m: f64,
    pub up_m: f64,
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64,
}

impl CameraMount {
    /// Robot → camera as a right-handed 3-D transform.  Positive rotation
    /// about +Y tips the lens down, hence the sign flip on the elevation.
    pub fn robot_to_camera(&self) -> Transform3d {
        Transform3d::new(
            Translation3d::new(self.forward_m, self.left_m, self.up_m),
            Rotation3d::from_rpy(
                self.roll_deg.to_radians(),
                -self.pitch_deg.to_radians(),
                self.yaw_deg.to_radians(),
            ),
        )
    }

    pub fn camera_to_robot(&self) -> Transform3d {
        self.robot_to_camera().inverse()
    }

    /// Planar part of the mount: floor position and yaw.
    pub fn robot_to_camera_2d(&self) -> Transform2d {
        Transform2d::new(
            Translation2d::new(self.forward_m, self.left_m),
            Rotation2d::from_degrees(self.yaw_deg),
        )
    }

    pub fn elevation_rad(&self) -> f64 {
        self.pitch_deg.to_radians()
    }
}

/// One camera of the multi-camera family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCameraConfig {
    pub name: String,
    #[serde(default)]
    pub mount: CameraMount,
}

/// All startup constants of the vision core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub fiducial_enabled: bool,
    pub multi_camera_enabled: bool,
    pub detector_enabled: bool,

    pub fiducial_table: String,
    pub fiducial_pipeline: u32,
    pub fiducial_mount: CameraMount,

    pub detector_table: String,
    pub detector_pipeline: u32,
    pub detector_mount: CameraMount,

    pub tag_cameras: Vec<TagCameraConfig>,
    /// Single-marker solves at or above this ambiguity are discarded.
    pub ambiguity_cutoff: f64,
    /// WPILib-format AprilTag layout; required by the multi-camera family.
    pub field_layout_path: Option<PathBuf>,

    pub field: FieldDimensions,
    /// Height of the tracked object's centre above the floor.
    pub object_height_m: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            fiducial_enabled: true,
            multi_camera_enabled: false,
            detector_enabled: true,
            fiducial_table: "limelight".to_string(),
            fiducial_pipeline: 0,
            fiducial_mount: CameraMount {
                forward_m: 0.28,
                left_m: 0.0,
                up_m: 0.52,
                pitch_deg: 20.0,
                ..CameraMount::default()
            },
            detector_table: "limelight-nn".to_string(),
            detector_pipeline: 1,
            detector_mount: CameraMount {
                forward_m: 0.30,
                left_m: 0.0,
                up_m: 0.45,
                pitch_deg: -20.0,
                ..CameraMount::default()
            },
            tag_cameras: vec![TagCameraConfig {
                name: "photon_front".to_string(),
                mount: CameraMount {
                    forward_m: 0.25,
                    left_m: 0.0,
                    up_m: 0.50,
                    pitch_deg: 15.0,
                    ..CameraMount::default()
                },
            }],
            ambiguity_cutoff: 0.2,
            field_layout_path: None,
            field: FieldDimensions::default(),
            object_height_m: 0.0,
        }
    }
}

impl VisionConfig {
    /// Startup settings for the fiducial pipeline: LEDs on, mount published.
    pub fn fiducial_settings(&self) -> PipelineSettings {
        PipelineSettings {
            pipeline_index: self.fiducial_pipeline,
            led_mode: LedMode::ForceOn,
            robot_to_camera: Some(self.fiducial_mount.robot_to_camera()),
        }
    }

    /// Startup settings for the detector pipeline: LEDs off.
    pub fn detector_settings(&self) -> PipelineSettings {
        PipelineSettings {
            pipeline_index: self.detector_pipeline,
            led_mode: LedMode::ForceOff,
            robot_to_camera: None,
        }
    }
}
