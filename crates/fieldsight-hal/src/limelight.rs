//! [`LimelightPipeline`] – Limelight-style coprocessor on a [`VisionTable`].
//!
//! The coprocessor publishes one table per camera.  A non-empty `json`
//! entry (the full result dump) is the only freshness signal: when it is
//! empty or missing the pipeline is treated as disconnected and every read
//! returns `None`.
//!
//! | Key | Meaning |
//! |---|---|
//! | `json` | Result dump; `Results.Fiducial[]` lists the visible markers |
//! | `tv` | `1` when a target is in view |
//! | `tx`, `ty` | Horizontal / vertical offset of the primary target, degrees |
//! | `tl`, `cl` | Pipeline and capture latency, milliseconds |
//! | `botpose_wpiblue` | `[x, y, z, roll, pitch, yaw]`, blue-origin field frame |
//! | `botpose_targetspace` | Robot pose relative to the primary marker |
//! | `targetpose_robotspace` | Primary marker relative to the robot |

use fieldsight_geometry::{Pose2d, Rotation2d, Transform3d};
use serde::Deserialize;
use tracing::debug;

use crate::pipeline::{
    DetectorPipeline, DetectorReading, FiducialPipeline, FiducialReading, LedMode,
    PipelineSettings, VisionPipeline,
};
use crate::table::VisionTable;

pub const KEY_JSON: &str = "json";
pub const KEY_TV: &str = "tv";
pub const KEY_TX: &str = "tx";
pub const KEY_TY: &str = "ty";
pub const KEY_TL: &str = "tl";
pub const KEY_CL: &str = "cl";
pub const KEY_BOTPOSE_WPIBLUE: &str = "botpose_wpiblue";
pub const KEY_BOTPOSE_TARGETSPACE: &str = "botpose_targetspace";
pub const KEY_TARGETPOSE_ROBOTSPACE: &str = "targetpose_robotspace";
pub const KEY_LED_MODE: &str = "ledMode";
pub const KEY_PIPELINE: &str = "pipeline";
pub const KEY_CAMERAPOSE_ROBOTSPACE_SET: &str = "camerapose_robotspace_set";

// Only the parts of the result dump the adapters consume.
#[derive(Debug, Default, Deserialize)]
struct ResultDump {
    #[serde(rename = "Results", default)]
    results: TargetingResults,
}

#[derive(Debug, Default, Deserialize)]
struct TargetingResults {
    #[serde(rename = "Fiducial", default)]
    fiducials: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FiducialEntry {
    #[serde(rename = "fID")]
    id: u32,
}

/// A Limelight-style pipeline reading from `T`.
pub struct LimelightPipeline<T: VisionTable> {
    table: T,
}

impl<T: VisionTable> LimelightPipeline<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// `true` when the coprocessor has published a non-empty result dump.
    pub fn is_connected(&self) -> bool {
        self.results_dump().is_some()
    }

    fn results_dump(&self) -> Option<String> {
        self.table
            .get_string(KEY_JSON)
            .filter(|dump| !dump.is_empty())
    }

    fn has_target(&self) -> bool {
        self.number(KEY_TV) == 1.0
    }

    fn number(&self, key: &str) -> f64 {
        self.table.get_number(key).unwrap_or(0.0)
    }

    fn pose_entry(&self, key: &str) -> Option<Pose2d> {
        self.table
            .get_number_array(key)
            .as_deref()
            .and_then(pose2d_from_array)
    }
}

/// Planar projection of a `[x, y, z, roll, pitch, yaw_deg, ...]` array.
/// Arrays shorter than six entries carry no usable pose.
pub fn pose2d_from_array(values: &[f64]) -> Option<Pose2d> {
    if values.len() < 6 {
        return None;
    }
    Some(Pose2d::new(
        values[0],
        values[1],
        Rotation2d::from_degrees(values[5]),
    ))
}

/// Marker ids listed in a result dump.  A dump that cannot be parsed lists
/// no markers; an entry without a valid id is skipped.
pub fn fiducial_ids(dump: &str) -> Vec<u32> {
    match serde_json::from_str::<ResultDump>(dump) {
        Ok(parsed) => parsed
            .results
            .fiducials
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<FiducialEntry>(entry) {
                Ok(f) => Some(f.id),
                Err(e) => {
                    debug!(error = %e, "skipping fiducial entry");
                    None
                }
            })
            .collect(),
        Err(e) => {
            debug!(error = %e, "unparsable result dump");
            Vec::new()
        }
    }
}

fn led_mode_value(mode: LedMode) -> f64 {
    match mode {
        LedMode::PipelineDefault => 0.0,
        LedMode::ForceOff => 1.0,
        LedMode::ForceBlink => 2.0,
        LedMode::ForceOn => 3.0,
    }
}

/// `[forward, side, up, roll, pitch, yaw]` with angles in degrees.
fn camera_pose_values(robot_to_camera: &Transform3d) -> [f64; 6] {
    let t = robot_to_camera.translation;
    let r = robot_to_camera.rotation;
    [
        t.x,
        t.y,
        t.z,
        r.roll().to_degrees(),
        r.pitch().to_degrees(),
        r.yaw().to_degrees(),
    ]
}

impl<T: VisionTable> VisionPipeline for LimelightPipeline<T> {
    fn id(&self) -> &str {
        self.table.name()
    }

    fn configure(&mut self, settings: &PipelineSettings) {
        self.table
            .set_number(KEY_LED_MODE, led_mode_value(settings.led_mode));
        self.table
            .set_number(KEY_PIPELINE, f64::from(settings.pipeline_index));
        if let Some(mount) = &settings.robot_to_camera {
            self.table
                .set_number_array(KEY_CAMERAPOSE_ROBOTSPACE_SET, &camera_pose_values(mount));
        }
        debug!(table = self.table.name(), ?settings, "pipeline configured");
    }
}

impl<T: VisionTable> FiducialPipeline for LimelightPipeline<T> {
    fn latest_fiducial(&mut self) -> Option<FiducialReading> {
        let dump = self.results_dump()?;
        Some(FiducialReading {
            has_target: self.has_target(),
            robot_pose: self.pose_entry(KEY_BOTPOSE_WPIBLUE),
            tag_ids: fiducial_ids(&dump),
            pipeline_latency_ms: self.number(KEY_TL),
            capture_latency_ms: self.number(KEY_CL),
        })
    }

    fn robot_pose_target_space(&self) -> Option<Pose2d> {
        self.results_dump()?;
        self.pose_entry(KEY_BOTPOSE_TARGETSPACE)
    }

    fn target_pose_robot_space(&self) -> Option<Pose2d> {
        self.results_dump()?;
        self.pose_entry(KEY_TARGETPOSE_ROBOTSPACE)
    }
}

impl<T: VisionTable> DetectorPipeline for LimelightPipeline<T> {
    fn latest_detection(&mut self) -> Option<DetectorReading> {
        self.results_dump()?;
        Some(DetectorReading {
            has_target: self.has_target(),
            tx_deg: self.number(KEY_TX),
            ty_deg: self.number(KEY_TY),
        })
    }
}
