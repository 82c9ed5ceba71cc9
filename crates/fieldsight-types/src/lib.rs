use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The vision pipeline family a pose or observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFamily {
    /// Fiducial-tag pipeline that reports a field pose directly (Limelight-style).
    Fiducial,
    /// One or more cameras solving 3-D tag poses (PhotonVision-style).
    MultiCamera,
    /// Object-detection pipeline that only reports bearing/elevation angles.
    ObjectDetection,
}

impl fmt::Display for SourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFamily::Fiducial => write!(f, "fiducial"),
            SourceFamily::MultiCamera => write!(f, "multi_camera"),
            SourceFamily::ObjectDetection => write!(f, "object_detection"),
        }
    }
}

/// Identifies a single vision source, e.g. `fiducial:limelight`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId {
    pub family: SourceFamily,
    /// Table or camera name as configured on the robot.
    pub name: String,
}

impl SourceId {
    pub fn new(family: SourceFamily, name: impl Into<String>) -> Self {
        Self {
            family,
            name: name.into(),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.name)
    }
}

/// Error type shared by every FieldSight crate.
///
/// Transient absence of data and rejected candidates are *not* errors; they
/// are reported as `None` / `false` by the adapters and the gate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisionError {
    #[error("Field layout could not be loaded from {path}: {details}")]
    LayoutLoad { path: String, details: String },

    #[error("Field layout is malformed: {0}")]
    LayoutParse(String),

    #[error("Tag {0} is not part of the field layout")]
    UnknownTag(u32),

    /// The elevation angle is too close to zero for the pinhole distance
    /// equation.
    #[error("Degenerate camera geometry: elevation angle {angle_rad} rad")]
    DegenerateGeometry { angle_rad: f64 },

    #[error("Vision source {component} unavailable: {details}")]
    SourceUnavailable { component: String, details: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_display_joins_family_and_name() {
        let id = SourceId::new(SourceFamily::Fiducial, "limelight");
        assert_eq!(id.to_string(), "fiducial:limelight");

        let id = SourceId::new(SourceFamily::MultiCamera, "photon_front");
        assert_eq!(id.to_string(), "multi_camera:photon_front");
    }

    #[test]
    fn source_family_serializes_snake_case() {
        let json = serde_json::to_string(&SourceFamily::ObjectDetection).unwrap();
        assert_eq!(json, "\"object_detection\"");
        let back: SourceFamily = serde_json::from_str("\"multi_camera\"").unwrap();
        assert_eq!(back, SourceFamily::MultiCamera);
    }

    #[test]
    fn vision_error_display() {
        let err = VisionError::UnknownTag(17);
        assert!(err.to_string().contains("17"));

        let err = VisionError::LayoutLoad {
            path: "/tmp/missing.json".to_string(),
            details: "No such file".to_string(),
        };
        assert!(err.to_string().contains("/tmp/missing.json"));

        let err = VisionError::DegenerateGeometry { angle_rad: 0.0 };
        assert!(err.to_string().contains("Degenerate"));
    }

    #[test]
    fn vision_error_roundtrips_through_json() {
        let err = VisionError::SourceUnavailable {
            component: "photon_front".to_string(),
            details: "field layout disabled".to_string(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: VisionError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
