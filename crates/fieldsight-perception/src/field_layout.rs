//! [`FieldLayout`] – known field poses of every fiducial marker.
//!
//! Reads the WPILib AprilTag layout JSON format:
//!
//! ```json
//! {
//!   "tags": [
//!     { "ID": 7,
//!       "pose": { "translation": { "x": -0.04, "y": 5.55, "z": 1.45 },
//!                 "rotation": { "quaternion": { "W": 1.0, "X": 0.0, "Y": 0.0, "Z": 0.0 } } } }
//!   ],
//!   "field": { "length": 16.541, "width": 8.211 }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use fieldsight_geometry::{Pose2d, Pose3d, Quaternion, Rotation3d, Translation3d};
use fieldsight_types::VisionError;
use serde::{Deserialize, Serialize};

/// Size of the field rectangle, origin at the blue-alliance corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDimensions {
    /// Extent along +X, metres.
    pub length: f64,
    /// Extent along +Y, metres.
    pub width: f64,
}

impl Default for FieldDimensions {
    fn default() -> Self {
        Self {
            length: 16.541,
            width: 8.211,
        }
    }
}

impl FieldDimensions {
    pub fn new(length: f64, width: f64) -> Self {
        Self { length, width }
    }

    /// Inclusive bounds check.
    pub fn contains(&self, pose: &Pose2d) -> bool {
        (0.0..=self.length).contains(&pose.x()) && (0.0..=self.width).contains(&pose.y())
    }
}

#[derive(Debug, Deserialize)]
struct LayoutFile {
    tags: Vec<TagEntry>,
    field: FieldDimensions,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(rename = "ID")]
    id: u32,
    pose: TagPoseEntry,
}

#[derive(Debug, Deserialize)]
struct TagPoseEntry {
    translation: Translation3d,
    rotation: TagRotationEntry,
}

#[derive(Debug, Deserialize)]
struct TagRotationEntry {
    quaternion: Quaternion,
}

/// Field poses of every marker, keyed by marker id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldLayout {
    tags: HashMap<u32, Pose3d>,
    field: FieldDimensions,
}

impl FieldLayout {
    /// Build a layout in code, e.g. for tests.
    pub fn from_tags(field: FieldDimensions, tags: impl IntoIterator<Item = (u32, Pose3d)>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            field,
        }
    }

    /// Parse a WPILib layout document.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::LayoutParse`] on malformed JSON or when the
    /// document lists no tags.
    pub fn from_json_str(raw: &str) -> Result<Self, VisionError> {
        let file: LayoutFile =
            serde_json::from_str(raw).map_err(|e| VisionError::LayoutParse(e.to_string()))?;
        if file.tags.is_empty() {
            return Err(VisionError::LayoutParse("layout lists no tags".to_string()));
        }
        let tags = file.tags.into_iter().map(|t| {
            (
                t.id,
                Pose3d::new(
                    t.pose.translation,
                    Rotation3d::from_quaternion(t.pose.rotation.quaternion),
                ),
            )
        });
        Ok(Self::from_tags(file.field, tags))
    }

    /// Read and parse a layout file.
    ///
    /// # Errors
    ///
    /// [`VisionError::LayoutLoad`] when the file cannot be read,
    /// [`VisionError::LayoutParse`] when it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, VisionError> {
        let raw = fs::read_to_string(path).map_err(|e| VisionError::LayoutLoad {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn tag_pose(&self, id: u32) -> Option<Pose3d> {
        self.tags.get(&id).copied()
    }

    /// Like [`tag_pose`](Self::tag_pose), but an id missing from the layout
    /// is a [`VisionError::UnknownTag`].
    pub fn require_tag(&self, id: u32) -> Result<Pose3d, VisionError> {
        self.tag_pose(id).ok_or(VisionError::UnknownTag(id))
    }

    pub fn field(&self) -> FieldDimensions {
        self.field
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
