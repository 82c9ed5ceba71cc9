//! Scripted backends for CI and headless runs.
//!
//! - [`SimTagCamera`] replays a queue of [`PipelineResult`]s and keeps
//!   returning the last one once the queue is drained, the way a real
//!   camera keeps serving its latest cached frame.
//! - [`SimLimelight`] publishes Limelight-shaped entries into a
//!   [`MemoryTable`] so a [`LimelightPipeline`][crate::LimelightPipeline]
//!   can read them back.
//!
//! # Example
//!
//! ```rust
//! use fieldsight_hal::{FiducialPipeline, LimelightPipeline, MemoryTable, SimLimelight};
//! use fieldsight_geometry::{Pose2d, Rotation2d};
//!
//! let table = MemoryTable::new("limelight");
//! let sim = SimLimelight::new(table.clone());
//! sim.publish_fiducials(Pose2d::new(2.0, 4.0, Rotation2d::identity()), &[7, 8], 10.0, 20.0);
//!
//! let mut pipeline = LimelightPipeline::new(table);
//! let reading = pipeline.latest_fiducial().expect("sim publishes a dump");
//! assert_eq!(reading.target_count(), 2);
//! ```

use std::collections::VecDeque;

use fieldsight_geometry::Pose2d;
use serde_json::json;

use crate::camera::{PipelineResult, TagCamera};
use crate::limelight::{
    KEY_BOTPOSE_WPIBLUE, KEY_CL, KEY_JSON, KEY_TL, KEY_TV, KEY_TX, KEY_TY,
};
use crate::table::MemoryTable;

// ────────────────────────────────────────────────────────────────────────────
// SimTagCamera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated tag camera fed from a script of results.
#[derive(Debug, Default)]
pub struct SimTagCamera {
    id: String,
    queue: VecDeque<PipelineResult>,
    last: Option<PipelineResult>,
}

impl SimTagCamera {
    /// Create a new simulated camera with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Append a frame to the script.
    pub fn push(&mut self, result: PipelineResult) {
        self.queue.push_back(result);
    }

    /// Builder form of [`push`][Self::push].
    pub fn with_frame(mut self, result: PipelineResult) -> Self {
        self.push(result);
        self
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl TagCamera for SimTagCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn latest_result(&mut self) -> Option<PipelineResult> {
        if let Some(next) = self.queue.pop_front() {
            self.last = Some(next);
        }
        self.last.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimLimelight
// ────────────────────────────────────────────────────────────────────────────

/// Publishes Limelight-style frames into a shared [`MemoryTable`].
#[derive(Debug, Clone)]
pub struct SimLimelight {
    table: MemoryTable,
}

impl SimLimelight {
    pub fn new(table: MemoryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MemoryTable {
        &self.table
    }

    /// A frame with `tag_ids` in view and a blue-origin robot pose.
    pub fn publish_fiducials(
        &self,
        robot_pose: Pose2d,
        tag_ids: &[u32],
        pipeline_latency_ms: f64,
        capture_latency_ms: f64,
    ) {
        let fiducials: Vec<_> = tag_ids.iter().map(|id| json!({ "fID": id })).collect();
        let dump = json!({ "Results": { "Fiducial": fiducials } });
        self.table.put_string(KEY_JSON, dump.to_string());
        self.table
            .put_number(KEY_TV, if tag_ids.is_empty() { 0.0 } else { 1.0 });
        self.table.put_number(KEY_TL, pipeline_latency_ms);
        self.table.put_number(KEY_CL, capture_latency_ms);
        self.table.put_number_array(
            KEY_BOTPOSE_WPIBLUE,
            &[
                robot_pose.x(),
                robot_pose.y(),
                0.0,
                0.0,
                0.0,
                robot_pose.heading().degrees(),
            ],
        );
    }

    /// A detector frame with one object at the given raw angles.
    pub fn publish_detection(&self, tx_deg: f64, ty_deg: f64) {
        let dump = json!({ "Results": { "Detector": [{ "tx": tx_deg, "ty": ty_deg }] } });
        self.table.put_string(KEY_JSON, dump.to_string());
        self.table.put_number(KEY_TV, 1.0);
        self.table.put_number(KEY_TX, tx_deg);
        self.table.put_number(KEY_TY, ty_deg);
    }

    /// Connected, but nothing in view.
    pub fn publish_no_target(&self) {
        self.table
            .put_string(KEY_JSON, json!({ "Results": {} }).to_string());
        self.table.put_number(KEY_TV, 0.0);
    }

    /// Simulate a coprocessor that stopped publishing.
    pub fn disconnect(&self) {
        self.table.put_string(KEY_JSON, "");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
