//! `fieldsight-hal` – the boundary between vendor vision hardware and the
//! localization core.
//!
//! Every vendor protocol (network-table entries, camera result structs) is
//! read here and normalized into small plain-data readings.  Reads are
//! non-blocking: each call returns the latest cached value or `None`, never
//! waits for a new frame.
//!
//! # Modules
//!
//! - [`table`] – [`VisionTable`][table::VisionTable]: key/value view of a
//!   vendor network table, plus the in-process
//!   [`MemoryTable`][table::MemoryTable].
//! - [`pipeline`] – capability traits per pipeline family:
//!   [`FiducialPipeline`][pipeline::FiducialPipeline] and
//!   [`DetectorPipeline`][pipeline::DetectorPipeline].
//! - [`limelight`] – [`LimelightPipeline`][limelight::LimelightPipeline]:
//!   implements both capabilities on top of any [`VisionTable`][table::VisionTable].
//! - [`camera`] – [`TagCamera`][camera::TagCamera]: cameras that hand back a
//!   full 3-D tag solve per frame.
//! - [`sim`] – scripted backends for tests and headless runs.

pub mod camera;
pub mod limelight;
pub mod pipeline;
pub mod sim;
pub mod table;

pub use camera::{MultiTagResult, PipelineResult, TagCamera, TrackedTarget};
pub use limelight::LimelightPipeline;
pub use pipeline::{
    DetectorPipeline, DetectorReading, FiducialPipeline, FiducialReading, LedMode,
    PipelineSettings, VisionPipeline,
};
pub use sim::{SimLimelight, SimTagCamera};
pub use table::{MemoryTable, TableValue, VisionTable};
