//! `fieldsight-runtime` – composition root and per-cycle driver.
//!
//! # Modules
//!
//! - [`vision_cycle`] – [`VisionCycle`][vision_cycle::VisionCycle]: wires
//!   adapters, fusion and localizer from a
//!   [`VisionConfig`][fieldsight_perception::VisionConfig] and runs them once
//!   per control cycle, publishing a
//!   [`VisionSnapshot`][vision_cycle::VisionSnapshot] to a
//!   [`PoseBoard`][vision_cycle::PoseBoard].
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod telemetry;
pub mod vision_cycle;

pub use telemetry::{TracerProviderGuard, init_tracing};
pub use vision_cycle::{PoseBoard, VisionBackends, VisionCycle, VisionSnapshot};
