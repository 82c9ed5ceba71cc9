//! `fieldsight-perception` – turns raw pipeline output into pose estimates.
//!
//! # Modules
//!
//! - [`fiducial`] – [`FiducialAdapter`][fiducial::FiducialAdapter]: pipelines
//!   that publish a field pose directly.
//! - [`multi_camera`] – [`MultiCameraAdapter`][multi_camera::MultiCameraAdapter]:
//!   cameras that solve marker poses in 3-D; robot pose via the
//!   [`FieldLayout`][field_layout::FieldLayout].
//! - [`detector`] – [`DetectorAdapter`][detector::DetectorAdapter]: angular
//!   readings of the tracked game object.
//! - [`gate`] – [`ConfidenceGate`][gate::ConfidenceGate]: plausibility check
//!   for fiducial candidates.
//! - [`fusion`] – [`FusionEngine`][fusion::FusionEngine]: owns the accepted
//!   robot pose.
//! - [`localizer`] – [`TargetLocalizer`][localizer::TargetLocalizer]:
//!   monocular field and robot-relative position of the game object.
//! - [`config`] – [`VisionConfig`][config::VisionConfig]: startup constants.

pub mod candidate;
pub mod config;
pub mod detector;
pub mod fiducial;
pub mod field_layout;
pub mod fusion;
pub mod gate;
pub mod localizer;
pub mod multi_camera;

pub use candidate::{ObjectObservation, PoseCandidate};
pub use config::{CameraMount, TagCameraConfig, VisionConfig};
pub use detector::DetectorAdapter;
pub use fiducial::FiducialAdapter;
pub use field_layout::{FieldDimensions, FieldLayout};
pub use fusion::{FusedPoseState, FusionEngine};
pub use gate::{ConfidenceGate, GateDecision};
pub use localizer::{DetectorGeometry, ObjectPoses, TargetLocalizer};
pub use multi_camera::{MultiCameraAdapter, SolveStrategy, TagSolve};
