//! [`ConfidenceGate`] – plausibility check for fiducial pose candidates.
//!
//! A candidate is accepted when the pipeline actually saw a marker **and**
//! either the pose lies inside the field rectangle or more than one marker
//! contributed to it.

use fieldsight_geometry::Pose2d;
use tracing::debug;

use crate::candidate::PoseCandidate;
use crate::field_layout::FieldDimensions;

// ────────────────────────────────────────────────────────────────────────────
// GateDecision
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of [`ConfidenceGate::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accepted,
    /// The pipeline reported no visible marker.
    NoTarget,
    /// A single-marker pose outside the field rectangle.
    OutOfBounds,
}

impl GateDecision {
    pub fn is_accepted(self) -> bool {
        matches!(self, GateDecision::Accepted)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ConfidenceGate
// ────────────────────────────────────────────────────────────────────────────

/// Accept/reject policy for [`PoseCandidate`]s.
///
/// # Example
///
/// ```
/// use fieldsight_geometry::{Pose2d, Rotation2d};
/// use fieldsight_perception::candidate::PoseCandidate;
/// use fieldsight_perception::field_layout::FieldDimensions;
/// use fieldsight_perception::gate::ConfidenceGate;
/// use fieldsight_types::{SourceFamily, SourceId};
///
/// let gate = ConfidenceGate::new(FieldDimensions::new(16.5, 8.2));
/// let candidate = PoseCandidate {
///     pose: Pose2d::new(20.0, 5.0, Rotation2d::identity()),
///     capture_timestamp: 0.0,
///     latency_seconds: 0.0,
///     source: SourceId::new(SourceFamily::Fiducial, "limelight"),
///     has_target: true,
///     target_count: 1,
///     ambiguity: 0.0,
/// };
/// assert!(!gate.accept(&candidate, &Pose2d::identity()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    field: FieldDimensions,
}

impl ConfidenceGate {
    pub fn new(field: FieldDimensions) -> Self {
        Self { field }
    }

    pub fn field(&self) -> FieldDimensions {
        self.field
    }

    /// Classify `candidate`.  `prior` is the currently accepted pose and only
    /// feeds the debug log.
    pub fn evaluate(&self, candidate: &PoseCandidate, prior: &Pose2d) -> GateDecision {
        let decision = if !candidate.has_target {
            GateDecision::NoTarget
        } else if self.field.contains(&candidate.pose) || candidate.multiple_targets() {
            GateDecision::Accepted
        } else {
            GateDecision::OutOfBounds
        };

        debug!(
            source = %candidate.source,
            ?decision,
            x = candidate.pose.x(),
            y = candidate.pose.y(),
            targets = candidate.target_count,
            jump_m = candidate.pose.translation.distance(prior.translation),
            "gate"
        );
        decision
    }

    pub fn accept(&self, candidate: &PoseCandidate, prior: &Pose2d) -> bool {
        self.evaluate(candidate, prior).is_accepted()
    }
}
