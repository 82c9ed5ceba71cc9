//! Spatial (3-D) rigid-body types.
//!
//! Cameras that solve full tag poses hand back 3-D transforms.  Everything
//! downstream of the pose solve works in the plane, so these types mostly
//! exist to be composed once and then projected with [`Pose3d::to_pose2d`].

use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::planar::{Pose2d, Rotation2d, Translation2d};

// ────────────────────────────────────────────────────────────────────────────
// Translation3d
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D translation vector in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Translation3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn rotate_by(self, rotation: Rotation3d) -> Self {
        rotation.quaternion().rotate(self)
    }

    /// Drop the Z component.
    pub fn to_translation2d(self) -> Translation2d {
        Translation2d::new(self.x, self.y)
    }
}

impl Add for Translation3d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Translation3d {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Translation3d {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A quaternion in (w, x, y, z) convention.
///
/// Field layout files store tag orientations in this form, with upper-case
/// keys (`W`, `X`, `Y`, `Z`); both spellings are accepted when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    #[serde(alias = "W")]
    pub w: f64,
    #[serde(alias = "X")]
    pub x: f64,
    #[serde(alias = "Y")]
    pub y: f64,
    #[serde(alias = "Z")]
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  No normalization is applied; see
    /// [`Quaternion::normalize`].
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    pub fn norm(self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Scale to unit length.  A zero quaternion becomes the identity.
    pub fn normalize(self) -> Self {
        let n = self.norm();
        if n <= f64::EPSILON {
            return Self::identity();
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Translation3d) -> Translation3d {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Translation3d::new(rotated.x, rotated.y, rotated.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rotation3d
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D orientation backed by a unit [`Quaternion`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Quaternion", into = "Quaternion")]
pub struct Rotation3d {
    q: Quaternion,
}

impl From<Quaternion> for Rotation3d {
    fn from(q: Quaternion) -> Self {
        Self::from_quaternion(q)
    }
}

impl From<Rotation3d> for Quaternion {
    fn from(rotation: Rotation3d) -> Self {
        rotation.q
    }
}

impl Rotation3d {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Wrap a quaternion, normalizing it.
    pub fn from_quaternion(q: Quaternion) -> Self {
        Self { q: q.normalize() }
    }

    /// Extrinsic roll (X), pitch (Y), yaw (Z) rotation, in radians.
    pub fn from_rpy(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();
        Self::from_quaternion(Quaternion::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        ))
    }

    /// Pure rotation about +Z.
    pub fn from_yaw(yaw: f64) -> Self {
        Self::from_rpy(0.0, 0.0, yaw)
    }

    pub fn quaternion(self) -> Quaternion {
        self.q
    }

    /// Counter-clockwise rotation about X, radians.
    pub fn roll(self) -> f64 {
        let Quaternion { w, x, y, z } = self.q;
        (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y))
    }

    /// Counter-clockwise rotation about Y, radians.
    pub fn pitch(self) -> f64 {
        let Quaternion { w, x, y, z } = self.q;
        (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin()
    }

    /// Counter-clockwise rotation about Z, radians.
    pub fn yaw(self) -> f64 {
        let Quaternion { w, x, y, z } = self.q;
        (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z))
    }

    /// Project onto the plane by keeping only the yaw component.
    pub fn to_rotation2d(self) -> Rotation2d {
        Rotation2d::new(self.yaw())
    }

    pub fn inverse(self) -> Self {
        Self {
            q: self.q.conjugate(),
        }
    }

    /// `self` followed by `other`, both extrinsic.
    pub fn rotate_by(self, other: Self) -> Self {
        Self::from_quaternion(other.q.mul(self.q))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform3d
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body 3-D transform: translation followed by rotation.
///
/// Represents the pose of frame B relative to frame A.  Names follow the
/// `a_to_b` pattern throughout the workspace (`field_to_camera`,
/// `camera_to_robot`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform3d {
    pub translation: Translation3d,
    pub rotation: Rotation3d,
}

impl Transform3d {
    /// Create a transform from a translation and rotation.
    pub fn new(translation: Translation3d, rotation: Rotation3d) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self::default()
    }

    /// Compose two transforms: `self` applied first, then `other`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.translation + other.translation.rotate_by(self.rotation);
        let rotated = Rotation3d::from_quaternion(self.rotation.q.mul(other.rotation.q));
        Self::new(translated, rotated)
    }

    /// If `self` = T_A_B, returns T_B_A.
    pub fn inverse(self) -> Self {
        let inv = self.rotation.inverse();
        Self::new((-self.translation).rotate_by(inv), inv)
    }

    /// Interpret this transform as a pose relative to frame A.
    pub fn as_pose(self) -> Pose3d {
        Pose3d::new(self.translation, self.rotation)
    }
}

impl Add for Transform3d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.compose(rhs)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose3d
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D position and orientation, e.g. a tag in the field layout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose3d {
    pub translation: Translation3d,
    pub rotation: Rotation3d,
}

impl Pose3d {
    pub fn new(translation: Translation3d, rotation: Rotation3d) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Apply `transform` in this pose's own frame.
    pub fn transform_by(self, transform: Transform3d) -> Self {
        let t = Transform3d::new(self.translation, self.rotation).compose(transform);
        t.as_pose()
    }

    /// Planar projection: keep x, y and yaw.
    pub fn to_pose2d(self) -> Pose2d {
        Pose2d::from_parts(
            self.translation.to_translation2d(),
            self.rotation.to_rotation2d(),
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

    // ── Quaternion ──────────────────────────────────────────────────────────

    #[test]
    fn quaternion_identity_rotate_is_noop() {
        let r = Quaternion::identity().rotate(Translation3d::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(r.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn quaternion_90deg_yaw_rotates_x_to_y() {
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let r = q.rotate(Translation3d::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(r.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_quaternion_normalizes_to_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn layout_style_keys_deserialize() {
        let q: Quaternion =
            serde_json::from_str(r#"{"W": 0.0, "X": 0.0, "Y": 0.0, "Z": 1.0}"#).unwrap();
        let r = Rotation3d::from(q);
        assert_abs_diff_eq!(r.yaw().abs(), PI, epsilon = 1e-12);
    }

    // ── Rotation3d ──────────────────────────────────────────────────────────

    #[test]
    fn rpy_round_trip() {
        let r = Rotation3d::from_rpy(0.1, -0.2, 0.3);
        assert_abs_diff_eq!(r.roll(), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(r.pitch(), -0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(r.yaw(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn yaw_survives_projection_with_tilt() {
        // A camera pitched down 20 degrees still reports its heading.
        let r = Rotation3d::from_rpy(0.0, 20f64.to_radians(), 1.2);
        assert_abs_diff_eq!(r.to_rotation2d().radians(), 1.2, epsilon = 1e-12);
    }

    // ── Transform3d / Pose3d ────────────────────────────────────────────────

    #[test]
    fn transform_compose_translations_add() {
        let t1 = Transform3d::new(Translation3d::new(1.0, 0.0, 0.0), Rotation3d::identity());
        let t2 = Transform3d::new(Translation3d::new(2.0, 0.0, 0.5), Rotation3d::identity());
        let c = t1 + t2;
        assert_abs_diff_eq!(c.translation.x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.translation.z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn compose_respects_rotation() {
        let base = Transform3d::new(Translation3d::zero(), Rotation3d::from_yaw(FRAC_PI_2));
        let ahead = Transform3d::new(Translation3d::new(1.0, 0.0, 0.0), Rotation3d::identity());
        let c = base.compose(ahead);
        assert_abs_diff_eq!(c.translation.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.translation.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_composes_to_identity() {
        let t = Transform3d::new(
            Translation3d::new(0.3, -1.2, 0.8),
            Rotation3d::from_rpy(0.05, -0.4, 2.0),
        );
        let id = t.compose(t.inverse());
        assert_abs_diff_eq!(id.translation.norm(), 0.0, epsilon = 1e-12);
        let q = id.rotation.quaternion();
        assert_abs_diff_eq!(q.w.abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pose3d_to_pose2d_keeps_xy_and_yaw() {
        let p = Pose3d::new(
            Translation3d::new(16.58, 5.55, 1.45),
            Rotation3d::from_yaw(PI),
        );
        let p2 = p.to_pose2d();
        assert_abs_diff_eq!(p2.x(), 16.58, epsilon = 1e-12);
        assert_abs_diff_eq!(p2.y(), 5.55, epsilon = 1e-12);
        assert_abs_diff_eq!(p2.heading().radians().abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn pose3d_transform_by_matches_planar_for_flat_transforms() {
        let pose = Pose3d::new(Translation3d::new(2.0, 1.0, 0.0), Rotation3d::from_yaw(0.7));
        let t = Transform3d::new(Translation3d::new(1.0, -0.5, 0.0), Rotation3d::from_yaw(0.4));

        let p3 = pose.transform_by(t).to_pose2d();
        let p2 = pose.to_pose2d().transform_by(crate::planar::Transform2d::new(
            Translation2d::new(1.0, -0.5),
            Rotation2d::new(0.4),
        ));
        assert!(p3.approx_eq(p2, 1e-12, 1e-12));
    }
}
