//! Planar (2-D) rigid-body types.
//!
//! [`Pose2d::transform_by`] is the only way a pose changes: it returns a new
//! value and leaves the receiver untouched.

use std::f64::consts::{PI, TAU};
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Wrap `angle` into the half-open interval (−π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a > PI { a - TAU } else { a }
}

// ────────────────────────────────────────────────────────────────────────────
// Rotation2d
// ────────────────────────────────────────────────────────────────────────────

/// A planar rotation, stored normalized to (−π, π].
///
/// Serialized as a bare number of radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Rotation2d {
    radians: f64,
}

impl Rotation2d {
    /// Create a rotation from radians.  The value is normalized.
    pub fn new(radians: f64) -> Self {
        Self {
            radians: normalize_angle(radians),
        }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::new(degrees.to_radians())
    }

    /// Rotation pointing along the vector `(x, y)`.
    pub fn from_vector(x: f64, y: f64) -> Self {
        Self::new(y.atan2(x))
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn radians(self) -> f64 {
        self.radians
    }

    pub fn degrees(self) -> f64 {
        self.radians.to_degrees()
    }

    pub fn cos(self) -> f64 {
        self.radians.cos()
    }

    pub fn sin(self) -> f64 {
        self.radians.sin()
    }

    /// Compose two rotations.
    pub fn rotate_by(self, other: Self) -> Self {
        Self::new(self.radians + other.radians)
    }

    /// Compare on the circle, so that `−π + ε` and `π − ε` are close.
    pub fn approx_eq(self, other: Self, epsilon: f64) -> bool {
        normalize_angle(self.radians - other.radians).abs() <= epsilon
    }
}

impl From<f64> for Rotation2d {
    fn from(radians: f64) -> Self {
        Self::new(radians)
    }
}

impl From<Rotation2d> for f64 {
    fn from(rotation: Rotation2d) -> Self {
        rotation.radians
    }
}

impl Add for Rotation2d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.rotate_by(rhs)
    }
}

impl Sub for Rotation2d {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.radians - rhs.radians)
    }
}

impl Neg for Rotation2d {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.radians)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Translation2d
// ────────────────────────────────────────────────────────────────────────────

/// A planar displacement in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation2d {
    pub x: f64,
    pub y: f64,
}

impl Translation2d {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translation of length `distance` along `direction`.
    pub fn from_polar(distance: f64, direction: Rotation2d) -> Self {
        Self::new(distance * direction.cos(), distance * direction.sin())
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).norm()
    }

    /// Direction of this vector from the origin.
    pub fn angle(self) -> Rotation2d {
        Rotation2d::from_vector(self.x, self.y)
    }

    /// Rotate this vector counter-clockwise about the origin.
    pub fn rotate_by(self, rotation: Rotation2d) -> Self {
        let (sin, cos) = (rotation.sin(), rotation.cos());
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Translation2d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Translation2d {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Translation2d {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Translation2d {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform2d
// ────────────────────────────────────────────────────────────────────────────

/// Relative displacement between two poses, expressed in the frame of the
/// first one: `a.transform_by(Transform2d::between(a, b)) == b`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform2d {
    pub translation: Translation2d,
    pub rotation: Rotation2d,
}

impl Transform2d {
    pub fn new(translation: Translation2d, rotation: Rotation2d) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// The transform that maps `initial` onto `last`.
    pub fn between(initial: Pose2d, last: Pose2d) -> Self {
        Self::new(
            (last.translation - initial.translation).rotate_by(-initial.rotation),
            last.rotation - initial.rotation,
        )
    }

    /// Undo this transform: `p.transform_by(t).transform_by(t.inverse()) == p`.
    pub fn inverse(self) -> Self {
        Self::new(
            (-self.translation).rotate_by(-self.rotation),
            -self.rotation,
        )
    }

    /// `self` applied first, then `other` (expressed in the intermediate
    /// frame).
    pub fn then(self, other: Self) -> Self {
        Self::new(
            self.translation + other.translation.rotate_by(self.rotation),
            self.rotation + other.rotation,
        )
    }

    /// Interpret this transform as a pose relative to its own origin.
    pub fn as_pose(self) -> Pose2d {
        Pose2d::from_parts(self.translation, self.rotation)
    }
}

impl Add for Transform2d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.then(rhs)
    }
}

impl From<Pose2d> for Transform2d {
    /// The transform from the origin of the pose's frame to the pose.
    fn from(pose: Pose2d) -> Self {
        Self::new(pose.translation, pose.rotation)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose2d
// ────────────────────────────────────────────────────────────────────────────

/// A planar position and heading.
///
/// Unless a name says otherwise (`robot_relative`, `camera_relative`,
/// `target_space`), poses are field-relative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2d {
    pub translation: Translation2d,
    pub rotation: Rotation2d,
}

impl Pose2d {
    pub fn new(x: f64, y: f64, heading: Rotation2d) -> Self {
        Self::from_parts(Translation2d::new(x, y), heading)
    }

    pub fn from_parts(translation: Translation2d, rotation: Rotation2d) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The origin of the frame, facing +X.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn x(self) -> f64 {
        self.translation.x
    }

    pub fn y(self) -> f64 {
        self.translation.y
    }

    pub fn heading(self) -> Rotation2d {
        self.rotation
    }

    /// Apply `transform` in this pose's own frame.
    pub fn transform_by(self, transform: Transform2d) -> Self {
        Self::from_parts(
            self.translation + transform.translation.rotate_by(self.rotation),
            self.rotation + transform.rotation,
        )
    }

    /// Express this pose in the frame of `origin`.
    pub fn relative_to(self, origin: Pose2d) -> Self {
        Transform2d::between(origin, self).as_pose()
    }

    pub fn approx_eq(self, other: Self, pos_epsilon: f64, angle_epsilon: f64) -> bool {
        (self.x() - other.x()).abs() <= pos_epsilon
            && (self.y() - other.y()).abs() <= pos_epsilon
            && self.rotation.approx_eq(other.rotation, angle_epsilon)
    }
}

impl Add<Transform2d> for Pose2d {
    type Output = Self;

    fn add(self, rhs: Transform2d) -> Self {
        self.transform_by(rhs)
    }
}

impl Sub for Pose2d {
    type Output = Transform2d;

    /// `a - b` is the transform that carries `b` onto `a`.
    fn sub(self, rhs: Self) -> Transform2d {
        Transform2d::between(rhs, self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
