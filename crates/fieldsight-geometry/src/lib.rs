//! `fieldsight-geometry` – rigid-body primitives for field localization.
//!
//! Coordinate convention (field frame): origin at the blue-alliance corner,
//! +X along the field length, +Y to the left, counter-clockwise positive
//! rotation.  All lengths are metres, all angles radians unless a function
//! name says otherwise.
//!
//! # Modules
//!
//! - [`planar`] – [`Rotation2d`], [`Translation2d`], [`Pose2d`] and
//!   [`Transform2d`], the types every consumer of the fused pose works with.
//! - [`spatial`] – [`Quaternion`], [`Rotation3d`], [`Translation3d`],
//!   [`Transform3d`] and [`Pose3d`], used where a camera solves a full 3-D
//!   tag pose.  [`Pose3d::to_pose2d`] reduces to the planar types by keeping
//!   only the yaw.
//!
//! # Example
//!
//! ```rust
//! use fieldsight_geometry::{Pose2d, Rotation2d, Transform2d, Translation2d};
//!
//! let robot = Pose2d::new(2.0, 1.0, Rotation2d::from_degrees(90.0));
//! let ahead = Transform2d::new(Translation2d::new(1.0, 0.0), Rotation2d::identity());
//!
//! let p = robot.transform_by(ahead);
//! assert!((p.x() - 2.0).abs() < 1e-9);
//! assert!((p.y() - 2.0).abs() < 1e-9);
//! ```

pub mod planar;
pub mod spatial;

pub use planar::{Pose2d, Rotation2d, Transform2d, Translation2d, normalize_angle};
pub use spatial::{Pose3d, Quaternion, Rotation3d, Transform3d, Translation3d};
