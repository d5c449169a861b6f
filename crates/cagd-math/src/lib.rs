pub mod homogeneous;

pub use glam::{DQuat, DVec3, DVec4};
pub use homogeneous::{project, ControlPoint};

pub type Point3 = DVec3;
pub type Vector3 = DVec3;
