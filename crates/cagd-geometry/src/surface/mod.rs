//! Surface trait and implementations.

mod nurbs;

use cagd_core::Result;
use cagd_math::{Point3, Vector3};

pub use nurbs::NurbsSurface;

/// Trait for parametric surfaces in 3D space, parameterized over `[0, 1]²`.
pub trait Surface: Send + Sync {
    /// Evaluate the surface at parameters `(t1, t2)`.
    fn point_at(&self, t1: f64, t2: f64) -> Result<Point3>;

    /// Evaluate the unit surface normal at parameters `(t1, t2)`.
    fn normal_at(&self, t1: f64, t2: f64) -> Result<Vector3>;
}
