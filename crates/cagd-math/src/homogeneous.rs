//! Weighted control points and projection out of homogeneous space.
//!
//! A NURBS control point carries a Euclidean position and a weight. Evaluation
//! happens on the homogeneous form `(x*w, y*w, z*w, w)`, and results are brought
//! back with [`project`].

use cagd_core::{CagdError, Result, Tolerance};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{DVec4, Point3};

/// A control point `(x, y, z)` with NURBS weight `w`.
///
/// The coordinates are the physical position; they are not pre-multiplied by
/// the weight. A missing `w` deserializes as `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default = "unit_weight")]
    pub w: f64,
}

fn unit_weight() -> f64 {
    1.0
}

impl ControlPoint {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// A control point with weight `1.0`.
    pub fn from_point(p: Point3) -> Self {
        Self::weighted(p, 1.0)
    }

    pub fn weighted(p: Point3, w: f64) -> Self {
        Self::new(p.x, p.y, p.z, w)
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    /// The pre-weighted form `(x*w, y*w, z*w, w)`.
    pub fn to_homogeneous(&self) -> DVec4 {
        DVec4::new(self.x * self.w, self.y * self.w, self.z * self.w, self.w)
    }

    /// Require finite coordinates and a strictly positive weight.
    pub fn check(&self) -> Result<()> {
        if !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite()) {
            return Err(CagdError::InvalidArgument(format!(
                "control point coordinates must be finite, got ({}, {}, {})",
                self.x, self.y, self.z
            )));
        }
        if !(self.w.is_finite() && self.w > 0.0) {
            return Err(CagdError::InvalidArgument(format!(
                "control point weight must be positive and finite, got {}",
                self.w
            )));
        }
        Ok(())
    }
}

impl From<Point3> for ControlPoint {
    fn from(p: Point3) -> Self {
        Self::from_point(p)
    }
}

/// Divide a homogeneous point by its weight.
pub fn project(h: DVec4) -> Result<Point3> {
    // Negated comparison so a NaN weight is rejected too.
    if !(h.w.abs() > Tolerance::DEGENERATE) {
        warn!(w = h.w, "cannot project homogeneous point with vanishing weight");
        return Err(CagdError::NumericDegeneracy(format!(
            "homogeneous weight {} is zero",
            h.w
        )));
    }
    Ok(h.truncate() / h.w)
}
