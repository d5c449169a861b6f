//! Line segment curve.

use cagd_core::{check_unit_parameter, Result};
use cagd_math::Point3;
use serde::{Deserialize, Serialize};

use super::Curve;

/// A line segment from `start` to `end`, parameterized over `[0, 1]`.
///
/// It has no analytic tangent override, so tangents come from the
/// finite-difference default of [`Curve::tangent_at`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub start: Point3,
    pub end: Point3,
}

impl Line {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }
}

impl Curve for Line {
    fn point_at(&self, t: f64) -> Result<Point3> {
        check_unit_parameter("t", t)?;
        Ok(self.start + t * (self.end - self.start))
    }
}
