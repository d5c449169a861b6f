//! NURBS surface.

use cagd_core::traits::Validate;
use cagd_core::{check_unit_parameter, CagdError, Result};
use cagd_math::{ControlPoint, DVec4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Surface;
use crate::nurbs::{deboor, validate_knots};

/// A tensor-product NURBS surface.
///
/// `control_points[i][j]` is the control point at row `i` (u-direction) and
/// column `j` (v-direction). The grid has `knots_u.len() - degree_u - 1` rows of
/// `knots_v.len() - degree_v - 1` points each.
///
/// `(t1, t2)` in `[0, 1]²` maps linearly onto the full knot ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NurbsSurfaceDef")]
pub struct NurbsSurface {
    degree_u: usize,
    degree_v: usize,
    knots_u: Vec<f64>,
    knots_v: Vec<f64>,
    control_points: Vec<Vec<ControlPoint>>,
}

#[derive(Deserialize)]
struct NurbsSurfaceDef {
    degree_u: usize,
    degree_v: usize,
    knots_u: Vec<f64>,
    knots_v: Vec<f64>,
    control_points: Vec<Vec<ControlPoint>>,
}

impl TryFrom<NurbsSurfaceDef> for NurbsSurface {
    type Error = CagdError;

    fn try_from(def: NurbsSurfaceDef) -> Result<Self> {
        Self::new(
            def.degree_u,
            def.degree_v,
            def.knots_u,
            def.knots_v,
            def.control_points,
        )
    }
}

impl NurbsSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<ControlPoint>>,
    ) -> Result<Self> {
        let surface = Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
        };
        surface.validate()?;
        debug!(
            degree_u,
            degree_v,
            rows = surface.control_points.len(),
            columns = surface.control_points.first().map_or(0, Vec::len),
            "constructed NURBS surface"
        );
        Ok(surface)
    }

    pub fn degree_u(&self) -> usize {
        self.degree_u
    }

    pub fn degree_v(&self) -> usize {
        self.degree_v
    }

    pub fn knots_u(&self) -> &[f64] {
        &self.knots_u
    }

    pub fn knots_v(&self) -> &[f64] {
        &self.knots_v
    }

    pub fn control_points(&self) -> &[Vec<ControlPoint>] {
        &self.control_points
    }

    /// Map normalized parameters onto the knot parameters `(u, v)`.
    pub fn knot_parameters(&self, t1: f64, t2: f64) -> (f64, f64) {
        let lerp = |knots: &[f64], t: f64| {
            let (a, b) = (knots[0], knots[knots.len() - 1]);
            a + t * (b - a)
        };
        (lerp(&self.knots_u, t1), lerp(&self.knots_v, t2))
    }

    /// Evaluate the undivided homogeneous point at `(t1, t2)`.
    pub fn homogeneous_point_at(&self, t1: f64, t2: f64) -> Result<DVec4> {
        let (u, v) = self.checked_knot_parameters(t1, t2)?;
        Ok(deboor::surface_point_homogeneous(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
        ))
    }

    /// Point and first partial derivatives `(S, S_u, S_v)` at `(t1, t2)`, taken
    /// with respect to the knot parameters.
    pub fn derivatives_at(&self, t1: f64, t2: f64) -> Result<(Point3, Vector3, Vector3)> {
        let (u, v) = self.checked_knot_parameters(t1, t2)?;
        deboor::surface_derivatives(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
        )
    }

    /// Replace the control point at `(row, column)`.
    pub fn set_control_point(&mut self, row: usize, column: usize, point: ControlPoint) -> Result<()> {
        let rows = self.control_points.len();
        let columns = self.control_points.first().map_or(0, Vec::len);
        let slot = self
            .control_points
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or_else(|| {
                CagdError::InvalidArgument(format!(
                    "control point ({row}, {column}) out of range for a {rows}x{columns} grid"
                ))
            })?;
        point.check()?;
        *slot = point;
        Ok(())
    }

    fn checked_knot_parameters(&self, t1: f64, t2: f64) -> Result<(f64, f64)> {
        check_unit_parameter("t1", t1)?;
        check_unit_parameter("t2", t2)?;
        Ok(self.knot_parameters(t1, t2))
    }
}

impl Validate for NurbsSurface {
    fn validate(&self) -> Result<()> {
        if self.degree_u == 0 || self.degree_v == 0 {
            return Err(CagdError::InvalidArgument(format!(
                "surface degrees must be at least 1, got ({}, {})",
                self.degree_u, self.degree_v
            )));
        }

        // Grid shape follows from the knot vectors
        let rows = self.knots_u.len().saturating_sub(self.degree_u + 1);
        let columns = self.knots_v.len().saturating_sub(self.degree_v + 1);
        if self.control_points.len() != rows {
            return Err(CagdError::InvalidArgument(format!(
                "expected {rows} control point rows for {} u-knots of degree {}, got {}",
                self.knots_u.len(),
                self.degree_u,
                self.control_points.len()
            )));
        }
        for (i, row) in self.control_points.iter().enumerate() {
            if row.len() != columns {
                return Err(CagdError::InvalidArgument(format!(
                    "control point row {i} has {} points, expected {columns}",
                    row.len()
                )));
            }
            for point in row {
                point.check()?;
            }
        }

        validate_knots(self.degree_u, &self.knots_u, rows)?;
        validate_knots(self.degree_v, &self.knots_v, columns)?;
        Ok(())
    }
}

impl Surface for NurbsSurface {
    fn point_at(&self, t1: f64, t2: f64) -> Result<Point3> {
        let (u, v) = self.checked_knot_parameters(t1, t2)?;
        deboor::surface_point(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
        )
    }

    fn normal_at(&self, t1: f64, t2: f64) -> Result<Vector3> {
        let (u, v) = self.checked_knot_parameters(t1, t2)?;
        deboor::surface_normal(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
        )
    }
}
