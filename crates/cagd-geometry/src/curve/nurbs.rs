//! NURBS curve.

use cagd_core::traits::Validate;
use cagd_core::{check_unit_parameter, CagdError, Result, Tolerance};
use cagd_math::{project, ControlPoint, DVec4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ArcLengthCache, Curve, DEFAULT_ARC_LENGTH_DIVISIONS};
use crate::nurbs::{deboor, validate_knots};

/// A NURBS (Non-Uniform Rational B-Spline) curve.
///
/// The curve is parameterized over `t` in `[0, 1]`, which maps linearly onto the
/// knot interval `[knots[start_knot], knots[end_knot]]`. By default that is the
/// whole knot vector; a narrower range hides spans at either end.
///
/// Construction validates the definition and copies the control points in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NurbsCurveDef")]
pub struct NurbsCurve {
    degree: usize,
    knots: Vec<f64>,
    control_points: Vec<ControlPoint>,
    start_knot: usize,
    end_knot: usize,
    arc_length_divisions: usize,
    #[serde(skip)]
    arc_lengths: ArcLengthCache,
}

#[derive(Deserialize)]
struct NurbsCurveDef {
    degree: usize,
    knots: Vec<f64>,
    control_points: Vec<ControlPoint>,
    #[serde(default)]
    start_knot: Option<usize>,
    #[serde(default)]
    end_knot: Option<usize>,
    #[serde(default = "default_divisions")]
    arc_length_divisions: usize,
}

fn default_divisions() -> usize {
    DEFAULT_ARC_LENGTH_DIVISIONS
}

impl TryFrom<NurbsCurveDef> for NurbsCurve {
    type Error = CagdError;

    fn try_from(def: NurbsCurveDef) -> Result<Self> {
        let end_knot = def.end_knot.unwrap_or(def.knots.len().saturating_sub(1));
        let mut curve = Self::with_knot_range(
            def.degree,
            def.knots,
            def.control_points,
            def.start_knot.unwrap_or(0),
            end_knot,
        )?;
        curve.set_arc_length_divisions(def.arc_length_divisions)?;
        Ok(curve)
    }
}

impl NurbsCurve {
    /// Create a curve evaluated over the whole knot vector.
    pub fn new(degree: usize, knots: Vec<f64>, control_points: Vec<ControlPoint>) -> Result<Self> {
        let end_knot = knots.len().saturating_sub(1);
        Self::with_knot_range(degree, knots, control_points, 0, end_knot)
    }

    /// Create a curve evaluated over `[knots[start_knot], knots[end_knot]]`.
    pub fn with_knot_range(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<ControlPoint>,
        start_knot: usize,
        end_knot: usize,
    ) -> Result<Self> {
        let curve = Self {
            degree,
            knots,
            control_points,
            start_knot,
            end_knot,
            arc_length_divisions: DEFAULT_ARC_LENGTH_DIVISIONS,
            arc_lengths: ArcLengthCache::new(),
        };
        curve.validate()?;
        debug!(
            degree,
            control_points = curve.control_points.len(),
            knots = curve.knots.len(),
            start_knot,
            end_knot,
            "constructed NURBS curve"
        );
        Ok(curve)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    pub fn start_knot(&self) -> usize {
        self.start_knot
    }

    pub fn end_knot(&self) -> usize {
        self.end_knot
    }

    /// The knot interval that `t` in `[0, 1]` maps onto.
    pub fn parameter_domain(&self) -> (f64, f64) {
        (self.knots[self.start_knot], self.knots[self.end_knot])
    }

    /// Map a normalized parameter onto the knot parameter.
    pub fn knot_parameter(&self, t: f64) -> f64 {
        let (u0, u1) = self.parameter_domain();
        u0 + t * (u1 - u0)
    }

    /// Evaluate the undivided homogeneous point `(w*x, w*y, w*z, w)` at `t`.
    pub fn homogeneous_point_at(&self, t: f64) -> Result<DVec4> {
        check_unit_parameter("t", t)?;
        Ok(deboor::curve_point(
            self.degree,
            &self.knots,
            &self.control_points,
            self.knot_parameter(t),
        ))
    }

    /// Euclidean derivatives of order `0..=nd` at `t`, taken with respect to the
    /// knot parameter. Entry 0 is the point itself.
    pub fn derivatives_at(&self, t: f64, nd: usize) -> Result<Vec<Vector3>> {
        check_unit_parameter("t", t)?;
        deboor::nurbs_curve_derivatives(
            self.degree,
            &self.knots,
            &self.control_points,
            self.knot_parameter(t),
            nd,
        )
    }

    /// Replace one control point and drop the arc-length table.
    pub fn set_control_point(&mut self, index: usize, point: ControlPoint) -> Result<()> {
        let count = self.control_points.len();
        let slot = self.control_points.get_mut(index).ok_or_else(|| {
            CagdError::InvalidArgument(format!(
                "control point index {index} out of range for {count} points"
            ))
        })?;
        point.check()?;
        *slot = point;
        self.invalidate_arc_lengths();
        Ok(())
    }

    /// Change the arc-length sample count and drop the arc-length table.
    pub fn set_arc_length_divisions(&mut self, divisions: usize) -> Result<()> {
        if divisions == 0 {
            return Err(CagdError::InvalidArgument(
                "arc-length table needs at least one division".into(),
            ));
        }
        self.arc_length_divisions = divisions;
        self.invalidate_arc_lengths();
        Ok(())
    }

    /// Drop the cached arc-length table; the next arc-length query rebuilds it.
    pub fn invalidate_arc_lengths(&mut self) {
        self.arc_lengths.invalidate();
    }
}

impl Validate for NurbsCurve {
    fn validate(&self) -> Result<()> {
        if self.degree == 0 {
            return Err(CagdError::InvalidArgument("degree must be at least 1".into()));
        }
        for point in &self.control_points {
            point.check()?;
        }
        validate_knots(self.degree, &self.knots, self.control_points.len())?;

        if self.start_knot >= self.end_knot || self.end_knot >= self.knots.len() {
            return Err(CagdError::MalformedKnotVector(format!(
                "knot range [{}, {}] is not an increasing index range below {}",
                self.start_knot,
                self.end_knot,
                self.knots.len()
            )));
        }
        if self.knots[self.start_knot] >= self.knots[self.end_knot] {
            return Err(CagdError::MalformedKnotVector(format!(
                "knot range [{}, {}] spans no parameter interval",
                self.start_knot, self.end_knot
            )));
        }

        Ok(())
    }
}

impl Curve for NurbsCurve {
    fn point_at(&self, t: f64) -> Result<Point3> {
        project(self.homogeneous_point_at(t)?)
    }

    fn supports_analytic_tangent(&self) -> bool {
        true
    }

    fn tangent_at(&self, t: f64) -> Result<Vector3> {
        let ders = self.derivatives_at(t, 1)?;
        ders[1].try_normalize().ok_or_else(|| {
            warn!(t, "NURBS curve derivative vanishes");
            CagdError::NumericDegeneracy(format!("tangent is undefined at t = {t}"))
        })
    }

    fn is_closed(&self) -> bool {
        match (self.point_at(0.0), self.point_at(1.0)) {
            (Ok(start), Ok(end)) => Tolerance::default().is_zero(start.distance(end)),
            _ => false,
        }
    }

    fn arc_length_divisions(&self) -> usize {
        self.arc_length_divisions
    }

    fn arc_length_cache(&self) -> Option<&ArcLengthCache> {
        Some(&self.arc_lengths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cagd_math::DVec3;

    fn scenario_curve() -> NurbsCurve {
        NurbsCurve::new(
            2,
            vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0],
            vec![
                ControlPoint::new(0.0, 0.0, 0.0, 1.0),
                ControlPoint::new(1.0, 2.0, 0.0, 1.0),
                ControlPoint::new(2.0, 2.0, 0.0, 1.0),
                ControlPoint::new(3.0, 0.0, 0.0, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_scenario_points() {
        let curve = scenario_curve();
        assert_abs_diff_eq!(curve.point_at(0.0).unwrap(), DVec3::ZERO, epsilon = 1e-12);
        assert_abs_diff_eq!(
            curve.point_at(1.0).unwrap(),
            DVec3::new(3.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            curve.point_at(0.5).unwrap(),
            DVec3::new(1.5, 2.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_parameter_out_of_range() {
        let curve = scenario_curve();
        assert!(curve.point_at(-0.1).unwrap_err().is_invalid_argument());
        assert!(curve.tangent_at(1.1).unwrap_err().is_invalid_argument());
        assert!(curve.derivatives_at(2.0, 1).is_err());
    }

    #[test]
    fn test_tangent_symmetric_curve() {
        let curve = scenario_curve();
        // Symmetric control polygon: horizontal tangent in the middle
        let t = curve.tangent_at(0.5).unwrap();
        assert_abs_diff_eq!(t, DVec3::X, epsilon = 1e-12);
        // Tangent at the start follows the first leg of the control polygon
        let t0 = curve.tangent_at(0.0).unwrap();
        assert_abs_diff_eq!(t0, DVec3::new(1.0, 2.0, 0.0).normalize(), epsilon = 1e-12);
    }

    #[test]
    fn test_nurbs_circle() {
        // Represent a unit circle as a NURBS curve (degree 2, 9 control points)
        let w = 1.0_f64 / 2.0_f64.sqrt();
        let points = [
            (1.0, 0.0, 1.0),
            (1.0, 1.0, w),
            (0.0, 1.0, 1.0),
            (-1.0, 1.0, w),
            (-1.0, 0.0, 1.0),
            (-1.0, -1.0, w),
            (0.0, -1.0, 1.0),
            (1.0, -1.0, w),
            (1.0, 0.0, 1.0),
        ];
        let curve = NurbsCurve::new(
            2,
            vec![0.0, 0.0, 0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0],
            points
                .iter()
                .map(|&(x, y, w)| ControlPoint::new(x, y, 0.0, w))
                .collect(),
        )
        .unwrap();

        // Check that all points lie on the unit circle
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let p = curve.point_at(t).unwrap();
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!(
                (r - 1.0).abs() < 1e-8,
                "NURBS circle point at t={} has radius {}, expected 1.0",
                t,
                r
            );
            assert!(p.z.abs() < 1e-10);

            let tangent = curve.tangent_at(t).unwrap();
            assert!(tangent.dot(p).abs() < 1e-8, "tangent not perpendicular to radius at t={t}");
        }
        assert!(curve.is_closed());
        assert!((curve.length().unwrap() - std::f64::consts::TAU).abs() < 1e-3);
    }

    #[test]
    fn test_knot_range_shared_by_point_and_tangent() {
        let knots = vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0];
        let cps: Vec<_> = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(3.0, 1.0, 0.0),
            DVec3::new(4.0, 0.0, 0.0),
        ]
        .into_iter()
        .map(ControlPoint::from_point)
        .collect();

        let full = NurbsCurve::new(2, knots.clone(), cps.clone()).unwrap();
        let middle = NurbsCurve::with_knot_range(2, knots, cps, 3, 4).unwrap();
        assert_eq!(middle.parameter_domain(), (1.0, 2.0));

        // t = 0.5 on the middle span is u = 1.5, i.e. t = 0.5 on the full curve
        assert_abs_diff_eq!(
            middle.point_at(0.5).unwrap(),
            full.point_at(0.5).unwrap(),
            epsilon = 1e-12
        );
        // Start of the middle span is u = 1, i.e. t = 1/3 on the full curve
        assert_abs_diff_eq!(
            middle.point_at(0.0).unwrap(),
            full.point_at(1.0 / 3.0).unwrap(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            middle.tangent_at(0.0).unwrap(),
            full.tangent_at(1.0 / 3.0).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_construction_errors() {
        let knots = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let cps = scenario_curve().control_points().to_vec();

        let err = NurbsCurve::new(2, knots[..6].to_vec(), cps.clone()).unwrap_err();
        assert!(err.is_malformed_knot_vector());

        let err = NurbsCurve::new(0, vec![0.0, 1.0, 2.0, 3.0, 4.0], cps.clone()).unwrap_err();
        assert!(err.is_invalid_argument());

        let mut bad = cps.clone();
        bad[1].w = 0.0;
        let err = NurbsCurve::new(2, knots.clone(), bad).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = NurbsCurve::with_knot_range(2, knots.clone(), cps.clone(), 4, 4).unwrap_err();
        assert!(err.is_malformed_knot_vector());

        // Indices 0 and 2 both hold knot value 0
        let err = NurbsCurve::with_knot_range(2, knots, cps, 0, 2).unwrap_err();
        assert!(err.is_malformed_knot_vector());
    }

    #[test]
    fn test_set_control_point_invalidates_lengths() {
        let mut curve = scenario_curve();
        let before = curve.length().unwrap();
        assert!(curve.arc_length_cache().unwrap().is_valid());

        curve
            .set_control_point(3, ControlPoint::new(6.0, 0.0, 0.0, 1.0))
            .unwrap();
        assert!(!curve.arc_length_cache().unwrap().is_valid());
        assert!(curve.length().unwrap() > before);

        let err = curve
            .set_control_point(9, ControlPoint::new(0.0, 0.0, 0.0, 1.0))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_arc_length_divisions() {
        let mut curve = scenario_curve();
        curve.set_arc_length_divisions(10).unwrap();
        assert_eq!(curve.lengths().unwrap().len(), 11);
        assert!(curve.set_arc_length_divisions(0).is_err());
        // A one-off table of another size does not touch the cache
        assert_eq!(curve.lengths_with(50).unwrap().len(), 51);
        assert_eq!(curve.lengths().unwrap().len(), 11);
    }

    #[test]
    fn test_weight_pulls_curve() {
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let light = NurbsCurve::new(
            2,
            knots.clone(),
            vec![
                ControlPoint::new(0.0, 0.0, 0.0, 1.0),
                ControlPoint::new(1.0, 1.0, 0.0, 1.0),
                ControlPoint::new(2.0, 0.0, 0.0, 1.0),
            ],
        )
        .unwrap();
        let heavy = NurbsCurve::new(
            2,
            knots,
            vec![
                ControlPoint::new(0.0, 0.0, 0.0, 1.0),
                ControlPoint::new(1.0, 1.0, 0.0, 4.0),
                ControlPoint::new(2.0, 0.0, 0.0, 1.0),
            ],
        )
        .unwrap();

        // Weight 4 on the apex: y = 2*4*0.25 / (0.25 + 2*4*0.25 + 0.25) = 0.8
        assert!((light.point_at(0.5).unwrap().y - 0.5).abs() < 1e-12);
        assert!((heavy.point_at(0.5).unwrap().y - 0.8).abs() < 1e-12);
        let h = heavy.homogeneous_point_at(0.5).unwrap();
        assert!((h.w - 2.5).abs() < 1e-12);
    }
}
