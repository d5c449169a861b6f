//! Curve trait, arc-length sampling and implementations.

mod arc_length;
mod frenet;
mod line;
mod nurbs;

use std::borrow::Cow;

use cagd_core::{check_unit_parameter, CagdError, Result};
use cagd_math::{Point3, Vector3};
use tracing::warn;

pub use arc_length::{cumulative_lengths, ArcLengthCache, DEFAULT_ARC_LENGTH_DIVISIONS};
pub use frenet::FrenetFrames;
pub use line::Line;
pub use nurbs::NurbsCurve;

use arc_length::parameter_at_length;

/// Half-width of the parameter interval used by the finite-difference tangent.
pub const TANGENT_DELTA: f64 = 1e-4;

/// Trait for parametric curves in 3D space, parameterized over `[0, 1]`.
///
/// Only [`Curve::point_at`] is required. Arc-length sampling, tangents and
/// moving frames are built on top of it; implementations with an exact
/// derivative override [`Curve::tangent_at`] and report it through
/// [`Curve::supports_analytic_tangent`].
pub trait Curve: Send + Sync {
    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Result<Point3>;

    /// Whether `tangent_at` is computed from an exact derivative.
    fn supports_analytic_tangent(&self) -> bool {
        false
    }

    /// Evaluate the unit tangent at parameter `t`.
    ///
    /// The default estimate is the normalized secant between `t - TANGENT_DELTA`
    /// and `t + TANGENT_DELTA`, both clamped to `[0, 1]`.
    fn tangent_at(&self, t: f64) -> Result<Vector3> {
        check_unit_parameter("t", t)?;
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        let secant = self.point_at(t2)? - self.point_at(t1)?;
        secant.try_normalize().ok_or_else(|| {
            warn!(t, "finite-difference tangent has zero length");
            CagdError::NumericDegeneracy(format!("tangent is undefined at t = {t}"))
        })
    }

    /// Whether the curve is closed (start == end).
    fn is_closed(&self) -> bool {
        false
    }

    /// Number of samples in the arc-length table.
    fn arc_length_divisions(&self) -> usize {
        DEFAULT_ARC_LENGTH_DIVISIONS
    }

    /// Storage for the arc-length table; `None` rebuilds it on every request.
    fn arc_length_cache(&self) -> Option<&ArcLengthCache> {
        None
    }

    /// Cumulative arc lengths at `arc_length_divisions() + 1` uniform parameters.
    fn lengths(&self) -> Result<Cow<'_, [f64]>> {
        let divisions = self.arc_length_divisions();
        match self.arc_length_cache() {
            Some(cache) => cache
                .get_or_try_build(|| cumulative_lengths(self, divisions))
                .map(Cow::Borrowed),
            None => cumulative_lengths(self, divisions).map(Cow::Owned),
        }
    }

    /// Cumulative arc lengths at `divisions + 1` uniform parameters, never cached.
    fn lengths_with(&self, divisions: usize) -> Result<Vec<f64>> {
        cumulative_lengths(self, divisions)
    }

    /// Total (polyline-approximated) arc length.
    fn length(&self) -> Result<f64> {
        Ok(self.lengths()?.last().copied().unwrap_or(0.0))
    }

    /// Map an arc-length fraction `u` in `[0, 1]` onto the curve parameter `t`.
    fn u_to_t(&self, u: f64) -> Result<f64> {
        check_unit_parameter("u", u)?;
        let lengths = self.lengths()?;
        let total = lengths[lengths.len() - 1];
        Ok(parameter_at_length(&lengths, u * total))
    }

    /// Map an absolute arc length from the start of the curve onto `t`.
    fn distance_to_t(&self, distance: f64) -> Result<f64> {
        let lengths = self.lengths()?;
        let total = lengths[lengths.len() - 1];
        if !(0.0..=total).contains(&distance) {
            return Err(CagdError::InvalidArgument(format!(
                "distance must lie in [0, {total}], got {distance}"
            )));
        }
        Ok(parameter_at_length(&lengths, distance))
    }

    /// Evaluate the point at arc-length fraction `u`.
    fn point_at_arc(&self, u: f64) -> Result<Point3> {
        self.point_at(self.u_to_t(u)?)
    }

    /// Evaluate the unit tangent at arc-length fraction `u`.
    fn tangent_at_arc(&self, u: f64) -> Result<Vector3> {
        self.tangent_at(self.u_to_t(u)?)
    }

    /// `divisions + 1` points at uniform parameter steps.
    fn points(&self, divisions: usize) -> Result<Vec<Point3>> {
        if divisions == 0 {
            return Err(CagdError::InvalidArgument(
                "sampling needs at least one division".into(),
            ));
        }
        (0..=divisions)
            .map(|i| self.point_at(i as f64 / divisions as f64))
            .collect()
    }

    /// `divisions + 1` points at uniform arc-length steps.
    fn spaced_points(&self, divisions: usize) -> Result<Vec<Point3>> {
        if divisions == 0 {
            return Err(CagdError::InvalidArgument(
                "sampling needs at least one division".into(),
            ));
        }
        let lengths = self.lengths()?;
        let total = lengths[lengths.len() - 1];
        (0..=divisions)
            .map(|i| {
                let u = i as f64 / divisions as f64;
                self.point_at(parameter_at_length(&lengths, u * total))
            })
            .collect()
    }

    /// Moving frames at `segments + 1` arc-length-uniform samples.
    ///
    /// With `closed`, the twist between the first and last normal is removed by
    /// distributing it evenly along the curve.
    fn frenet_frames(&self, segments: usize, closed: bool) -> Result<FrenetFrames> {
        frenet::compute(self, segments, closed)
    }
}
