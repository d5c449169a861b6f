//! De Boor style evaluation of NURBS curves and surfaces.
//!
//! Control points are weighted [`ControlPoint`]s. Sums are accumulated in
//! homogeneous space and projected back to Euclidean space at the end.

use cagd_core::{CagdError, Result, Tolerance};
use cagd_math::{project, ControlPoint, DVec4, Point3, Vector3};
use tracing::warn;

use super::knot::{basis_function_derivatives, basis_functions, find_span};

/// Evaluate a NURBS curve at knot parameter `u` in homogeneous space.
///
/// Returns `(x*w, y*w, z*w, w)` summed over the active control points; divide by
/// the last component (see [`project`]) for the Euclidean point.
pub fn curve_point(degree: usize, knots: &[f64], control_points: &[ControlPoint], u: f64) -> DVec4 {
    let span = find_span(degree, knots, u);
    let basis = basis_functions(degree, knots, span, u);

    let mut point = DVec4::ZERO;
    for (i, b) in basis.iter().enumerate() {
        point += *b * control_points[span - degree + i].to_homogeneous();
    }

    point
}

/// Evaluate homogeneous curve derivatives of order `0..=nd` at knot parameter `u`.
///
/// Returns exactly `nd + 1` entries. Orders above `degree` are zero.
#[allow(clippy::needless_range_loop)]
pub fn curve_derivatives(
    degree: usize,
    knots: &[f64],
    control_points: &[ControlPoint],
    u: f64,
    nd: usize,
) -> Vec<DVec4> {
    let du = nd.min(degree);
    let span = find_span(degree, knots, u);
    let nders = basis_function_derivatives(degree, knots, span, u, du);

    let mut ck = vec![DVec4::ZERO; nd + 1];
    for k in 0..=du {
        for j in 0..=degree {
            ck[k] += nders[k][j] * control_points[span - degree + j].to_homogeneous();
        }
    }

    ck
}

/// Binomial coefficient `k! / (i! (k-i)!)`, zero when `i > k`.
pub fn binomial(k: usize, i: usize) -> f64 {
    if i > k {
        return 0.0;
    }
    let i = i.min(k - i);
    (1..=i).fold(1.0, |acc, j| acc * (k - i + j) as f64 / j as f64)
}

/// Convert homogeneous derivatives into Euclidean derivatives of the rational curve.
///
/// `pders[k]` is the k-th derivative of `(w*x, w*y, w*z, w)`. Output entry `k` is
/// `(A_k - sum_{i=1..k} C(k,i) w_i C_{k-i}) / w_0`.
pub fn rational_curve_derivatives(pders: &[DVec4]) -> Result<Vec<Vector3>> {
    let Some(w0) = pders.first().map(|d| d.w) else {
        return Ok(Vec::new());
    };
    if !(w0.abs() > Tolerance::DEGENERATE) {
        warn!(w = w0, "rational derivative requested where the curve weight vanishes");
        return Err(CagdError::NumericDegeneracy(format!(
            "curve weight {w0} is zero, rational derivatives are undefined"
        )));
    }

    let mut ck: Vec<Vector3> = Vec::with_capacity(pders.len());
    for k in 0..pders.len() {
        let mut v = pders[k].truncate();
        for i in 1..=k {
            v -= binomial(k, i) * pders[i].w * ck[k - i];
        }
        ck.push(v / w0);
    }

    Ok(ck)
}

/// Euclidean derivatives of order `0..=nd` of a NURBS curve at knot parameter `u`.
///
/// Entry 0 is the curve point itself.
pub fn nurbs_curve_derivatives(
    degree: usize,
    knots: &[f64],
    control_points: &[ControlPoint],
    u: f64,
    nd: usize,
) -> Result<Vec<Vector3>> {
    let pders = curve_derivatives(degree, knots, control_points, u, nd);
    rational_curve_derivatives(&pders)
}

/// Evaluate a NURBS surface at knot parameters `(u, v)` in homogeneous space.
///
/// `control_points[i][j]` is the control point at row `i` (u-direction) and
/// column `j` (v-direction). Each of the `degree_v + 1` active columns is first
/// blended along u, then the partial sums are blended along v.
#[allow(clippy::too_many_arguments)]
pub fn surface_point_homogeneous(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<ControlPoint>],
    u: f64,
    v: f64,
) -> DVec4 {
    let span_u = find_span(degree_u, knots_u, u);
    let span_v = find_span(degree_v, knots_v, v);
    let basis_u = basis_functions(degree_u, knots_u, span_u, u);
    let basis_v = basis_functions(degree_v, knots_v, span_v, v);

    let mut sw = DVec4::ZERO;
    for (l, bv) in basis_v.iter().enumerate() {
        let v_idx = span_v - degree_v + l;
        let mut temp = DVec4::ZERO;
        for (k, bu) in basis_u.iter().enumerate() {
            temp += *bu * control_points[span_u - degree_u + k][v_idx].to_homogeneous();
        }
        sw += *bv * temp;
    }

    sw
}

/// Evaluate a NURBS surface point at knot parameters `(u, v)`.
#[allow(clippy::too_many_arguments)]
pub fn surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<ControlPoint>],
    u: f64,
    v: f64,
) -> Result<Point3> {
    project(surface_point_homogeneous(
        degree_u,
        degree_v,
        knots_u,
        knots_v,
        control_points,
        u,
        v,
    ))
}

/// Evaluate a NURBS surface point and its first partial derivatives at `(u, v)`.
///
/// Returns `(S, S_u, S_v)` with derivatives taken with respect to the knot
/// parameters.
#[allow(clippy::too_many_arguments)]
pub fn surface_derivatives(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<ControlPoint>],
    u: f64,
    v: f64,
) -> Result<(Point3, Vector3, Vector3)> {
    let span_u = find_span(degree_u, knots_u, u);
    let span_v = find_span(degree_v, knots_v, v);
    let ders_u = basis_function_derivatives(degree_u, knots_u, span_u, u, 1);
    let ders_v = basis_function_derivatives(degree_v, knots_v, span_v, v, 1);

    let mut sw = DVec4::ZERO;
    let mut sw_u = DVec4::ZERO;
    let mut sw_v = DVec4::ZERO;

    for l in 0..=degree_v {
        let v_idx = span_v - degree_v + l;
        for k in 0..=degree_u {
            let pw = control_points[span_u - degree_u + k][v_idx].to_homogeneous();
            sw += ders_u[0][k] * ders_v[0][l] * pw;
            sw_u += ders_u[1][k] * ders_v[0][l] * pw;
            sw_v += ders_u[0][k] * ders_v[1][l] * pw;
        }
    }

    let point = project(sw)?;
    let du = (sw_u.truncate() - sw_u.w * point) / sw.w;
    let dv = (sw_v.truncate() - sw_v.w * point) / sw.w;

    Ok((point, du, dv))
}

/// Evaluate the unit normal `S_u x S_v` of a NURBS surface at `(u, v)`.
#[allow(clippy::too_many_arguments)]
pub fn surface_normal(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<ControlPoint>],
    u: f64,
    v: f64,
) -> Result<Vector3> {
    let (_, du, dv) =
        surface_derivatives(degree_u, degree_v, knots_u, knots_v, control_points, u, v)?;

    let normal = du.cross(dv);
    let len = normal.length();
    if !(len > Tolerance::DEGENERATE) {
        warn!(u, v, "surface partial derivatives are parallel");
        return Err(CagdError::NumericDegeneracy(format!(
            "surface normal is undefined at ({u}, {v})"
        )));
    }

    Ok(normal / len)
}
