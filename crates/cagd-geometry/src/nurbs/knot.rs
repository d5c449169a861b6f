//! Knot vector utilities and B-spline basis functions.

use cagd_core::{CagdError, Result};

/// Find the knot span index for parameter `t` in the knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`. Parameters at
/// or beyond the upper end of the domain map to the last span `n`, and
/// parameters at or below the lower end map to `degree`; out-of-domain values
/// are clamped rather than rejected.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector, `n + degree + 2` entries for `n + 1` control points
/// * `t` - Parameter value
pub fn find_span(degree: usize, knots: &[f64], t: f64) -> usize {
    debug_assert!(knots.len() >= 2 * degree + 2, "knot vector too short for degree {degree}");
    let n = knots.len() - degree - 2;

    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }

    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;

    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }

    mid
}

/// Compute the non-vanishing basis functions at parameter `t`.
///
/// Returns a vector of `degree + 1` basis function values N_{span-degree,degree}(t)
/// through N_{span,degree}(t). They are non-negative and sum to one.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `span` - The knot span index (from `find_span`)
/// * `t` - Parameter value
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }

        n[j] = saved;
    }

    n
}

/// Compute basis functions and their derivatives up to order `n` at parameter `t`.
///
/// Returns `ders` with `n + 1` rows of `degree + 1` values, where `ders[k][j]`
/// is the k-th derivative of N_{span-degree+j,degree}. Row 0 holds the basis
/// values themselves. Rows with `k > degree` are zero.
#[allow(clippy::needless_range_loop)]
pub fn basis_function_derivatives(
    degree: usize,
    knots: &[f64],
    span: usize,
    t: f64,
    n: usize,
) -> Vec<Vec<f64>> {
    let p = degree;
    let mut ders = vec![vec![0.0; p + 1]; n + 1];

    // Triangular table: basis values in the upper triangle, knot differences in the lower
    let mut ndu = vec![vec![0.0; p + 1]; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    ndu[0][0] = 1.0;

    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            // Lower triangle
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];

            // Upper triangle
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    let max_order = n.min(p);
    let mut a = vec![vec![0.0; p + 1]; 2];

    for r in 0..=p {
        let mut s1 = 0usize;
        let mut s2 = 1usize;
        a[0][0] = 1.0;

        for k in 1..=max_order {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p - k;

            if rk >= 0 {
                let rk = rk as usize;
                a[s2][0] = a[s1][0] / ndu[pk + 1][rk];
                d = a[s2][0] * ndu[rk][pk];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r <= pk + 1 { k - 1 } else { p - r };

            for j in j1..=j2 {
                let idx = (rk + j as isize) as usize;
                a[s2][j] = (a[s1][j] - a[s1][j - 1]) / ndu[pk + 1][idx];
                d += a[s2][j] * ndu[idx][pk];
            }

            if r <= pk {
                a[s2][k] = -a[s1][k - 1] / ndu[pk + 1][r];
                d += a[s2][k] * ndu[r][pk];
            }

            ders[k][r] = d;

            // Swap rows
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Multiply through by p (p-1) ... (p-k+1)
    let mut factor = p as f64;
    for k in 1..=max_order {
        for val in &mut ders[k] {
            *val *= factor;
        }
        factor *= (p - k) as f64;
    }

    ders
}

/// Check that `knots` can drive a B-spline of `degree` with `control_count` control points.
///
/// The vector must have `control_count + degree + 1` finite, non-decreasing
/// entries and a non-empty domain `[knots[degree], knots[control_count]]`.
pub fn validate_knots(degree: usize, knots: &[f64], control_count: usize) -> Result<()> {
    if control_count < degree + 1 {
        return Err(CagdError::InvalidArgument(format!(
            "degree {degree} needs at least {} control points, got {control_count}",
            degree + 1
        )));
    }

    let expected = control_count + degree + 1;
    if knots.len() != expected {
        return Err(CagdError::MalformedKnotVector(format!(
            "expected {expected} knots for {control_count} control points of degree {degree}, got {}",
            knots.len()
        )));
    }

    if let Some(i) = knots.iter().position(|k| !k.is_finite()) {
        return Err(CagdError::MalformedKnotVector(format!(
            "knot {i} is not finite: {}",
            knots[i]
        )));
    }

    if let Some(i) = knots.windows(2).position(|w| w[0] > w[1]) {
        return Err(CagdError::MalformedKnotVector(format!(
            "knots must be non-decreasing, but knot {} ({}) > knot {} ({})",
            i,
            knots[i],
            i + 1,
            knots[i + 1]
        )));
    }

    if knots[degree] >= knots[control_count] {
        return Err(CagdError::MalformedKnotVector(format!(
            "empty parameter domain [{}, {}]",
            knots[degree], knots[control_count]
        )));
    }

    Ok(())
}

/// Build a clamped knot vector on `[0, 1]` with evenly spaced interior knots.
///
/// The first `degree + 1` knots are zero; the remaining `control_count` knots are
/// `(i + 1) / (control_count - degree)` clamped to `[0, 1]`, which repeats the
/// end knot `degree + 1` times.
pub fn clamped_uniform_knots(degree: usize, control_count: usize) -> Result<Vec<f64>> {
    if control_count <= degree {
        return Err(CagdError::InvalidArgument(format!(
            "degree {degree} needs at least {} control points, got {control_count}",
            degree + 1
        )));
    }

    let spans = (control_count - degree) as f64;
    let mut knots = vec![0.0; degree + 1];
    knots.extend((0..control_count).map(|i| ((i + 1) as f64 / spans).clamp(0.0, 1.0)));
    Ok(knots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_span_uniform() {
        // Degree 2, 5 control points, uniform knot vector
        let knots = vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0];
        let degree = 2;

        assert_eq!(find_span(degree, &knots, 0.0), 2);
        assert_eq!(find_span(degree, &knots, 0.5), 2);
        assert_eq!(find_span(degree, &knots, 1.0), 3);
        assert_eq!(find_span(degree, &knots, 1.5), 3);
        assert_eq!(find_span(degree, &knots, 2.5), 4);
        assert_eq!(find_span(degree, &knots, 3.0), 4);
    }

    #[test]
    fn test_find_span_clamps_out_of_domain() {
        let knots = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        assert_eq!(find_span(2, &knots, -3.0), 2);
        assert_eq!(find_span(2, &knots, 7.0), 3);
    }

    #[test]
    fn test_find_span_interior_multiplicity() {
        // Interior knot 1.0 repeated degree + 1 times
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        let degree = 2;

        assert_eq!(find_span(degree, &knots, 0.99), 2);
        assert_eq!(find_span(degree, &knots, 1.0), 5);
        assert_eq!(find_span(degree, &knots, 1.5), 5);
        assert_eq!(find_span(degree, &knots, 2.0), 5);
    }

    #[test]
    fn test_basis_functions_partition_of_unity() {
        let knots = vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0];
        let degree = 2;

        // Basis functions should sum to 1 (partition of unity)
        for &t in &[0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0] {
            let span = find_span(degree, &knots, t);
            let basis = basis_functions(degree, &knots, span, t);
            let sum: f64 = basis.iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-12,
                "Partition of unity failed at t={}: sum={}",
                t,
                sum
            );
        }
    }

    #[test]
    fn test_basis_functions_non_negative() {
        let knots = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let degree = 3;

        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let span = find_span(degree, &knots, t);
            let basis = basis_functions(degree, &knots, span, t);
            for (j, &val) in basis.iter().enumerate() {
                assert!(
                    val >= -1e-15,
                    "Negative basis at t={}, j={}: {}",
                    t,
                    j,
                    val
                );
            }
        }
    }

    #[test]
    fn test_basis_functions_at_breakpoint() {
        let knots = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let span = find_span(2, &knots, 0.5);
        assert_eq!(span, 3);
        let basis = basis_functions(2, &knots, span, 0.5);
        assert!((basis[0] - 0.5).abs() < 1e-12);
        assert!((basis[1] - 0.5).abs() < 1e-12);
        assert!(basis[2].abs() < 1e-12);
    }

    #[test]
    fn test_derivatives_row_zero_matches_basis() {
        let knots = vec![0.0, 0.0, 0.0, 0.0, 0.3, 0.7, 1.0, 1.0, 1.0, 1.0];
        let degree = 3;
        for &t in &[0.0, 0.1, 0.3, 0.55, 0.9, 1.0] {
            let span = find_span(degree, &knots, t);
            let basis = basis_functions(degree, &knots, span, t);
            let ders = basis_function_derivatives(degree, &knots, span, t, 2);
            assert_eq!(ders.len(), 3);
            for j in 0..=degree {
                assert!((ders[0][j] - basis[j]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let knots = vec![0.0, 0.0, 0.0, 0.0, 0.3, 0.7, 1.0, 1.0, 1.0, 1.0];
        let degree = 3;
        let h = 1e-6;

        for &t in &[0.1, 0.45, 0.8] {
            let span = find_span(degree, &knots, t);
            let ders = basis_function_derivatives(degree, &knots, span, t, 2);
            let lo = basis_functions(degree, &knots, span, t - h);
            let mid = basis_functions(degree, &knots, span, t);
            let hi = basis_functions(degree, &knots, span, t + h);

            for j in 0..=degree {
                let first = (hi[j] - lo[j]) / (2.0 * h);
                let second = (hi[j] - 2.0 * mid[j] + lo[j]) / (h * h);
                assert!(
                    (ders[1][j] - first).abs() < 1e-5,
                    "first derivative mismatch at t={t}, j={j}: {} vs {first}",
                    ders[1][j]
                );
                assert!(
                    (ders[2][j] - second).abs() < 1e-2,
                    "second derivative mismatch at t={t}, j={j}: {} vs {second}",
                    ders[2][j]
                );
            }
        }
    }

    #[test]
    fn test_derivatives_sum_to_zero() {
        let knots = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
        let degree = 2;
        let t = 0.6;
        let span = find_span(degree, &knots, t);
        let ders = basis_function_derivatives(degree, &knots, span, t, 2);
        for k in 1..=2 {
            let sum: f64 = ders[k].iter().sum();
            assert!(sum.abs() < 1e-9, "derivative row {k} sums to {sum}");
        }
    }

    #[test]
    fn test_derivatives_above_degree_are_zero() {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let span = find_span(1, &knots, 0.4);
        let ders = basis_function_derivatives(1, &knots, span, 0.4, 3);
        assert_eq!(ders.len(), 4);
        assert_eq!(ders[1], vec![-1.0, 1.0]);
        assert!(ders[2].iter().chain(ders[3].iter()).all(|&v| v == 0.0));
    }

    #[test]
    fn test_validate_knots() {
        let knots = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        assert!(validate_knots(2, &knots, 4).is_ok());

        let err = validate_knots(2, &knots, 5).unwrap_err();
        assert!(err.is_malformed_knot_vector());

        let err = validate_knots(2, &[0.0, 0.0, 0.0, 0.7, 0.5, 1.0, 1.0], 4).unwrap_err();
        assert!(err.is_malformed_knot_vector());

        let err = validate_knots(2, &[0.0, 0.0, 0.0, f64::NAN, 1.0, 1.0, 1.0], 4).unwrap_err();
        assert!(err.is_malformed_knot_vector());

        let err = validate_knots(1, &[1.0, 1.0, 1.0, 1.0], 2).unwrap_err();
        assert!(err.is_malformed_knot_vector());

        let err = validate_knots(3, &[0.0, 0.0, 1.0, 1.0], 2).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_clamped_uniform_knots() {
        let knots = clamped_uniform_knots(2, 7).unwrap();
        let expected = [0.0, 0.0, 0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.0, 1.0];
        assert_eq!(knots.len(), expected.len());
        for (k, e) in knots.iter().zip(expected) {
            assert!((k - e).abs() < 1e-12);
        }
        assert!(validate_knots(2, &knots, 7).is_ok());

        assert_eq!(clamped_uniform_knots(1, 2).unwrap(), vec![0.0, 0.0, 1.0, 1.0]);
        assert!(clamped_uniform_knots(3, 3).is_err());
    }
}
