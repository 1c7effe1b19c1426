//! Numerical quadrature on sampled grids.
//!
//! Provides evenly spaced grid construction and composite integration rules
//! over tabulated function values:
//!
//! - **Simpson's rule**: Composite parabolic rule. Grids with
//!   an odd number of intervals close the last interval with the parabola
//!   through the final three points, so every grid of 3+ points is handled
//!   (exact for quadratics, and for cubics on uniform even-interval grids).
//! - **Trapezoid rule**: Piecewise linear rule for coarse or 2-point grids.
//!
//! Both rules accept non-uniform abscissae as long as they are strictly
//! increasing.

use ndarray::Array1;
use thiserror::Error;

/// Errors that can occur during quadrature.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuadratureError {
    #[error("Input vectors must have the same length ({0} vs {1})")]
    MismatchedLengths(usize, usize),
    #[error("At least {required} points are required, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },
    #[error("Abscissae must be strictly increasing (index {0})")]
    NotIncreasing(usize),
}

/// Create `num` evenly spaced values over the closed interval `[start, stop]`.
///
/// Both endpoints are included, matching the usual `linspace` convention.
pub fn linspace(start: f64, stop: f64, num: usize) -> Array1<f64> {
    Array1::linspace(start, stop, num)
}

fn validate(ys: &[f64], xs: &[f64], required: usize) -> Result<(), QuadratureError> {
    if xs.len() != ys.len() {
        return Err(QuadratureError::MismatchedLengths(ys.len(), xs.len()));
    }
    if xs.len() < required {
        return Err(QuadratureError::InsufficientPoints {
            required,
            actual: xs.len(),
        });
    }
    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(QuadratureError::NotIncreasing(i));
        }
    }
    Ok(())
}

/// Integrate tabulated values with the composite trapezoid rule.
///
/// # Arguments
/// * `ys` - Function values
/// * `xs` - Strictly increasing abscissae, same length as `ys`
///
/// # Returns
/// * `Ok(f64)` - Approximate integral over `[xs[0], xs[n-1]]`
/// * `Err(QuadratureError)` - Mismatched lengths, fewer than 2 points, or unsorted abscissae
pub fn trapezoid(ys: &[f64], xs: &[f64]) -> Result<f64, QuadratureError> {
    validate(ys, xs, 2)?;

    Ok(xs
        .windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum())
}

/// Integrate tabulated values with the composite Simpson rule.
///
/// Consecutive pairs of intervals are integrated with the (possibly
/// non-uniform) three-point parabola. When the number of intervals is odd the
/// final interval is integrated with the parabola through the last three
/// points.
///
/// # Arguments
/// * `ys` - Function values
/// * `xs` - Strictly increasing abscissae, same length as `ys`
///
/// # Returns
/// * `Ok(f64)` - Approximate integral over `[xs[0], xs[n-1]]`
/// * `Err(QuadratureError)` - Mismatched lengths, fewer than 3 points, or unsorted abscissae
pub fn simpson(ys: &[f64], xs: &[f64]) -> Result<f64, QuadratureError> {
    validate(ys, xs, 3)?;

    let n = xs.len();
    let intervals = n - 1;
    let paired = intervals - intervals % 2;

    let mut total = 0.0;
    for i in (0..paired).step_by(2) {
        let h0 = xs[i + 1] - xs[i];
        let h1 = xs[i + 2] - xs[i + 1];
        let hsum = h0 + h1;
        total += hsum / 6.0
            * ((2.0 - h1 / h0) * ys[i]
                + hsum * hsum / (h0 * h1) * ys[i + 1]
                + (2.0 - h0 / h1) * ys[i + 2]);
    }

    if intervals % 2 == 1 {
        // Parabola through the last three points, integrated over the last interval
        let h0 = xs[n - 2] - xs[n - 3];
        let h1 = xs[n - 1] - xs[n - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        total += alpha * ys[n - 1] + beta * ys[n - 2] - eta * ys[n - 3];
    }

    Ok(total)
}

/// Composite Simpson rule for values sampled with constant spacing `dx`.
pub fn simpson_uniform(ys: &[f64], dx: f64) -> Result<f64, QuadratureError> {
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64 * dx).collect();
    simpson(ys, &xs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadratic(x: f64) -> f64 {
        2.0 * x * x - x + 3.0
    }

    fn quadratic_integral(a: f64, b: f64) -> f64 {
        let f = |x: f64| 2.0 * x.powi(3) / 3.0 - 0.5 * x * x + 3.0 * x;
        f(b) - f(a)
    }

    fn cubic(x: f64) -> f64 {
        2.0 * x * x * x - x * x + 3.0 * x - 5.0
    }

    // Antiderivative of `cubic`
    fn cubic_integral(a: f64, b: f64) -> f64 {
        let f = |x: f64| 0.5 * x.powi(4) - x.powi(3) / 3.0 + 1.5 * x * x - 5.0 * x;
        f(b) - f(a)
    }

    #[test]
    fn test_linspace_endpoints() {
        let grid = linspace(380.0, 790.0, 4100);
        assert_eq!(grid.len(), 4100);
        assert_eq!(grid[0], 380.0);
        assert_relative_eq!(grid[4099], 790.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simpson_exact_for_cubic_even_intervals() {
        let xs = linspace(-1.0, 2.0, 11);
        let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
        let result = simpson(&ys, xs.as_slice().unwrap()).unwrap();
        assert_relative_eq!(result, cubic_integral(-1.0, 2.0), epsilon = 1e-10);
    }

    #[test]
    fn test_simpson_exact_for_quadratic_odd_intervals() {
        // 10 points -> 9 intervals, exercises the last-interval correction
        let xs = linspace(0.5, 4.0, 10);
        let ys: Vec<f64> = xs.iter().map(|&x| quadratic(x)).collect();
        let result = simpson(&ys, xs.as_slice().unwrap()).unwrap();
        assert_relative_eq!(result, quadratic_integral(0.5, 4.0), epsilon = 1e-10);
    }

    #[test]
    fn test_simpson_cubic_odd_intervals_close() {
        let xs = linspace(0.5, 4.0, 200);
        let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
        let result = simpson(&ys, xs.as_slice().unwrap()).unwrap();
        assert_relative_eq!(result, cubic_integral(0.5, 4.0), max_relative = 1e-8);
    }

    #[test]
    fn test_simpson_non_uniform_grid() {
        let xs = vec![0.0, 0.1, 0.35, 0.5, 1.0, 1.2, 2.0];
        let ys: Vec<f64> = xs.iter().map(|&x| quadratic(x)).collect();
        let result = simpson(&ys, &xs).unwrap();
        assert_relative_eq!(result, quadratic_integral(0.0, 2.0), epsilon = 1e-10);
    }

    #[test]
    fn test_simpson_uniform_matches_general() {
        let ys: Vec<f64> = (0..21).map(|i| (i as f64 * 0.1).sin()).collect();
        let result = simpson_uniform(&ys, 0.1).unwrap();
        assert_relative_eq!(result, 1.0 - 2.0_f64.cos(), epsilon = 1e-5);
    }

    #[test]
    fn test_trapezoid_linear_exact() {
        let xs = vec![0.0, 1.0, 3.0];
        let ys = vec![1.0, 3.0, 7.0]; // y = 2x + 1
        assert_relative_eq!(trapezoid(&ys, &xs).unwrap(), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quadrature_errors() {
        assert_eq!(
            simpson(&[1.0, 2.0], &[0.0, 1.0]),
            Err(QuadratureError::InsufficientPoints {
                required: 3,
                actual: 2
            })
        );
        assert_eq!(
            trapezoid(&[1.0, 2.0, 3.0], &[0.0, 1.0]),
            Err(QuadratureError::MismatchedLengths(3, 2))
        );
        assert_eq!(
            simpson(&[1.0, 2.0, 3.0], &[0.0, 2.0, 1.0]),
            Err(QuadratureError::NotIncreasing(2))
        );
    }
}
