//! Bounded scalar optimization
//!
//! Brent's method for minimizing a function of one variable on a closed
//! interval. Each iteration attempts a parabolic interpolation step through
//! the three best points and falls back to a golden-section step whenever the
//! parabola is not acceptable, so convergence is guaranteed for any
//! continuous function and superlinear near a smooth minimum.
//!
//! The search never evaluates outside `[lower, upper]`. For a function that
//! is monotonic on the interval the result converges to within the tolerance
//! of the appropriate endpoint.

use thiserror::Error;

/// Golden-section ratio used for the fallback step
const GOLDEN_MEAN: f64 = 0.381_966_011_250_105_1;

/// Errors that can occur during bounded optimization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("Invalid bounds: lower ({lower}) must be finite and less than upper ({upper})")]
    InvalidBounds { lower: f64, upper: f64 },
    #[error("Objective returned a non-finite value at x = {0}")]
    NonFiniteValue(f64),
    #[error("Failed to converge within {0} function evaluations")]
    MaxEvaluations(usize),
}

/// Result of a bounded optimization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedMinimum {
    /// Location of the optimum
    pub x: f64,
    /// Objective value at `x`
    pub value: f64,
    /// Number of objective evaluations used
    pub evaluations: usize,
}

fn checked<F: FnMut(f64) -> f64>(f: &mut F, x: f64) -> Result<f64, OptimizeError> {
    let value = f(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OptimizeError::NonFiniteValue(x))
    }
}

fn sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Minimize `f` on `[lower, upper]` using Brent's method.
///
/// # Arguments
/// * `f` - Objective function
/// * `lower` - Lower bound of the search interval
/// * `upper` - Upper bound of the search interval
/// * `xatol` - Absolute tolerance on the location of the minimum
/// * `max_evaluations` - Maximum number of objective evaluations
///
/// # Returns
/// * `Ok(BoundedMinimum)` - Location and value of the minimum
/// * `Err(OptimizeError)` - Invalid bounds, a non-finite objective value, or no convergence
pub fn minimize_bounded<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    xatol: f64,
    max_evaluations: usize,
) -> Result<BoundedMinimum, OptimizeError>
where
    F: FnMut(f64) -> f64,
{
    if !lower.is_finite() || !upper.is_finite() || lower >= upper {
        return Err(OptimizeError::InvalidBounds { lower, upper });
    }

    let sqrt_eps = f64::EPSILON.sqrt();

    let (mut a, mut b) = (lower, upper);
    // x: best point so far, w: second best, v: previous value of w
    let mut v = a + GOLDEN_MEAN * (b - a);
    let mut w = v;
    let mut x = v;
    let mut fx = checked(&mut f, x)?;
    let mut fv = fx;
    let mut fw = fx;
    let mut evaluations = 1;

    let mut rat: f64 = 0.0;
    let mut e: f64 = 0.0;

    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * x.abs() + xatol / 3.0;
    let mut tol2 = 2.0 * tol1;

    while (x - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;

        if e.abs() > tol1 {
            // Try a parabolic fit through x, w, v
            golden = false;
            let mut r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - x) && p < q * (b - x) {
                rat = p / q;
                let u = x + rat;
                // Don't evaluate too close to the bounds
                if (u - a) < tol2 || (b - u) < tol2 {
                    rat = tol1 * sign(xm - x);
                }
            } else {
                golden = true;
            }
        }

        if golden {
            e = if x >= xm { a - x } else { b - x };
            rat = GOLDEN_MEAN * e;
        }

        let u = x + sign(rat) * rat.abs().max(tol1);
        let fu = checked(&mut f, u)?;
        evaluations += 1;

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * x.abs() + xatol / 3.0;
        tol2 = 2.0 * tol1;

        if evaluations >= max_evaluations {
            return Err(OptimizeError::MaxEvaluations(evaluations));
        }
    }

    Ok(BoundedMinimum {
        x,
        value: fx,
        evaluations,
    })
}

/// Maximize `f` on `[lower, upper]` by minimizing its negation.
///
/// The returned `value` is the maximum of `f` itself (not the negated value).
pub fn maximize_bounded<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    xatol: f64,
    max_evaluations: usize,
) -> Result<BoundedMinimum, OptimizeError>
where
    F: FnMut(f64) -> f64,
{
    let result = minimize_bounded(|x| -f(x), lower, upper, xatol, max_evaluations)?;
    Ok(BoundedMinimum {
        value: -result.value,
        ..result
    })
}
