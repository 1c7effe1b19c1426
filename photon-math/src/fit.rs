//! Levenberg-Marquardt nonlinear least squares
//!
//! Fits a parametric model `y = f(x; p)` to data with absolute per-point
//! uncertainties by minimizing `chi2 = sum(((y_i - f(x_i; p)) / sigma_i)^2)`.
//!
//! The Jacobian is estimated with forward differences (falling back to
//! backward differences when the forward point is outside the model's
//! domain). Damping follows Marquardt's scaling: the normal matrix is
//! normalized to unit diagonal before `lambda * I` is added, which makes the
//! step invariant to the very different magnitudes of physical parameters
//! (e.g. a scale factor of 1e-30 next to a temperature of 1e4).

use log::debug;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Errors that can occur while fitting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Input vectors must have the same length (x: {x}, y: {y}, sigma: {sigma})")]
    MismatchedLengths { x: usize, y: usize, sigma: usize },
    #[error("{points} data points cannot constrain {parameters} parameters")]
    InsufficientData { points: usize, parameters: usize },
    #[error("Uncertainty at index {0} must be positive and finite")]
    InvalidSigma(usize),
    #[error("Model cannot be evaluated at the initial parameters")]
    InvalidInitialParameters,
    #[error("Parameter {0} has no influence on the model (singular normal matrix)")]
    SingularMatrix(usize),
    #[error("Failed to converge within {0} iterations")]
    NoConvergence(usize),
}

/// Tuning knobs for the solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Maximum number of accepted or rejected steps
    pub max_iterations: usize,
    /// Relative chi-square decrease below which the fit is converged
    pub tolerance: f64,
    /// Starting damping factor
    pub initial_lambda: f64,
    /// Relative finite-difference step for the Jacobian
    pub derivative_step: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-12,
            initial_lambda: 1e-3,
            derivative_step: 1e-7,
        }
    }
}

/// Result of a successful fit
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Best-fit parameters
    pub parameters: Vec<f64>,
    /// Parameter covariance matrix `(J^T W J)^-1`
    pub covariance: DMatrix<f64>,
    /// 1-sigma parameter uncertainties (square root of the covariance diagonal)
    pub uncertainties: Vec<f64>,
    /// Chi-square at the best fit
    pub chi2: f64,
    /// Degrees of freedom (points minus parameters)
    pub ndof: usize,
    /// `chi2 / ndof`
    pub reduced_chi2: f64,
    /// Iterations used
    pub iterations: usize,
}

struct Problem<'a, F> {
    model: F,
    xs: &'a [f64],
    ys: &'a [f64],
    sigmas: &'a [f64],
}

impl<F, E> Problem<'_, F>
where
    F: Fn(f64, &[f64]) -> Result<f64, E>,
{
    /// Weighted residuals `(y - f) / sigma`, or None outside the model domain
    fn residuals(&self, params: &[f64]) -> Option<DVector<f64>> {
        let mut r = DVector::zeros(self.xs.len());
        for i in 0..self.xs.len() {
            let value = (self.model)(self.xs[i], params).ok()?;
            if !value.is_finite() {
                return None;
            }
            r[i] = (self.ys[i] - value) / self.sigmas[i];
        }
        Some(r)
    }

    /// Jacobian of the weighted model values, `d f_i / d p_j / sigma_i`
    fn jacobian(&self, params: &[f64], base: &DVector<f64>, step: f64) -> DMatrix<f64> {
        let n = self.xs.len();
        let m = params.len();
        let mut jac = DMatrix::zeros(n, m);
        let mut shifted = params.to_vec();

        for j in 0..m {
            let h = if params[j] != 0.0 {
                step * params[j].abs()
            } else {
                step
            };

            shifted[j] = params[j] + h;
            let (r, signed_h) = match self.residuals(&shifted) {
                Some(r) => (Some(r), h),
                None => {
                    shifted[j] = params[j] - h;
                    (self.residuals(&shifted), -h)
                }
            };
            shifted[j] = params[j];

            if let Some(r) = r {
                // residual = (y - f) / sigma, so df/sigma = -(r_shift - r_base)
                for i in 0..n {
                    jac[(i, j)] = -(r[i] - base[i]) / signed_h;
                }
            }
        }

        jac
    }
}

/// Column scales `sqrt(diag(A))` used to normalize the normal matrix
fn column_scales(a: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
    let mut scales = DVector::zeros(a.nrows());
    for j in 0..a.nrows() {
        let d = a[(j, j)];
        if d.is_nan() || d <= 0.0 || !d.is_finite() {
            return Err(FitError::SingularMatrix(j));
        }
        scales[j] = d.sqrt();
    }
    Ok(scales)
}

/// Fit `model` to `(xs, ys)` with absolute uncertainties `sigmas`.
///
/// # Arguments
/// * `model` - Model function `f(x, params)`; an `Err` marks parameters outside its domain
/// * `xs` - Independent variable values
/// * `ys` - Observed values
/// * `sigmas` - Absolute 1-sigma uncertainties of `ys`
/// * `initial` - Starting parameter vector
/// * `options` - Solver settings
///
/// # Returns
/// * `Ok(FitResult)` - Best-fit parameters, covariance and chi-square
/// * `Err(FitError)` - Invalid input, singular normal matrix or no convergence
pub fn levenberg_marquardt<F, E>(
    model: F,
    xs: &[f64],
    ys: &[f64],
    sigmas: &[f64],
    initial: &[f64],
    options: &FitOptions,
) -> Result<FitResult, FitError>
where
    F: Fn(f64, &[f64]) -> Result<f64, E>,
{
    if xs.len() != ys.len() || xs.len() != sigmas.len() {
        return Err(FitError::MismatchedLengths {
            x: xs.len(),
            y: ys.len(),
            sigma: sigmas.len(),
        });
    }
    if xs.len() <= initial.len() {
        return Err(FitError::InsufficientData {
            points: xs.len(),
            parameters: initial.len(),
        });
    }
    if let Some(index) = sigmas
        .iter()
        .position(|s| s.is_nan() || *s <= 0.0 || !s.is_finite())
    {
        return Err(FitError::InvalidSigma(index));
    }

    let problem = Problem {
        model,
        xs,
        ys,
        sigmas,
    };

    let m = initial.len();
    let mut params = initial.to_vec();
    let mut residuals = problem
        .residuals(&params)
        .ok_or(FitError::InvalidInitialParameters)?;
    let mut chi2 = residuals.norm_squared();
    let mut lambda = options.initial_lambda;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < options.max_iterations {
        iterations += 1;

        let jac = problem.jacobian(&params, &residuals, options.derivative_step);
        let a = jac.transpose() * &jac;
        let g = jac.transpose() * &residuals;
        let scales = column_scales(&a)?;

        // Normalized system (A_hat + lambda I) delta_hat = g_hat
        let mut a_hat = a.clone();
        for i in 0..m {
            for j in 0..m {
                a_hat[(i, j)] /= scales[i] * scales[j];
            }
        }
        let g_hat = g.component_div(&scales);

        let mut accepted = false;
        while lambda < 1e16 {
            let mut damped = a_hat.clone();
            for i in 0..m {
                damped[(i, i)] += lambda;
            }

            let Some(delta_hat) = damped.cholesky().map(|c| c.solve(&g_hat)) else {
                lambda *= 10.0;
                continue;
            };
            let delta = delta_hat.component_div(&scales);
            let trial: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();

            match problem.residuals(&trial) {
                Some(trial_residuals) if trial_residuals.norm_squared() <= chi2 => {
                    let trial_chi2 = trial_residuals.norm_squared();
                    let decrease = chi2 - trial_chi2;
                    params = trial;
                    residuals = trial_residuals;
                    lambda = (lambda / 10.0).max(1e-12);
                    accepted = true;

                    let max_relative_step = delta
                        .iter()
                        .zip(&params)
                        .map(|(d, p)| d.abs() / (p.abs() + f64::MIN_POSITIVE))
                        .fold(0.0, f64::max);
                    if decrease <= options.tolerance * chi2.max(f64::MIN_POSITIVE)
                        || max_relative_step <= options.tolerance
                    {
                        converged = true;
                    }
                    chi2 = trial_chi2;
                    break;
                }
                _ => lambda *= 10.0,
            }
        }

        if !accepted {
            // No downhill step exists at any damping: at the minimum to machine precision
            converged = true;
        }
        if converged {
            break;
        }
    }

    if !converged {
        return Err(FitError::NoConvergence(iterations));
    }

    let jac = problem.jacobian(&params, &residuals, options.derivative_step);
    let a = jac.transpose() * &jac;
    let scales = column_scales(&a)?;
    let mut a_hat = a.clone();
    for i in 0..m {
        for j in 0..m {
            a_hat[(i, j)] /= scales[i] * scales[j];
        }
    }
    let inv_hat = a_hat
        .try_inverse()
        .ok_or(FitError::SingularMatrix(0))?;
    let mut covariance = inv_hat;
    for i in 0..m {
        for j in 0..m {
            covariance[(i, j)] /= scales[i] * scales[j];
        }
    }
    let uncertainties = (0..m).map(|i| covariance[(i, i)].abs().sqrt()).collect();

    let ndof = xs.len() - m;
    debug!(
        "Levenberg-Marquardt converged after {} iterations: chi2 = {:.4}, ndof = {}",
        iterations, chi2, ndof
    );

    Ok(FitResult {
        parameters: params,
        covariance,
        uncertainties,
        chi2,
        ndof,
        reduced_chi2: chi2 / ndof as f64,
        iterations,
    })
}
