//! photon-math - Numeric primitives for photon Monte Carlo simulations
//!
//! This crate provides the physics-free numerical building blocks used by the
//! spectral sampling engine:
//!
//! - **Quadrature** - Evenly spaced grids, composite Simpson and trapezoid rules
//! - **Optimize** - Bounded scalar minimization (Brent's method)
//! - **Statistics** - Equal-width histograms and reduced chi-square
//! - **Fit** - Levenberg-Marquardt nonlinear least squares
//!
//! # Example
//!
//! ```
//! use photon_math::{linspace, simpson};
//!
//! // Integrate x^2 over [0, 3]
//! let xs = linspace(0.0, 3.0, 31);
//! let ys = xs.mapv(|x| x * x);
//! let integral = simpson(ys.as_slice().unwrap(), xs.as_slice().unwrap()).unwrap();
//! assert!((integral - 9.0).abs() < 1e-10);
//! ```

pub mod fit;
pub mod optimize;
pub mod quadrature;
pub mod stats;

// Re-export commonly used types
pub use fit::{levenberg_marquardt, FitError, FitOptions, FitResult};
pub use optimize::{maximize_bounded, minimize_bounded, BoundedMinimum, OptimizeError};
pub use quadrature::{linspace, simpson, simpson_uniform, trapezoid, QuadratureError};
pub use stats::{reduced_chi_square, ChiSquare, Histogram, StatsError};
