//! Type-safe range argument for parameter sweeps.
//!
//! Provides a clap-compatible type for command-line range arguments such as
//! observation-angle sweeps (`0:90:5`), with parsing, validation and display.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing or expanding a range
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("Range must be in format 'start:stop:step'")]
    Format,
    #[error("Invalid {field} value: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Range values must be finite")]
    NonFinite,
    #[error("Step cannot be zero")]
    ZeroStep,
    #[error("Step ({step}) does not move from {start} towards {stop}")]
    WrongDirection { start: f64, stop: f64, step: f64 },
}

/// Parse a sweep specification of the form `start:stop:step`.
///
/// `stop` is inclusive. A positive step requires `start <= stop` and a
/// negative step requires `start >= stop`; `start == stop` describes a single
/// value.
///
/// # Arguments
/// * `s` - Range specification string
///
/// # Returns
/// * `Ok((start, stop, step))` - Validated tuple
/// * `Err(RangeError)` - Malformed or inconsistent specification
pub fn parse_range(s: &str) -> Result<(f64, f64, f64), RangeError> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return Err(RangeError::Format);
    }

    let parse = |field: &'static str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| RangeError::InvalidNumber {
                field,
                value: value.to_string(),
            })
    };

    let start = parse("start", parts[0])?;
    let stop = parse("stop", parts[1])?;
    let step = parse("step", parts[2])?;

    validate(start, stop, step)?;
    Ok((start, stop, step))
}

fn validate(start: f64, stop: f64, step: f64) -> Result<(), RangeError> {
    if !start.is_finite() || !stop.is_finite() || !step.is_finite() {
        return Err(RangeError::NonFinite);
    }
    if step == 0.0 {
        return Err(RangeError::ZeroStep);
    }
    if (step > 0.0 && start > stop) || (step < 0.0 && start < stop) {
        return Err(RangeError::WrongDirection { start, stop, step });
    }
    Ok(())
}

/// Sweep range `(start, stop, step)` usable directly as a clap argument.
///
/// ```
/// use sky_shared::RangeArg;
///
/// let angles: RangeArg = "0:90:30".parse().unwrap();
/// assert_eq!(angles.to_vec().unwrap(), vec![0.0, 30.0, 60.0, 90.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeArg(pub f64, pub f64, pub f64);

impl FromStr for RangeArg {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, stop, step) = parse_range(s)?;
        Ok(RangeArg(start, stop, step))
    }
}

impl fmt::Display for RangeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.0, self.1, self.2)
    }
}

impl RangeArg {
    /// First value of the sweep
    pub fn start(&self) -> f64 {
        self.0
    }

    /// Last value of the sweep (inclusive when reached exactly)
    pub fn stop(&self) -> f64 {
        self.1
    }

    /// Increment between values
    pub fn step(&self) -> f64 {
        self.2
    }

    /// Number of values the sweep expands to
    pub fn value_count(&self) -> Result<usize, RangeError> {
        validate(self.0, self.1, self.2)?;
        let spans = (self.1 - self.0) / self.2;
        // Tolerate accumulated rounding so that 0:1:0.1 includes 1.0
        Ok((spans + 1e-9).floor() as usize + 1)
    }

    /// Expand the sweep into its values.
    ///
    /// Values are computed as `start + i * step` rather than by repeated
    /// addition, so long sweeps do not drift.
    pub fn to_vec(&self) -> Result<Vec<f64>, RangeError> {
        let count = self.value_count()?;
        Ok((0..count)
            .map(|i| self.0 + i as f64 * self.2)
            .collect())
    }
}
