//! Error types shared across the simulation modules

use photon_math::{FitError, StatsError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::photometry::normalization::NormalizationError;

/// Invalid physical input, rejected before any computation happens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Temperature must be positive and finite, got {0} K")]
    InvalidTemperature(f64),
    #[error("Wavelength must be positive and finite, got {0} nm")]
    InvalidWavelength(f64),
    #[error("Observation angle must lie in [0, 90] degrees, got {0}")]
    InvalidAngle(f64),
    #[error("Invalid band {lower_nm}..{upper_nm} nm: bounds must be finite with 0 < lower < upper")]
    InvalidBand { lower_nm: f64, upper_nm: f64 },
    #[error("Wavelength {wavelength_nm} nm lies outside the band {lower_nm}..{upper_nm} nm")]
    OutsideBand {
        wavelength_nm: f64,
        lower_nm: f64,
        upper_nm: f64,
    },
    #[error("At least one photon must be requested")]
    EmptyRequest,
    #[error("Model expects {expected} parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },
}

/// Any failure of a simulation workflow
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
    /// Chi-square could not be formed (e.g. too few populated bins)
    #[error("Validation failed: {0}")]
    Validation(#[from] StatsError),
    #[error("Fit failed: {0}")]
    Fit(#[from] FitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Check that a temperature in kelvin is physical
pub(crate) fn check_temperature(temperature_k: f64) -> Result<(), DomainError> {
    if temperature_k.is_finite() && temperature_k > 0.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidTemperature(temperature_k))
    }
}

/// Check that a wavelength in nanometers is physical
pub(crate) fn check_wavelength(wavelength_nm: f64) -> Result<(), DomainError> {
    if wavelength_nm.is_finite() && wavelength_nm > 0.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidWavelength(wavelength_nm))
    }
}

/// Check that an observation angle lies between zenith and horizon
pub(crate) fn check_angle(angle_deg: f64) -> Result<(), DomainError> {
    if (0.0..=90.0).contains(&angle_deg) {
        Ok(())
    } else {
        Err(DomainError::InvalidAngle(angle_deg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_checks() {
        assert!(check_temperature(5750.0).is_ok());
        assert_eq!(
            check_temperature(0.0),
            Err(DomainError::InvalidTemperature(0.0))
        );
        assert!(check_temperature(f64::INFINITY).is_err());

        assert!(check_wavelength(380.0).is_ok());
        assert!(check_wavelength(-1.0).is_err());
        assert!(check_wavelength(f64::NAN).is_err());

        assert!(check_angle(0.0).is_ok());
        assert!(check_angle(90.0).is_ok());
        assert_eq!(check_angle(90.5), Err(DomainError::InvalidAngle(90.5)));
        assert!(check_angle(f64::NAN).is_err());
    }

    #[test]
    fn test_simulation_error_wraps_domain() {
        let err: SimulationError = DomainError::EmptyRequest.into();
        assert!(matches!(
            err,
            SimulationError::Domain(DomainError::EmptyRequest)
        ));
        assert_eq!(err.to_string(), "At least one photon must be requested");
    }
}
