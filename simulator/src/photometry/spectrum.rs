//! Spectral density infrastructure for the photon simulations.
//!
//! Provides the wavelength band type, the physical constants used by the
//! density models, and the `SpectralDensity` trait that every sampled
//! distribution implements.
//!
//! # Physical Framework
//!
//! All formulas use SI units internally:
//! - **Wavelengths**: nanometers (nm) at every public boundary, converted to
//!   meters inside the formulas
//! - **Densities**: unnormalized photon-count densities; only their shape
//!   over a band matters once normalized
//! - **Path lengths**: meters

use serde::{Deserialize, Serialize};

use crate::error::{check_wavelength, DomainError};

/// Physical constants in SI units.
///
/// The rounded values match the reference atmosphere calculations the
/// simulations are compared against, so they are deliberately not the
/// CODATA values.
pub struct SI {}

impl SI {
    /// Speed of light
    /// Units: m/s
    pub const SPEED_OF_LIGHT: f64 = 3e8;

    /// Planck's constant
    /// Units: J⋅s
    pub const PLANCK_CONSTANT: f64 = 6.63e-34;

    /// Boltzmann's constant
    /// Units: J/K
    pub const BOLTZMANN_CONSTANT: f64 = 1.38e-23;

    /// Nanometers to meters
    pub const NM_TO_M: f64 = 1e-9;
}

/// Wavelength interval over which photons are sampled.
///
/// # Physical Constraints
/// - Both bounds finite and positive
/// - Lower bound strictly less than upper bound
///
/// Constructed through [`Band::from_nm_bounds`], which enforces these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Lower wavelength bound in nanometers
    pub lower_nm: f64,

    /// Upper wavelength bound in nanometers
    pub upper_nm: f64,
}

impl Band {
    /// Create a new Band from lower and upper bounds
    ///
    /// # Arguments
    ///
    /// * `lower_nm` - Lower wavelength bound in nanometers
    /// * `upper_nm` - Upper wavelength bound in nanometers
    ///
    /// # Returns
    ///
    /// The band, or `DomainError::InvalidBand` if the bounds are not
    /// finite, not positive, or not strictly increasing
    pub fn from_nm_bounds(lower_nm: f64, upper_nm: f64) -> Result<Self, DomainError> {
        let valid = lower_nm.is_finite()
            && upper_nm.is_finite()
            && lower_nm > 0.0
            && lower_nm < upper_nm;
        if !valid {
            return Err(DomainError::InvalidBand { lower_nm, upper_nm });
        }
        Ok(Self { lower_nm, upper_nm })
    }

    /// The visible band, 380 to 790 nm
    pub fn visible() -> Self {
        Self {
            lower_nm: 380.0,
            upper_nm: 790.0,
        }
    }

    /// Width of the band in nanometers
    pub fn width(&self) -> f64 {
        self.upper_nm - self.lower_nm
    }

    /// Center of the band in nanometers
    pub fn center(&self) -> f64 {
        (self.lower_nm + self.upper_nm) / 2.0
    }

    /// Whether `wavelength_nm` lies in the closed band
    pub fn contains(&self, wavelength_nm: f64) -> bool {
        wavelength_nm >= self.lower_nm && wavelength_nm <= self.upper_nm
    }
}

impl Default for Band {
    fn default() -> Self {
        Self::visible()
    }
}

/// Convert a wavelength from nanometers to meters, rejecting non-physical values
pub fn wavelength_to_meters(wavelength_nm: f64) -> Result<f64, DomainError> {
    check_wavelength(wavelength_nm)?;
    Ok(wavelength_nm * SI::NM_TO_M)
}

/// Unnormalized photon density as a function of wavelength.
///
/// Implementations must be `Send + Sync` so that independent batches can
/// evaluate the same density from several threads.
pub trait SpectralDensity: Send + Sync {
    /// Evaluate the density at `wavelength_nm`.
    ///
    /// # Returns
    /// A finite, non-negative density, or `DomainError` for a non-physical
    /// wavelength
    fn density(&self, wavelength_nm: f64) -> Result<f64, DomainError>;
}

impl<F> SpectralDensity for F
where
    F: Fn(f64) -> Result<f64, DomainError> + Send + Sync,
{
    fn density(&self, wavelength_nm: f64) -> Result<f64, DomainError> {
        self(wavelength_nm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_band_validation() {
        assert!(Band::from_nm_bounds(380.0, 790.0).is_ok());
        assert!(Band::from_nm_bounds(790.0, 380.0).is_err());
        assert!(Band::from_nm_bounds(500.0, 500.0).is_err());
        assert!(Band::from_nm_bounds(0.0, 500.0).is_err());
        assert!(Band::from_nm_bounds(-10.0, 500.0).is_err());
        assert!(Band::from_nm_bounds(380.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_visible_band() {
        let band = Band::visible();
        assert_eq!(band, Band::from_nm_bounds(380.0, 790.0).unwrap());
        assert_relative_eq!(band.width(), 410.0);
        assert_relative_eq!(band.center(), 585.0);
        assert!(band.contains(380.0));
        assert!(band.contains(790.0));
        assert!(!band.contains(790.000001));
    }

    #[test]
    fn test_wavelength_to_meters() {
        assert_relative_eq!(wavelength_to_meters(500.0).unwrap(), 5e-7);
        assert_eq!(
            wavelength_to_meters(0.0),
            Err(DomainError::InvalidWavelength(0.0))
        );
    }

    #[test]
    fn test_closure_is_a_density() {
        let flat = |_: f64| -> Result<f64, DomainError> { Ok(2.0) };
        assert_eq!(flat.density(450.0), Ok(2.0));
    }
}
