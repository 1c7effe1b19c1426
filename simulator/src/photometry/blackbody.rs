//! Blackbody photon density
//!
//! The sampled distribution is the Planck photon-count density
//!
//! ```text
//! D(λ, T) = 2c / (λ⁴ · (exp(hc / (k_B·T·λ)) − 1))
//! ```
//!
//! with λ in meters. Its maximum sits where `x = hc/(k_B·T·λ)` solves
//! `x = 4·(1 − e^{−x})`, i.e. `x ≈ 3.9207`, which is redward of the Wien
//! peak of the energy spectrum (≈ 639 nm instead of ≈ 504 nm for 5750 K).

use ndarray::Array1;

use super::spectrum::{wavelength_to_meters, SpectralDensity, SI};
use crate::error::{check_temperature, DomainError};
use crate::units::{Length, LengthExt, Temperature, TemperatureExt, Wavelength};

/// Exponent `hc/(k_B·T·λ)` at the maximum of the photon density
pub const PEAK_EXPONENT: f64 = 3.920_690_394_872_886;

/// Unnormalized blackbody photon density at `wavelength_nm` for `temperature_k`.
///
/// Evaluated in log space as
/// `ln(2c) − x − 4·ln(λ) − ln(1 − e^{−x})` with `1 − e^{−x}` computed by
/// `expm1`, so that neither very short wavelengths (huge `x`) nor very long
/// ones (`x → 0`) overflow or divide by zero. Extremely short wavelengths
/// underflow to zero.
///
/// # Arguments
/// * `wavelength_nm` - Wavelength in nanometers, must be positive
/// * `temperature_k` - Temperature in Kelvin, must be positive
///
/// # Returns
/// * `Ok(f64)` - Finite, non-negative density
/// * `Err(DomainError)` - Non-positive or non-finite wavelength or temperature
pub fn blackbody_density(wavelength_nm: f64, temperature_k: f64) -> Result<f64, DomainError> {
    check_temperature(temperature_k)?;
    let lambda_m = wavelength_to_meters(wavelength_nm)?;

    let x = SI::PLANCK_CONSTANT * SI::SPEED_OF_LIGHT
        / (SI::BOLTZMANN_CONSTANT * temperature_k * lambda_m);
    let one_minus_exp = -(-x).exp_m1();

    let ln_density =
        (2.0 * SI::SPEED_OF_LIGHT).ln() - x - 4.0 * lambda_m.ln() - one_minus_exp.ln();
    Ok(ln_density.exp())
}

/// Vectorized [`blackbody_density`] over a slice of wavelengths
pub fn blackbody_density_many(
    wavelengths_nm: &[f64],
    temperature_k: f64,
) -> Result<Array1<f64>, DomainError> {
    wavelengths_nm
        .iter()
        .map(|&wavelength| blackbody_density(wavelength, temperature_k))
        .collect::<Result<Vec<_>, _>>()
        .map(Array1::from_vec)
}

/// Blackbody photon density at a fixed temperature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackbodySpectrum {
    temperature_k: f64,
}

impl BlackbodySpectrum {
    /// Create a blackbody density for a typed temperature
    pub fn new(temperature: Temperature) -> Result<Self, DomainError> {
        Self::from_kelvin(temperature.as_kelvin())
    }

    /// Create a blackbody density for a temperature in Kelvin
    pub fn from_kelvin(temperature_k: f64) -> Result<Self, DomainError> {
        check_temperature(temperature_k)?;
        Ok(Self { temperature_k })
    }

    /// For compile-time catalog temperatures known to be positive
    pub(crate) fn from_temperature_unchecked(temperature_k: f64) -> Self {
        debug_assert!(temperature_k.is_finite() && temperature_k > 0.0);
        Self { temperature_k }
    }

    /// Temperature of the emitter
    pub fn temperature(&self) -> Temperature {
        Temperature::from_kelvin(self.temperature_k)
    }

    /// Temperature of the emitter in Kelvin
    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }

    /// Wavelength at which the photon density peaks
    pub fn peak_wavelength(&self) -> Wavelength {
        let lambda_m = SI::PLANCK_CONSTANT * SI::SPEED_OF_LIGHT
            / (SI::BOLTZMANN_CONSTANT * self.temperature_k * PEAK_EXPONENT);
        Length::from_meters(lambda_m)
    }
}

impl SpectralDensity for BlackbodySpectrum {
    fn density(&self, wavelength_nm: f64) -> Result<f64, DomainError> {
        blackbody_density(wavelength_nm, self.temperature_k)
    }
}
