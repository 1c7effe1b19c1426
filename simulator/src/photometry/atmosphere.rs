//! Rayleigh scattering through a spherical-shell atmosphere
//!
//! A photon of wavelength λ reaching an observer at angle θ from the zenith
//! survives with probability
//!
//! ```text
//! P(λ, θ) = exp(−β(λ) · S(θ))
//! β(λ)    = 8π³ (n² − 1)² / (3 N λ⁴)
//! S(θ)    = sqrt((R cos θ)² + 2 R H + H²) − R cos θ
//! ```
//!
//! where `n` is the refractive index of air, `N` the molecular number
//! density, `R` the Earth radius and `H` the equivalent thickness of a
//! homogeneous atmosphere. `S` is the length of the line of sight through
//! that shell: `H` at the zenith, growing to roughly `sqrt(2 R H)` at the
//! horizon.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::blackbody::BlackbodySpectrum;
use super::spectrum::{wavelength_to_meters, SpectralDensity};
use crate::error::{check_angle, DomainError};
use crate::units::{Length, LengthExt};

/// Homogeneous-shell atmosphere parameters (SI units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Atmosphere {
    /// Refractive index of air
    pub refractive_index: f64,
    /// Molecular number density in molecules/m³
    pub number_density: f64,
    /// Earth radius in meters
    pub earth_radius_m: f64,
    /// Thickness of the equivalent homogeneous atmosphere in meters
    pub zenith_thickness_m: f64,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            refractive_index: 1.00029,
            number_density: 2.504e25,
            earth_radius_m: 6378e3,
            zenith_thickness_m: 8000.0,
        }
    }
}

impl Atmosphere {
    /// Rayleigh extinction coefficient β(λ) in 1/m
    pub fn extinction_coefficient(&self, wavelength_nm: f64) -> Result<f64, DomainError> {
        let lambda_m = wavelength_to_meters(wavelength_nm)?;
        let n2_minus_1 = self.refractive_index * self.refractive_index - 1.0;
        Ok(8.0 * std::f64::consts::PI.powi(3) * n2_minus_1 * n2_minus_1
            / (3.0 * self.number_density * lambda_m.powi(4)))
    }

    /// Line-of-sight length through the atmosphere at `angle_deg` from the zenith
    pub fn path_length(&self, angle_deg: f64) -> Result<Length, DomainError> {
        check_angle(angle_deg)?;
        let r_cos = self.earth_radius_m * angle_deg.to_radians().cos();
        let h = self.zenith_thickness_m;
        let s = (r_cos * r_cos + 2.0 * self.earth_radius_m * h + h * h).sqrt() - r_cos;
        Ok(Length::from_meters(s))
    }

    /// Probability that a photon survives the path without being scattered
    ///
    /// # Arguments
    /// * `wavelength_nm` - Photon wavelength in nanometers
    /// * `angle_deg` - Observation angle from the zenith, in [0, 90]
    ///
    /// # Returns
    /// * `Ok(f64)` - Transmission in (0, 1] (may underflow to 0 for extreme inputs)
    /// * `Err(DomainError)` - Non-physical wavelength or angle out of range
    pub fn transmission(&self, wavelength_nm: f64, angle_deg: f64) -> Result<f64, DomainError> {
        let path_m = self.path_length(angle_deg)?.as_meters();
        let beta = self.extinction_coefficient(wavelength_nm)?;
        Ok((-beta * path_m).exp())
    }
}

/// Transmission through the default atmosphere
pub fn rayleigh_transmission(wavelength_nm: f64, angle_deg: f64) -> Result<f64, DomainError> {
    Atmosphere::default().transmission(wavelength_nm, angle_deg)
}

/// Vectorized [`rayleigh_transmission`] at a single angle
pub fn rayleigh_transmission_many(
    wavelengths_nm: &[f64],
    angle_deg: f64,
) -> Result<Array1<f64>, DomainError> {
    let atmosphere = Atmosphere::default();
    wavelengths_nm
        .iter()
        .map(|&wavelength| atmosphere.transmission(wavelength, angle_deg))
        .collect::<Result<Vec<_>, _>>()
        .map(Array1::from_vec)
}

/// Expected photon count model `k · D(λ, T) · P(λ, angle)`.
///
/// Parameters are ordered `[angle_deg, k, temperature_k]`, the layout used
/// by the least-squares temperature fit.
pub fn observed_count_model(wavelength_nm: f64, params: &[f64]) -> Result<f64, DomainError> {
    let [angle_deg, scale, temperature_k] = params else {
        return Err(DomainError::ParameterCount {
            expected: 3,
            actual: params.len(),
        });
    };
    let blackbody = BlackbodySpectrum::from_kelvin(*temperature_k)?;
    let spectrum = AttenuatedSpectrum::new(blackbody, *angle_deg, Atmosphere::default())?;
    Ok(scale * spectrum.density(wavelength_nm)?)
}

/// Blackbody density as seen through the atmosphere at a fixed angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttenuatedSpectrum {
    blackbody: BlackbodySpectrum,
    angle_deg: f64,
    atmosphere: Atmosphere,
}

impl AttenuatedSpectrum {
    /// Attenuate `blackbody` along the line of sight at `angle_deg`
    pub fn new(
        blackbody: BlackbodySpectrum,
        angle_deg: f64,
        atmosphere: Atmosphere,
    ) -> Result<Self, DomainError> {
        check_angle(angle_deg)?;
        Ok(Self {
            blackbody,
            angle_deg,
            atmosphere,
        })
    }

    pub fn blackbody(&self) -> &BlackbodySpectrum {
        &self.blackbody
    }

    pub fn angle_deg(&self) -> f64 {
        self.angle_deg
    }
}

impl SpectralDensity for AttenuatedSpectrum {
    fn density(&self, wavelength_nm: f64) -> Result<f64, DomainError> {
        Ok(self.blackbody.density(wavelength_nm)?
            * self.atmosphere.transmission(wavelength_nm, self.angle_deg)?)
    }
}
