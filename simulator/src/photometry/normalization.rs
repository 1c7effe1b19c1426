//! Normalization of spectral densities over a band
//!
//! Turns an unnormalized density into a probability density over a band and
//! finds an upper bound (the envelope) of that density for rejection
//! sampling. The integral is taken with composite Simpson quadrature on a
//! 0.1 nm grid and the maximum is located with Brent's bounded method.
//!
//! The envelope must never underestimate the true maximum, otherwise
//! rejection sampling silently truncates the distribution near its peak.
//! It is therefore taken as the larger of the optimizer result and the grid
//! maximum, inflated by a small relative margin.

use log::debug;
use photon_math::{linspace, maximize_bounded, simpson, OptimizeError, QuadratureError};
use thiserror::Error;

use super::spectrum::{Band, SpectralDensity};
use crate::error::DomainError;
use crate::units::{LengthExt, Wavelength};

/// Target spacing of the integration grid in nanometers
pub const GRID_SPACING_NM: f64 = 0.1;

/// Relative inflation applied to the located maximum
pub const ENVELOPE_MARGIN: f64 = 1e-6;

const OPTIMIZER_XATOL_NM: f64 = 1e-9;
const OPTIMIZER_MAX_EVALUATIONS: usize = 500;

/// Errors that can occur while normalizing a density
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("Density integrates to {0} over the band; expected a positive finite value")]
    DegenerateIntegral(f64),
    #[error("Maximum search did not converge: {0}")]
    NonConvergent(#[source] OptimizeError),
    #[error("Integration failed: {0}")]
    Quadrature(#[from] QuadratureError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Normalization constant and rejection envelope of a density over a band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    k_norm: f64,
    envelope_max: f64,
    peak_wavelength_nm: f64,
    grid_points: usize,
}

impl Normalization {
    /// Reciprocal of the density's integral over the band
    pub fn k_norm(&self) -> f64 {
        self.k_norm
    }

    /// Upper bound of the normalized density over the band
    pub fn envelope_max(&self) -> f64 {
        self.envelope_max
    }

    /// Wavelength in nanometers where the normalized density is largest
    pub fn peak_wavelength_nm(&self) -> f64 {
        self.peak_wavelength_nm
    }

    /// Typed peak wavelength
    pub fn peak_wavelength(&self) -> Wavelength {
        Wavelength::from_nanometers(self.peak_wavelength_nm)
    }

    /// Number of points in the integration grid
    pub fn grid_points(&self) -> usize {
        self.grid_points
    }

    /// Normalized density at `wavelength_nm`
    pub fn normalized<D>(&self, density: &D, wavelength_nm: f64) -> Result<f64, DomainError>
    where
        D: SpectralDensity + ?Sized,
    {
        Ok(density.density(wavelength_nm)? * self.k_norm)
    }
}

/// Number of grid points for a band: one per 0.1 nm, at least three
pub fn grid_point_count(band: &Band) -> usize {
    ((band.width() / GRID_SPACING_NM).floor() as usize).max(3)
}

/// Normalize `density` over `band`.
///
/// # Arguments
/// * `density` - Unnormalized density; carries its own parameters (e.g. temperature)
/// * `band` - Wavelength interval to normalize over
///
/// # Returns
/// * `Ok(Normalization)` - `k_norm > 0` and `envelope_max > 0`
/// * `Err(NormalizationError)` - Degenerate integral, optimizer failure, or a
///   density that cannot be evaluated on the band
pub fn normalize<D>(density: &D, band: &Band) -> Result<Normalization, NormalizationError>
where
    D: SpectralDensity + ?Sized,
{
    let grid_points = grid_point_count(band);
    let grid = linspace(band.lower_nm, band.upper_nm, grid_points).to_vec();
    let values = grid
        .iter()
        .map(|&wavelength| density.density(wavelength))
        .collect::<Result<Vec<_>, _>>()?;

    let integral = simpson(&values, &grid)?;
    if !integral.is_finite() || integral <= 0.0 {
        return Err(NormalizationError::DegenerateIntegral(integral));
    }
    let k_norm = 1.0 / integral;
    if !k_norm.is_finite() {
        return Err(NormalizationError::DegenerateIntegral(integral));
    }

    let optimum = maximize_bounded(
        |wavelength| {
            density
                .density(wavelength)
                .map(|value| value * k_norm)
                .unwrap_or(f64::NAN)
        },
        band.lower_nm,
        band.upper_nm,
        OPTIMIZER_XATOL_NM,
        OPTIMIZER_MAX_EVALUATIONS,
    )
    .map_err(NormalizationError::NonConvergent)?;

    // Grid maximum catches edge-peaked or multi-modal densities
    let (grid_argmax, grid_max) = values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &value)| {
            if value > best.1 {
                (i, value)
            } else {
                best
            }
        });
    let grid_max = grid_max * k_norm;

    let (peak_wavelength_nm, located_max) = if optimum.value >= grid_max {
        (optimum.x, optimum.value)
    } else {
        (grid[grid_argmax], grid_max)
    };
    let envelope_max = located_max * (1.0 + ENVELOPE_MARGIN);
    if !envelope_max.is_finite() || envelope_max <= 0.0 {
        return Err(NormalizationError::DegenerateIntegral(integral));
    }

    debug!(
        "Normalized density over {:.1}..{:.1} nm: {} grid points, integral {:.6e}, k_norm {:.6e}, envelope {:.6e} at {:.3} nm ({} evaluations)",
        band.lower_nm,
        band.upper_nm,
        grid_points,
        integral,
        k_norm,
        envelope_max,
        peak_wavelength_nm,
        optimum.evaluations
    );

    Ok(Normalization {
        k_norm,
        envelope_max,
        peak_wavelength_nm,
        grid_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::atmosphere::{AttenuatedSpectrum, Atmosphere};
    use crate::photometry::blackbody::BlackbodySpectrum;
    use approx::assert_relative_eq;
    use photon_math::trapezoid;

    fn sun() -> BlackbodySpectrum {
        BlackbodySpectrum::from_kelvin(5750.0).unwrap()
    }

    #[test]
    fn test_grid_point_count() {
        assert_eq!(grid_point_count(&Band::visible()), 4100);
        let narrow = Band::from_nm_bounds(500.0, 500.2).unwrap();
        assert_eq!(grid_point_count(&narrow), 3);
    }

    #[test]
    fn test_normalized_density_integrates_to_one() {
        let band = Band::visible();
        let norm = normalize(&sun(), &band).unwrap();
        assert!(norm.k_norm() > 0.0);
        assert!(norm.envelope_max() > 0.0);

        let grid = linspace(band.lower_nm, band.upper_nm, norm.grid_points()).to_vec();
        let normalized: Vec<f64> = grid
            .iter()
            .map(|&wavelength| norm.normalized(&sun(), wavelength).unwrap())
            .collect();
        assert_relative_eq!(simpson(&normalized, &grid).unwrap(), 1.0, max_relative = 1e-9);
        assert_relative_eq!(trapezoid(&normalized, &grid).unwrap(), 1.0, max_relative = 1e-3);
    }

    #[test]
    fn test_envelope_bounds_density_on_grid() {
        let band = Band::visible();
        for &temperature in &[3000.0, 5750.0, 22000.0, 28000.0] {
            let spectrum = BlackbodySpectrum::from_kelvin(temperature).unwrap();
            let norm = normalize(&spectrum, &band).unwrap();
            let fine = linspace(band.lower_nm, band.upper_nm, 20_001);
            for &wavelength in fine.iter() {
                let value = norm.normalized(&spectrum, wavelength).unwrap();
                assert!(
                    value <= norm.envelope_max(),
                    "{temperature} K: density {value} exceeds envelope {} at {wavelength} nm",
                    norm.envelope_max()
                );
            }
        }
    }

    #[test]
    fn test_interior_peak_is_found() {
        let norm = normalize(&sun(), &Band::visible()).unwrap();
        let analytic = sun().peak_wavelength().as_nanometers();
        assert_relative_eq!(norm.peak_wavelength_nm(), analytic, epsilon = 1e-3);
        assert_relative_eq!(
            norm.envelope_max(),
            norm.normalized(&sun(), analytic).unwrap(),
            max_relative = 2e-6
        );
    }

    #[test]
    fn test_edge_peaked_densities() {
        let band = Band::visible();

        // Peak far in the ultraviolet: maximum at the blue edge
        let hot = BlackbodySpectrum::from_kelvin(28000.0).unwrap();
        let norm = normalize(&hot, &band).unwrap();
        assert!(norm.peak_wavelength_nm() - band.lower_nm < 1e-3);

        // Peak in the infrared: maximum at the red edge
        let cool = BlackbodySpectrum::from_kelvin(3000.0).unwrap();
        let norm = normalize(&cool, &band).unwrap();
        assert!(band.upper_nm - norm.peak_wavelength_nm() < 1e-3);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let band = Band::visible();
        let first = normalize(&sun(), &band).unwrap();
        let second = normalize(&sun(), &band).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_attenuated_density_normalizes() {
        let horizon = AttenuatedSpectrum::new(sun(), 90.0, Atmosphere::default()).unwrap();
        let norm = normalize(&horizon, &Band::visible()).unwrap();
        // Horizon light is strongly reddened
        assert!(norm.peak_wavelength_nm() > 700.0);
    }

    #[test]
    fn test_degenerate_density() {
        let zero = |_: f64| -> Result<f64, DomainError> { Ok(0.0) };
        assert_eq!(
            normalize(&zero, &Band::visible()),
            Err(NormalizationError::DegenerateIntegral(0.0))
        );

        let negative = |_: f64| -> Result<f64, DomainError> { Ok(-1.0) };
        assert!(matches!(
            normalize(&negative, &Band::visible()),
            Err(NormalizationError::DegenerateIntegral(_))
        ));
    }

    #[test]
    fn test_density_errors_propagate() {
        let broken = |wavelength: f64| -> Result<f64, DomainError> {
            Err(DomainError::InvalidWavelength(wavelength))
        };
        assert!(matches!(
            normalize(&broken, &Band::visible()),
            Err(NormalizationError::Domain(_))
        ));
    }
}
