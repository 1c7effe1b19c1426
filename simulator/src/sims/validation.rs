//! Chi-square validation of sampled photon distributions
//!
//! A sample is histogrammed over its observed range and compared with the
//! counts predicted by its analytic density,
//! `expected_i = total × density(center_i) × bin_width`. Bins with fewer
//! than [`MIN_BIN_COUNT`] observed photons are dropped from both the sum and
//! the degrees of freedom.

use log::debug;
use photon_math::{reduced_chi_square as chi_square_of_counts, ChiSquare, Histogram};

use super::emission::PhotonSample;
use crate::error::{DomainError, SimulationError};
use crate::photometry::{Atmosphere, SpectralDensity};

/// Minimum observed count for a bin to enter the chi-square
pub const MIN_BIN_COUNT: f64 = 4.0;

/// Free parameters of a normalized-density comparison (the normalization)
pub const FREE_PARAMETERS: usize = 1;

/// Bin count used for thinned samples: `floor(sqrt(len))`, at least one
pub fn sqrt_bin_count(len: usize) -> usize {
    ((len as f64).sqrt().floor() as usize).max(1)
}

/// Compare `samples` against `total × expected_density × bin_width` per bin.
///
/// # Arguments
/// * `samples` - Sampled wavelengths in nanometers
/// * `expected_density` - Density the sample should follow, per nanometer
/// * `total` - Count the density is scaled by
/// * `bin_count` - Number of equal-width bins over the observed range
///
/// # Returns
/// * `Ok(ChiSquare)` - Statistic over the bins with at least four photons
/// * `Err(SimulationError)` - Empty sample, zero bins, a density failure, or
///   too few populated bins
pub fn chi_square_against<F>(
    samples: &[f64],
    expected_density: F,
    total: f64,
    bin_count: usize,
) -> Result<ChiSquare, SimulationError>
where
    F: Fn(f64) -> Result<f64, DomainError>,
{
    let histogram = Histogram::new(samples, bin_count)?;
    let width = histogram.bin_width();
    let expected = histogram
        .centers()
        .into_iter()
        .map(|center| expected_density(center).map(|density| total * density * width))
        .collect::<Result<Vec<_>, _>>()?;

    let result = chi_square_of_counts(
        histogram.counts(),
        &expected,
        MIN_BIN_COUNT,
        FREE_PARAMETERS,
    )?;
    debug!(
        "Chi-square over {} of {} bins: {:.3} / {} = {:.4}",
        result.included_bins, bin_count, result.chi2, result.ndof, result.reduced
    );
    Ok(result)
}

/// Reduced chi-square of `sample` against a normalized density.
///
/// Expected counts are `len(sample) × expected_density(center) × width`.
pub fn reduced_chi_square<F>(
    sample: &[f64],
    expected_density: F,
    bin_count: usize,
) -> Result<f64, SimulationError>
where
    F: Fn(f64) -> Result<f64, DomainError>,
{
    chi_square_against(sample, expected_density, sample.len() as f64, bin_count)
        .map(|result| result.reduced)
}

/// Validate an emission sample against its normalized source density
pub fn validate_emission<D>(
    sample: &PhotonSample,
    density: &D,
    k_norm: f64,
    bin_count: usize,
) -> Result<ChiSquare, SimulationError>
where
    D: SpectralDensity + ?Sized,
{
    chi_square_against(
        sample.wavelengths(),
        |wavelength| Ok(density.density(wavelength)? * k_norm),
        sample.len() as f64,
        bin_count,
    )
}

/// Validate a thinned sample against the emitted density times transmission.
///
/// Expected counts are scaled by the number of *emitted* photons, since the
/// transmission already accounts for the photons that were scattered away.
///
/// # Arguments
/// * `emitted_len` - Size of the emission sample that was thinned
/// * `observed` - Surviving photons
/// * `density` - Unnormalized emitting density
/// * `k_norm` - Normalization of `density` over the band
/// * `angle_deg` - Observation angle used for thinning
/// * `atmosphere` - Atmosphere used for thinning
/// * `bin_count` - Number of bins; [`sqrt_bin_count`] is the usual choice
pub fn validate_scattering<D>(
    emitted_len: usize,
    observed: &PhotonSample,
    density: &D,
    k_norm: f64,
    angle_deg: f64,
    atmosphere: &Atmosphere,
    bin_count: usize,
) -> Result<ChiSquare, SimulationError>
where
    D: SpectralDensity + ?Sized,
{
    chi_square_against(
        observed.wavelengths(),
        |wavelength| {
            Ok(density.density(wavelength)?
                * k_norm
                * atmosphere.transmission(wavelength, angle_deg)?)
        },
        emitted_len as f64,
        bin_count,
    )
}
