//! Emission sampling of blackbody photons
//!
//! Photon wavelengths are drawn from a normalized density by rejection
//! sampling: candidates are uniform over the band, heights uniform under the
//! envelope, and a candidate is accepted when its height lies under the
//! density curve. The Planck law has no closed-form inverse CDF, and the
//! envelope from [`normalize`] is a true upper bound, so the accepted
//! wavelengths follow the density exactly.

use log::{debug, info};
use ndarray::ArrayView1;
use rand::Rng;
use sky_shared::algo::generate_in_parallel;

use crate::error::{DomainError, SimulationError};
use crate::photometry::{normalize, Band, BlackbodySpectrum, Normalization, SpectralDensity};
use crate::units::{Temperature, TemperatureExt};

/// Ordered photon wavelengths (nm) drawn within a band
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonSample {
    wavelengths: Vec<f64>,
    band: Band,
}

impl PhotonSample {
    /// Wrap existing wavelengths, checking that each lies in `band`
    pub fn from_wavelengths(wavelengths: Vec<f64>, band: Band) -> Result<Self, DomainError> {
        if let Some(&outside) = wavelengths.iter().find(|&&w| !band.contains(w)) {
            return Err(DomainError::OutsideBand {
                wavelength_nm: outside,
                lower_nm: band.lower_nm,
                upper_nm: band.upper_nm,
            });
        }
        Ok(Self { wavelengths, band })
    }

    /// Callers guarantee every wavelength lies in `band`
    pub(crate) fn from_trusted(wavelengths: Vec<f64>, band: Band) -> Self {
        Self { wavelengths, band }
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// View as an ndarray for vectorized post-processing
    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.wavelengths[..])
    }

    pub fn band(&self) -> &Band {
        &self.band
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Sum of all wavelengths in nanometers
    pub fn wavelength_sum_nm(&self) -> f64 {
        self.wavelengths.iter().sum()
    }

    pub fn into_wavelengths(self) -> Vec<f64> {
        self.wavelengths
    }
}

/// Photons emitted by a blackbody together with the normalization used to draw them
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionSample {
    /// Accepted photons, in generation order
    pub photons: PhotonSample,
    /// Normalization of the emitting density over the band
    pub normalization: Normalization,
    /// Number of candidates drawn
    pub requested: usize,
}

impl EmissionSample {
    /// Fraction of candidates that were accepted
    pub fn acceptance_rate(&self) -> f64 {
        self.photons.len() as f64 / self.requested as f64
    }
}

/// Draw `n` rejection-sampling candidates from `density` over `band`.
///
/// All `n` wavelengths are drawn first, then all `n` heights, so a fixed
/// seed fixes the output regardless of how many candidates are accepted.
///
/// # Arguments
/// * `density` - Unnormalized density
/// * `normalization` - Result of [`normalize`] for the same density and band
/// * `band` - Wavelength interval for the candidates
/// * `n` - Number of candidates
/// * `rng` - Random source
///
/// # Returns
/// Accepted wavelengths in generation order (at most `n`)
pub fn rejection_sample<D, R>(
    density: &D,
    normalization: &Normalization,
    band: &Band,
    n: usize,
    rng: &mut R,
) -> Result<PhotonSample, DomainError>
where
    D: SpectralDensity + ?Sized,
    R: Rng + ?Sized,
{
    let candidates: Vec<f64> = (0..n)
        .map(|_| rng.gen_range(band.lower_nm..=band.upper_nm))
        .collect();
    let heights: Vec<f64> = (0..n)
        .map(|_| rng.gen_range(0.0..normalization.envelope_max()))
        .collect();

    let mut accepted = Vec::with_capacity(n);
    for (&wavelength, &height) in candidates.iter().zip(&heights) {
        if height <= normalization.normalized(density, wavelength)? {
            accepted.push(wavelength);
        }
    }

    Ok(PhotonSample::from_trusted(accepted, *band))
}

/// Sample photons emitted by a blackbody at `temperature` within `band`.
///
/// # Arguments
/// * `temperature` - Emitter temperature
/// * `band` - Wavelength interval
/// * `n` - Number of candidates; the sample holds at most `n` photons
/// * `rng` - Random source
///
/// # Returns
/// * `Ok(EmissionSample)` - Accepted photons and the normalization used
/// * `Err(SimulationError)` - Non-physical temperature, `n == 0`, or a
///   normalization failure
pub fn sample_emission<R>(
    temperature: Temperature,
    band: &Band,
    n: usize,
    rng: &mut R,
) -> Result<EmissionSample, SimulationError>
where
    R: Rng + ?Sized,
{
    if n == 0 {
        return Err(DomainError::EmptyRequest.into());
    }
    let spectrum = BlackbodySpectrum::new(temperature)?;
    let normalization = normalize(&spectrum, band)?;
    let photons = rejection_sample(&spectrum, &normalization, band, n, rng)?;

    debug!(
        "Emission at {:.0} K: accepted {}/{} photons",
        temperature.as_kelvin(),
        photons.len(),
        n
    );

    Ok(EmissionSample {
        photons,
        normalization,
        requested: n,
    })
}

/// Draw independent emission batches in parallel.
///
/// The density is normalized once and shared; batch `i` uses an RNG seeded
/// with `seed + i`, so the result is reproducible for a given seed.
/// Batches are returned in index order.
pub fn sample_emission_batches(
    temperature: Temperature,
    band: &Band,
    photons_per_batch: usize,
    batches: usize,
    seed: u64,
) -> Result<Vec<EmissionSample>, SimulationError> {
    if photons_per_batch == 0 || batches == 0 {
        return Err(DomainError::EmptyRequest.into());
    }
    let spectrum = BlackbodySpectrum::new(temperature)?;
    let normalization = normalize(&spectrum, band)?;

    info!(
        "Sampling {} batches of {} photons at {:.0} K",
        batches,
        photons_per_batch,
        temperature.as_kelvin()
    );

    generate_in_parallel(batches, seed, |_, rng| {
        rejection_sample(&spectrum, &normalization, band, photons_per_batch, rng).map(|photons| {
            EmissionSample {
                photons,
                normalization,
                requested: photons_per_batch,
            }
        })
    })
    .into_iter()
    .collect::<Result<Vec<_>, _>>()
    .map_err(SimulationError::from)
}
