//! Atmospheric thinning of emitted photons
//!
//! Each photon of an emitted sample survives the line of sight with the
//! Rayleigh transmission probability for its wavelength. Thinning only
//! filters: wavelengths are never redrawn, so the output is always a
//! subsequence of the input.

use log::debug;
use rand::Rng;

use super::emission::PhotonSample;
use crate::error::{check_angle, DomainError};
use crate::photometry::Atmosphere;

/// Thin `sample` by the transmission at `angle_deg`.
///
/// One uniform draw in `[0, 1)` is consumed per input photon, in order; a
/// photon is kept when the draw is below its transmission.
///
/// # Arguments
/// * `sample` - Photons reaching the top of the atmosphere
/// * `angle_deg` - Observation angle from the zenith, in [0, 90]
/// * `atmosphere` - Atmosphere parameters
/// * `rng` - Random source
///
/// # Returns
/// * `Ok(PhotonSample)` - Surviving photons in input order
/// * `Err(DomainError)` - Angle outside [0, 90]
pub fn sample_scattering<R>(
    sample: &PhotonSample,
    angle_deg: f64,
    atmosphere: &Atmosphere,
    rng: &mut R,
) -> Result<PhotonSample, DomainError>
where
    R: Rng + ?Sized,
{
    check_angle(angle_deg)?;

    let mut survivors = Vec::with_capacity(sample.len());
    for &wavelength in sample.wavelengths() {
        let u: f64 = rng.gen();
        if u < atmosphere.transmission(wavelength, angle_deg)? {
            survivors.push(wavelength);
        }
    }

    debug!(
        "Scattering at {:.1} deg: {}/{} photons survive",
        angle_deg,
        survivors.len(),
        sample.len()
    );

    Ok(PhotonSample::from_trusted(survivors, *sample.band()))
}

/// Expected number of photons of `sample` surviving at `angle_deg`
pub fn expected_survivors(
    sample: &PhotonSample,
    angle_deg: f64,
    atmosphere: &Atmosphere,
) -> Result<f64, DomainError> {
    check_angle(angle_deg)?;
    sample
        .wavelengths()
        .iter()
        .map(|&wavelength| atmosphere.transmission(wavelength, angle_deg))
        .sum()
}
