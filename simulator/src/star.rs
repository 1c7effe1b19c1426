//! Stars as blackbody emitters observed through the atmosphere
//!
//! A [`Star`] is an immutable name and temperature. Its methods compose the
//! emission, scattering and validation steps; all randomness comes from the
//! RNG or seed passed in.

use std::fmt;

use log::{debug, info};
use photon_math::ChiSquare;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sky_shared::algo::map_in_parallel_with_seeds;

use crate::error::{check_angle, DomainError, SimulationError};
use crate::photometry::{Atmosphere, Band, BlackbodySpectrum};
use crate::sims::{
    sample_emission, sample_scattering, validate_emission, validate_scattering, EmissionSample,
    PhotonSample,
};
use crate::units::{Temperature, TemperatureExt};

/// Zenith observation angle
pub const ZENITH_DEG: f64 = 0.0;

/// Horizon observation angle
pub const HORIZON_DEG: f64 = 90.0;

/// A named blackbody emitter
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    name: String,
    spectrum: BlackbodySpectrum,
}

/// Emitted photons next to the same photons seen at the zenith and at the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionComparison {
    pub emitted: EmissionSample,
    pub zenith: PhotonSample,
    pub horizon: PhotonSample,
}

/// Photons surviving at one observation angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxPoint {
    pub angle_deg: f64,
    /// Number of surviving photons, the flux proxy
    pub photon_count: usize,
    /// Sum of the surviving wavelengths in nanometers
    pub wavelength_sum_nm: f64,
}

impl FluxPoint {
    fn from_sample(angle_deg: f64, sample: &PhotonSample) -> Self {
        Self {
            angle_deg,
            photon_count: sample.len(),
            wavelength_sum_nm: sample.wavelength_sum_nm(),
        }
    }
}

impl Star {
    /// Create a star with the given name and temperature
    pub fn new(name: impl Into<String>, temperature: Temperature) -> Result<Self, DomainError> {
        Ok(Self {
            name: name.into(),
            spectrum: BlackbodySpectrum::new(temperature)?,
        })
    }

    /// Create a star from a temperature in Kelvin
    pub fn from_kelvin(name: impl Into<String>, temperature_k: f64) -> Result<Self, DomainError> {
        Self::new(name, Temperature::from_kelvin(temperature_k))
    }

    fn catalog_entry(name: &str, temperature_k: f64) -> Self {
        Self {
            name: name.to_string(),
            spectrum: BlackbodySpectrum::from_temperature_unchecked(temperature_k),
        }
    }

    /// The Sun, 5750 K
    pub fn sun() -> Self {
        Self::catalog_entry("Sun", 5750.0)
    }

    /// Betelgeuse, 3000 K
    pub fn betelgeuse() -> Self {
        Self::catalog_entry("Betelgeuse", 3000.0)
    }

    /// Bellatrix, 22000 K
    pub fn bellatrix() -> Self {
        Self::catalog_entry("Bellatrix", 22000.0)
    }

    /// Alpha Crucis, 28000 K
    pub fn alpha_crucis() -> Self {
        Self::catalog_entry("Alpha Crucis", 28000.0)
    }

    /// All reference stars, coolest first
    pub fn catalog() -> Vec<Self> {
        vec![
            Self::betelgeuse(),
            Self::sun(),
            Self::bellatrix(),
            Self::alpha_crucis(),
        ]
    }

    /// Look up a reference star, ignoring case and `-`/`_`/space separators
    pub fn by_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Self::catalog().into_iter().find(|star| {
            star.name
                .chars()
                .filter(|c| *c != ' ')
                .flat_map(char::to_lowercase)
                .eq(key.chars())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn temperature(&self) -> Temperature {
        self.spectrum.temperature()
    }

    /// Blackbody density of this star
    pub fn spectrum(&self) -> &BlackbodySpectrum {
        &self.spectrum
    }

    /// Emit `n` candidate photons within `band`
    pub fn emit<R>(
        &self,
        n: usize,
        band: &Band,
        rng: &mut R,
    ) -> Result<EmissionSample, SimulationError>
    where
        R: Rng + ?Sized,
    {
        sample_emission(self.temperature(), band, n, rng)
    }

    /// Thin an emitted sample along the line of sight at `angle_deg`
    pub fn scatter<R>(
        &self,
        sample: &PhotonSample,
        angle_deg: f64,
        atmosphere: &Atmosphere,
        rng: &mut R,
    ) -> Result<PhotonSample, DomainError>
    where
        R: Rng + ?Sized,
    {
        sample_scattering(sample, angle_deg, atmosphere, rng)
    }

    /// Chi-square of an emission sample against this star's density
    pub fn validate_emission(
        &self,
        sample: &EmissionSample,
        bin_count: usize,
    ) -> Result<ChiSquare, SimulationError> {
        validate_emission(
            &sample.photons,
            &self.spectrum,
            sample.normalization.k_norm(),
            bin_count,
        )
    }

    /// Chi-square of a thinned sample against density times transmission
    pub fn validate_scattering(
        &self,
        emitted: &EmissionSample,
        observed: &PhotonSample,
        angle_deg: f64,
        atmosphere: &Atmosphere,
        bin_count: usize,
    ) -> Result<ChiSquare, SimulationError> {
        validate_scattering(
            emitted.photons.len(),
            observed,
            &self.spectrum,
            emitted.normalization.k_norm(),
            angle_deg,
            atmosphere,
            bin_count,
        )
    }

    /// Emit once and thin the same photons at the zenith and at the horizon
    pub fn compare_distributions<R>(
        &self,
        n: usize,
        band: &Band,
        atmosphere: &Atmosphere,
        rng: &mut R,
    ) -> Result<DistributionComparison, SimulationError>
    where
        R: Rng + ?Sized,
    {
        let emitted = self.emit(n, band, rng)?;
        let zenith = self.scatter(&emitted.photons, ZENITH_DEG, atmosphere, rng)?;
        let horizon = self.scatter(&emitted.photons, HORIZON_DEG, atmosphere, rng)?;

        info!(
            "{}: {} emitted, {} at zenith, {} at horizon",
            self,
            emitted.photons.len(),
            zenith.len(),
            horizon.len()
        );

        Ok(DistributionComparison {
            emitted,
            zenith,
            horizon,
        })
    }

    /// Photon count surviving at each angle.
    ///
    /// One emission sample of `n` candidates is drawn and re-thinned at
    /// every angle, so the points differ only by the atmosphere.
    pub fn flux_vs_angle<R>(
        &self,
        n: usize,
        angles_deg: &[f64],
        band: &Band,
        atmosphere: &Atmosphere,
        rng: &mut R,
    ) -> Result<Vec<FluxPoint>, SimulationError>
    where
        R: Rng + ?Sized,
    {
        for &angle in angles_deg {
            check_angle(angle)?;
        }
        let emitted = self.emit(n, band, rng)?;

        let mut points = Vec::with_capacity(angles_deg.len());
        for &angle in angles_deg {
            let observed = self.scatter(&emitted.photons, angle, atmosphere, rng)?;
            let point = FluxPoint::from_sample(angle, &observed);
            debug!("{}: {:.2} deg -> {} photons", self, angle, point.photon_count);
            points.push(point);
        }
        Ok(points)
    }

    /// Parallel [`Star::flux_vs_angle`].
    ///
    /// The emission sample is drawn with `seed`; the thinning at angle index
    /// `i` uses `seed + 1 + i`, so results do not depend on thread scheduling.
    pub fn flux_vs_angle_parallel(
        &self,
        n: usize,
        angles_deg: &[f64],
        band: &Band,
        atmosphere: &Atmosphere,
        seed: u64,
    ) -> Result<Vec<FluxPoint>, SimulationError> {
        for &angle in angles_deg {
            check_angle(angle)?;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let emitted = self.emit(n, band, &mut rng)?;

        let points = map_in_parallel_with_seeds(angles_deg, seed.wrapping_add(1), |&angle, rng| {
            self.scatter(&emitted.photons, angle, atmosphere, rng)
                .map(|observed| FluxPoint::from_sample(angle, &observed))
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        info!(
            "{}: flux sweep over {} angles from {} emitted photons",
            self,
            points.len(),
            emitted.photons.len()
        );
        Ok(points)
    }
}

impl fmt::Display for Star {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.0} K)", self.name, self.spectrum.temperature_k())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_catalog_temperatures() {
        let expected = [
            ("Betelgeuse", 3000.0),
            ("Sun", 5750.0),
            ("Bellatrix", 22000.0),
            ("Alpha Crucis", 28000.0),
        ];
        let catalog = Star::catalog();
        assert_eq!(catalog.len(), expected.len());
        for (star, (name, temperature)) in catalog.iter().zip(expected) {
            assert_eq!(star.name(), name);
            assert_relative_eq!(star.temperature().as_kelvin(), temperature, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Star::by_name("sun"), Some(Star::sun()));
        assert_eq!(Star::by_name("BETELGEUSE"), Some(Star::betelgeuse()));
        assert_eq!(Star::by_name("alpha-crucis"), Some(Star::alpha_crucis()));
        assert_eq!(Star::by_name("alpha_crucis"), Some(Star::alpha_crucis()));
        assert_eq!(Star::by_name("Alpha Crucis"), Some(Star::alpha_crucis()));
        assert_eq!(Star::by_name("vega"), None);
    }

    #[test]
    fn test_invalid_temperature() {
        assert!(matches!(
            Star::from_kelvin("Nothing", 0.0),
            Err(DomainError::InvalidTemperature(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Star::sun().to_string(), "Sun (5750 K)");
    }

    #[test]
    fn test_compare_distributions() {
        let star = Star::sun();
        let mut rng = StdRng::seed_from_u64(31);
        let comparison = star
            .compare_distributions(10_000, &Band::visible(), &Atmosphere::default(), &mut rng)
            .unwrap();

        let emitted = comparison.emitted.photons.len();
        assert!(comparison.zenith.len() <= emitted);
        assert!(comparison.horizon.len() < comparison.zenith.len());
    }

    #[test]
    fn test_horizon_is_redder() {
        let star = Star::sun();
        let mut rng = StdRng::seed_from_u64(32);
        let comparison = star
            .compare_distributions(20_000, &Band::visible(), &Atmosphere::default(), &mut rng)
            .unwrap();
        let mean = |s: &PhotonSample| s.wavelength_sum_nm() / s.len() as f64;
        assert!(mean(&comparison.horizon) > mean(&comparison.zenith) + 50.0);
    }

    #[test]
    fn test_flux_decreases_with_angle() {
        let star = Star::sun();
        let angles = [0.0, 60.0, 75.0, 90.0];
        let mut rng = StdRng::seed_from_u64(33);
        let points = star
            .flux_vs_angle(20_000, &angles, &Band::visible(), &Atmosphere::default(), &mut rng)
            .unwrap();

        assert_eq!(points.len(), angles.len());
        for (point, &angle) in points.iter().zip(&angles) {
            assert_eq!(point.angle_deg, angle);
        }
        for pair in points.windows(2) {
            assert!(pair[0].photon_count > pair[1].photon_count, "{points:?}");
            assert!(pair[0].wavelength_sum_nm > pair[1].wavelength_sum_nm);
        }
    }

    #[test]
    fn test_flux_rejects_bad_angle_before_sampling() {
        let star = Star::sun();
        let mut rng = StdRng::seed_from_u64(0);
        let result = star.flux_vs_angle(
            1000,
            &[0.0, 100.0],
            &Band::visible(),
            &Atmosphere::default(),
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(SimulationError::Domain(DomainError::InvalidAngle(_)))
        ));
    }

    #[test]
    fn test_parallel_flux_is_reproducible() {
        let star = Star::bellatrix();
        let angles: Vec<f64> = (0..10).map(|i| 10.0 * i as f64).collect();
        let band = Band::visible();
        let atmosphere = Atmosphere::default();

        let a = star
            .flux_vs_angle_parallel(5000, &angles, &band, &atmosphere, 77)
            .unwrap();
        let b = star
            .flux_vs_angle_parallel(5000, &angles, &band, &atmosphere, 77)
            .unwrap();
        assert_eq!(a, b);
        assert!(a[0].photon_count > a[9].photon_count);
    }

    #[test]
    fn test_emission_validates_for_every_catalog_star() {
        let band = Band::visible();
        for star in Star::catalog() {
            let mut rng = StdRng::seed_from_u64(34);
            let sample = star.emit(20_000, &band, &mut rng).unwrap();
            let result = star.validate_emission(&sample, 40).unwrap();
            assert!(result.reduced < 2.0, "{star}: {}", result.reduced);
        }
    }
}
