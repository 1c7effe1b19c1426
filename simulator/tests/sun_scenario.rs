//! End-to-end checks of the Sun at 5750 K in the visible band

use approx::assert_relative_eq;
use photon_math::{linspace, simpson, Histogram};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayleigh_sim::photometry::{normalize, Atmosphere, Band, BlackbodySpectrum, SpectralDensity};
use rayleigh_sim::sims::{sample_emission, sample_scattering, sqrt_bin_count, validate_emission};
use rayleigh_sim::star::Star;
use rayleigh_sim::units::{Temperature, TemperatureExt};
use rayleigh_sim::EmissionSample;

const PHOTONS: usize = 50_000;
const SEED: u64 = 42;

fn emit_sun(seed: u64) -> EmissionSample {
    let mut rng = StdRng::seed_from_u64(seed);
    sample_emission(
        Temperature::from_kelvin(5750.0),
        &Band::visible(),
        PHOTONS,
        &mut rng,
    )
    .unwrap()
}

/// True when `sub` appears in `full` in order
fn is_subsequence(sub: &[f64], full: &[f64]) -> bool {
    let mut it = full.iter();
    sub.iter().all(|x| it.any(|y| y == x))
}

#[test]
fn test_emission_stays_in_band() {
    let _ = env_logger::builder().is_test(true).try_init();

    let emitted = emit_sun(SEED);
    assert!(emitted.photons.len() <= PHOTONS);
    assert!(emitted
        .photons
        .wavelengths()
        .iter()
        .all(|&wavelength| (380.0..=790.0).contains(&wavelength)));
    // About 90% of candidates fall under the 5750 K density in this band
    assert!((0.85..0.95).contains(&emitted.acceptance_rate()));
}

#[test]
fn test_emission_is_reproducible() {
    let _ = env_logger::builder().is_test(true).try_init();

    assert_eq!(emit_sun(SEED).photons, emit_sun(SEED).photons);
    assert_ne!(emit_sun(SEED).photons, emit_sun(SEED + 1).photons);
}

#[test]
fn test_emission_matches_density() {
    let _ = env_logger::builder().is_test(true).try_init();

    let emitted = emit_sun(SEED);
    let spectrum = BlackbodySpectrum::from_kelvin(5750.0).unwrap();
    let chi = validate_emission(
        &emitted.photons,
        &spectrum,
        emitted.normalization.k_norm(),
        100,
    )
    .unwrap();
    assert!(chi.reduced < 2.0, "reduced chi-square {}", chi.reduced);
}

#[test]
fn test_emission_mean_and_peak() {
    let _ = env_logger::builder().is_test(true).try_init();

    let emitted = emit_sun(SEED);
    let spectrum = BlackbodySpectrum::from_kelvin(5750.0).unwrap();
    let k_norm = emitted.normalization.k_norm();

    let grid = linspace(380.0, 790.0, 4101);
    let weighted: Vec<f64> = grid
        .iter()
        .map(|&wavelength| wavelength * spectrum.density(wavelength).unwrap() * k_norm)
        .collect();
    let analytic_mean = simpson(&weighted, grid.as_slice().unwrap()).unwrap();

    let sample = emitted.photons.wavelengths();
    let sample_mean = sample.iter().sum::<f64>() / sample.len() as f64;
    assert_relative_eq!(sample_mean, analytic_mean, epsilon = 3.0);

    // The photon density peaks near 639 nm, not at the 504 nm energy peak
    assert_relative_eq!(
        emitted.normalization.peak_wavelength_nm(),
        639.3,
        epsilon = 1.0
    );
    let coarse = Histogram::new(sample, 5).unwrap();
    let peak = coarse.peak_center();
    assert!((580.0..=680.0).contains(&peak), "histogram peak at {peak} nm");
}

#[test]
fn test_normalization_integrates_to_one() {
    let _ = env_logger::builder().is_test(true).try_init();

    let band = Band::visible();
    let spectrum = BlackbodySpectrum::from_kelvin(5750.0).unwrap();
    let norm = normalize(&spectrum, &band).unwrap();

    let grid = linspace(band.lower_nm, band.upper_nm, 2001);
    let values: Vec<f64> = grid
        .iter()
        .map(|&wavelength| norm.normalized(&spectrum, wavelength).unwrap())
        .collect();
    let integral = simpson(&values, grid.as_slice().unwrap()).unwrap();
    assert_relative_eq!(integral, 1.0, epsilon = 1e-6);

    for &value in &values {
        assert!(value <= norm.envelope_max());
    }
}

#[test]
fn test_horizon_dimmer_than_zenith() {
    let _ = env_logger::builder().is_test(true).try_init();

    let sun = Star::sun();
    let mut rng = StdRng::seed_from_u64(SEED);
    let comparison = sun
        .compare_distributions(PHOTONS, &Band::visible(), &Atmosphere::default(), &mut rng)
        .unwrap();

    let emitted = comparison.emitted.photons.wavelengths();
    assert!(comparison.zenith.len() > comparison.horizon.len());
    assert!(comparison.zenith.len() <= emitted.len());
    assert!(is_subsequence(comparison.zenith.wavelengths(), emitted));
    assert!(is_subsequence(comparison.horizon.wavelengths(), emitted));

    // Mean transmission of the Sun's photons: 0.905 at zenith, 0.118 at horizon
    let zenith_fraction = comparison.zenith.len() as f64 / emitted.len() as f64;
    let horizon_fraction = comparison.horizon.len() as f64 / emitted.len() as f64;
    assert_relative_eq!(zenith_fraction, 0.905, epsilon = 0.01);
    assert_relative_eq!(horizon_fraction, 0.118, epsilon = 0.01);
}

#[test]
fn test_horizon_light_is_redder() {
    let _ = env_logger::builder().is_test(true).try_init();

    let emitted = emit_sun(SEED);
    let atmosphere = Atmosphere::default();
    let mut rng = StdRng::seed_from_u64(SEED + 10);
    let zenith = sample_scattering(&emitted.photons, 0.0, &atmosphere, &mut rng).unwrap();
    let horizon = sample_scattering(&emitted.photons, 90.0, &atmosphere, &mut rng).unwrap();

    let mean = |wavelengths: &[f64]| wavelengths.iter().sum::<f64>() / wavelengths.len() as f64;
    assert!(mean(horizon.wavelengths()) > mean(zenith.wavelengths()) + 20.0);
}

#[test]
fn test_scattered_samples_validate() {
    let _ = env_logger::builder().is_test(true).try_init();

    let sun = Star::sun();
    let atmosphere = Atmosphere::default();
    let mut rng = StdRng::seed_from_u64(SEED);
    let emitted = sun.emit(PHOTONS, &Band::visible(), &mut rng).unwrap();

    for &angle in &[0.0, 60.0, 90.0] {
        let observed = sun
            .scatter(&emitted.photons, angle, &atmosphere, &mut rng)
            .unwrap();
        let chi = sun
            .validate_scattering(
                &emitted,
                &observed,
                angle,
                &atmosphere,
                sqrt_bin_count(observed.len()),
            )
            .unwrap();
        assert!(chi.reduced < 2.0, "{angle} deg: reduced chi-square {}", chi.reduced);
    }
}

#[test]
fn test_flux_falls_toward_horizon() {
    let _ = env_logger::builder().is_test(true).try_init();

    let sun = Star::sun();
    let angles = [0.0, 30.0, 60.0, 75.0, 90.0];
    let flux = sun
        .flux_vs_angle_parallel(20_000, &angles, &Band::visible(), &Atmosphere::default(), SEED)
        .unwrap();

    assert_eq!(flux.len(), angles.len());
    for (point, &angle) in flux.iter().zip(&angles) {
        assert_eq!(point.angle_deg, angle);
    }
    // Transmission drops 0.905, 0.892, 0.825, 0.707, 0.118: well beyond the noise
    for pair in flux.windows(2) {
        assert!(
            pair[0].photon_count > pair[1].photon_count,
            "{} deg: {}, {} deg: {}",
            pair[0].angle_deg,
            pair[0].photon_count,
            pair[1].angle_deg,
            pair[1].photon_count
        );
    }

    let again = sun
        .flux_vs_angle_parallel(20_000, &angles, &Band::visible(), &Atmosphere::default(), SEED)
        .unwrap();
    assert_eq!(flux, again);
}
