//! Sky color simulation for blackbody stars seen through the atmosphere
//!
//! For each selected star this tool:
//!
//! 1. Emits photons from the Planck photon density and checks the sample
//!    against the normalized density
//! 2. Thins the same photons at the zenith and at the horizon and checks
//!    each against density times transmission
//! 3. Sweeps the surviving photon count over a range of observation angles
//! 4. Fits temperature and angle back from a 45° observation
//!
//! Usage:
//! ```
//! cargo run --release --bin rayleigh_sky -- --star sun --seed 42
//! cargo run --release --bin rayleigh_sky -- --star all --angles 0:90:5
//! cargo run --release --bin rayleigh_sky -- --name Vega --temperature 9600
//! cargo run --release --bin rayleigh_sky -- --config run.json
//! ```
//!
//! Set `RUST_LOG=debug` for per-step details.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayleigh_sim::fitting::{fit_sample, FitGuess};
use rayleigh_sim::sims::sqrt_bin_count;
use rayleigh_sim::{SimulationConfig, SimulationError, Star};
use sky_shared::RangeArg;

/// Angle of the observation used for the temperature fit
const FIT_ANGLE_DEG: f64 = 45.0;

/// Starting temperature of the fit
const FIT_GUESS_TEMPERATURE_K: f64 = 8000.0;

/// Catalog stars available by name
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum StarChoice {
    /// The Sun, 5750 K
    Sun,
    /// Betelgeuse, 3000 K
    Betelgeuse,
    /// Bellatrix, 22000 K
    Bellatrix,
    /// Alpha Crucis, 28000 K
    AlphaCrucis,
    /// Every catalog star in turn
    All,
}

impl std::fmt::Display for StarChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StarChoice::Sun => write!(f, "sun"),
            StarChoice::Betelgeuse => write!(f, "betelgeuse"),
            StarChoice::Bellatrix => write!(f, "bellatrix"),
            StarChoice::AlphaCrucis => write!(f, "alpha-crucis"),
            StarChoice::All => write!(f, "all"),
        }
    }
}

impl StarChoice {
    fn stars(self) -> Vec<Star> {
        match self {
            StarChoice::Sun => vec![Star::sun()],
            StarChoice::Betelgeuse => vec![Star::betelgeuse()],
            StarChoice::Bellatrix => vec![Star::bellatrix()],
            StarChoice::AlphaCrucis => vec![Star::alpha_crucis()],
            StarChoice::All => Star::catalog(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rayleigh_sky")]
#[command(about = "Blackbody photons through a Rayleigh-scattering atmosphere")]
#[command(version)]
struct Args {
    /// Catalog star to simulate
    #[arg(long, default_value_t = StarChoice::Sun)]
    star: StarChoice,

    /// Name of a custom star (used with --temperature)
    #[arg(long, requires = "temperature")]
    name: Option<String>,

    /// Temperature of a custom star in Kelvin, overrides --star
    #[arg(long, value_name = "KELVIN")]
    temperature: Option<f64>,

    /// Candidate photons per emission sample
    #[arg(long)]
    photons: Option<usize>,

    /// Candidate photons for the flux-versus-angle sweep
    #[arg(long)]
    sweep_photons: Option<usize>,

    /// Sweep angles in degrees as start:stop:step
    #[arg(long, value_name = "START:STOP:STEP")]
    angles: Option<RangeArg>,

    /// Histogram bins for emission validation
    #[arg(long)]
    bins: Option<usize>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// JSON configuration file; command line values take precedence
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(photons) = self.photons {
            config.photons = photons;
        }
        if let Some(sweep_photons) = self.sweep_photons {
            config.sweep_photons = sweep_photons;
        }
        if let Some(angles) = self.angles {
            config.angles_deg = angles.to_vec()?;
        }
        if let Some(bins) = self.bins {
            config.bin_count = bins;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }

    fn resolve_stars(&self) -> Result<Vec<Star>, SimulationError> {
        match self.temperature {
            Some(temperature_k) => {
                let name = self.name.clone().unwrap_or_else(|| "Custom".to_string());
                Ok(vec![Star::from_kelvin(name, temperature_k)?])
            }
            None => Ok(self.star.stars()),
        }
    }
}

/// Run every step for one star and print a summary
fn simulate_star(
    star: &Star,
    config: &SimulationConfig,
    seed: u64,
) -> Result<(), SimulationError> {
    let band = &config.band_nm;
    let atmosphere = &config.atmosphere;
    let mut rng = StdRng::seed_from_u64(seed);

    println!();
    println!("{star}");
    println!("{}", "=".repeat(star.to_string().len()));

    let comparison = star.compare_distributions(config.photons, band, atmosphere, &mut rng)?;
    let emitted = &comparison.emitted;
    println!(
        "Emitted:  {:>7} of {} candidates (acceptance {:.3}, peak {:.1} nm)",
        emitted.photons.len(),
        emitted.requested,
        emitted.acceptance_rate(),
        emitted.normalization.peak_wavelength_nm()
    );

    match star.validate_emission(emitted, config.bin_count) {
        Ok(chi) => println!(
            "  emission chi-square: {:.2} / {} = {:.3}",
            chi.chi2, chi.ndof, chi.reduced
        ),
        Err(e) => warn!("Emission validation failed for {star}: {e}"),
    }

    for (label, angle, observed) in [
        ("Zenith", rayleigh_sim::star::ZENITH_DEG, &comparison.zenith),
        ("Horizon", rayleigh_sim::star::HORIZON_DEG, &comparison.horizon),
    ] {
        println!(
            "{label}:{:>width$} photons survive ({:.1}%)",
            observed.len(),
            100.0 * observed.len() as f64 / emitted.photons.len() as f64,
            width = 16 - label.len(),
        );
        let bins = sqrt_bin_count(observed.len());
        match star.validate_scattering(emitted, observed, angle, atmosphere, bins) {
            Ok(chi) => println!(
                "  scattering chi-square ({bins} bins): {:.2} / {} = {:.3}",
                chi.chi2, chi.ndof, chi.reduced
            ),
            Err(e) => warn!("{label} validation failed for {star}: {e}"),
        }
    }

    let flux = star.flux_vs_angle_parallel(
        config.sweep_photons,
        &config.angles_deg,
        band,
        atmosphere,
        seed.wrapping_add(1),
    )?;
    if let (Some(first), Some(last)) = (flux.first(), flux.last()) {
        println!(
            "Flux sweep: {} photons at {:.1}° down to {} at {:.1}° over {} angles",
            first.photon_count,
            first.angle_deg,
            last.photon_count,
            last.angle_deg,
            flux.len()
        );
    }

    let observed = star.scatter(&emitted.photons, FIT_ANGLE_DEG, atmosphere, &mut rng)?;
    let guess = FitGuess::new(FIT_ANGLE_DEG, FIT_GUESS_TEMPERATURE_K);
    match fit_sample(&observed, sqrt_bin_count(observed.len()), &guess) {
        Ok(fit) => println!(
            "Fit at {FIT_ANGLE_DEG}°: T = {:.0} ± {:.0} K, angle = {:.1} ± {:.1}°, reduced chi-square {:.3}",
            fit.temperature_k,
            fit.temperature_uncertainty,
            fit.angle_deg,
            fit.angle_uncertainty,
            fit.chi_square.reduced
        ),
        Err(e) => warn!("Temperature fit failed for {star}: {e}"),
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = args.resolve_config()?;
    let stars = args.resolve_stars()?;
    let seed = config
        .seed
        .unwrap_or_else(|| rand::thread_rng().gen::<u64>());
    info!("Using seed {seed}");

    println!("Rayleigh Sky Simulation");
    println!("=======================");
    println!(
        "Band: {:.0}-{:.0} nm, {} photons, {} sweep photons, {} angles, seed {}",
        config.band_nm.lower_nm,
        config.band_nm.upper_nm,
        config.photons,
        config.sweep_photons,
        config.angles_deg.len(),
        seed
    );

    for (index, star) in stars.iter().enumerate() {
        // Keeps each star's per-angle sweep seeds disjoint from the next star's
        let star_seed = seed.wrapping_add(index as u64 * 1_000_003);
        simulate_star(star, &config, star_seed)?;
    }

    Ok(())
}
