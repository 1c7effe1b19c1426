//! Blackbody photon simulation through a Rayleigh-scattering atmosphere
//!
//! This crate draws synthetic photon populations from the Planck photon
//! density of a star, thins them along a line of sight through Earth's
//! atmosphere, and checks the results against the analytic densities with
//! a reduced chi-square. Binned counts can be fitted back to a temperature.
//!
//! ```no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use rayleigh_sim::{Atmosphere, Band, Star};
//!
//! let sun = Star::sun();
//! let mut rng = StdRng::seed_from_u64(42);
//! let emitted = sun.emit(50_000, &Band::visible(), &mut rng).unwrap();
//! let horizon = sun
//!     .scatter(&emitted.photons, 90.0, &Atmosphere::default(), &mut rng)
//!     .unwrap();
//! assert!(horizon.len() < emitted.photons.len());
//! ```

pub mod config;
pub mod error;
pub mod fitting;
pub mod photometry;
pub mod sims;
pub mod star;
pub mod units;

// Re-exports for easier access
pub use config::{ConfigError, SimulationConfig};
pub use error::{DomainError, SimulationError};
pub use fitting::{fit_sample, fit_temperature, FitGuess, TemperatureFit};
pub use photometry::{
    blackbody_density, normalize, observed_count_model, rayleigh_transmission, Atmosphere, Band,
    BlackbodySpectrum, Normalization, SpectralDensity,
};
pub use sims::{
    reduced_chi_square, sample_emission, sample_scattering, EmissionSample, PhotonSample,
};
pub use star::{DistributionComparison, FluxPoint, Star};
