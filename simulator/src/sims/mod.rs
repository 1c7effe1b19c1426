//! Monte Carlo photon simulations
//!
//! Emission draws photons from a blackbody density, scattering thins them
//! along a line of sight, and validation compares the results with the
//! analytic densities.

pub mod emission;
pub mod scattering;
pub mod validation;

pub use emission::{
    rejection_sample, sample_emission, sample_emission_batches, EmissionSample, PhotonSample,
};
pub use scattering::{expected_survivors, sample_scattering};
pub use validation::{
    chi_square_against, reduced_chi_square, sqrt_bin_count, validate_emission,
    validate_scattering,
};
