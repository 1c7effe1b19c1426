//! Photometry models: spectral densities, atmospheric transmission and normalization

pub mod atmosphere;
pub mod blackbody;
pub mod normalization;
pub mod spectrum;

pub use atmosphere::{
    observed_count_model, rayleigh_transmission, rayleigh_transmission_many, AttenuatedSpectrum,
    Atmosphere,
};
pub use blackbody::{blackbody_density, blackbody_density_many, BlackbodySpectrum};
pub use normalization::{normalize, Normalization, NormalizationError};
pub use spectrum::{Band, SpectralDensity, SI};
