//! JSON run configuration
//!
//! Every field has a default, so a configuration file only needs to name
//! what it changes:
//!
//! ```json
//! { "photons": 100000, "seed": 7, "band_nm": { "lower_nm": 400.0, "upper_nm": 700.0 } }
//! ```

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{check_angle, DomainError};
use crate::photometry::{Atmosphere, Band};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] DomainError),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Number of angles in the default zenith-to-horizon sweep
pub const DEFAULT_ANGLE_COUNT: usize = 100;

fn default_angles() -> Vec<f64> {
    let last = (DEFAULT_ANGLE_COUNT - 1) as f64;
    (0..DEFAULT_ANGLE_COUNT)
        .map(|i| 90.0 * i as f64 / last)
        .collect()
}

/// Parameters of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wavelength band photons are drawn in
    pub band_nm: Band,
    /// Candidate photons per emission sample
    pub photons: usize,
    /// Candidate photons for the flux-versus-angle sweep
    pub sweep_photons: usize,
    /// Observation angles of the sweep, degrees from zenith
    pub angles_deg: Vec<f64>,
    /// Histogram bins for emission validation
    pub bin_count: usize,
    /// Fixed seed; a random one is drawn when absent
    pub seed: Option<u64>,
    pub atmosphere: Atmosphere,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            band_nm: Band::visible(),
            photons: 50_000,
            sweep_photons: 10_000,
            angles_deg: default_angles(),
            bin_count: 100,
            seed: None,
            atmosphere: Atmosphere::default(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check every value the simulation would otherwise reject mid-run
    pub fn validate(&self) -> Result<(), ConfigError> {
        Band::from_nm_bounds(self.band_nm.lower_nm, self.band_nm.upper_nm)?;
        if self.photons == 0 || self.sweep_photons == 0 {
            return Err(DomainError::EmptyRequest.into());
        }
        if self.bin_count < 2 {
            return Err(ConfigError::InvalidValue {
                field: "bin_count",
                reason: format!("need at least 2 bins, got {}", self.bin_count),
            });
        }
        if self.angles_deg.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "angles_deg",
                reason: "at least one angle is required".to_string(),
            });
        }
        for &angle in &self.angles_deg {
            check_angle(angle)?;
        }

        let atmosphere = &self.atmosphere;
        let positive = [
            ("atmosphere.number_density", atmosphere.number_density),
            ("atmosphere.earth_radius_m", atmosphere.earth_radius_m),
            ("atmosphere.zenith_thickness_m", atmosphere.zenith_thickness_m),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be positive and finite, got {value}"),
                });
            }
        }
        if !(atmosphere.refractive_index.is_finite() && atmosphere.refractive_index >= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "atmosphere.refractive_index",
                reason: format!("must be at least 1, got {}", atmosphere.refractive_index),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.angles_deg.len(), DEFAULT_ANGLE_COUNT);
        assert_eq!(config.angles_deg[0], 0.0);
        assert_relative_eq!(config.angles_deg[DEFAULT_ANGLE_COUNT - 1], 90.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "photons": 1234, "seed": 9 }"#).unwrap();
        assert_eq!(config.photons, 1234);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.band_nm, Band::visible());
        assert_eq!(config.atmosphere, Atmosphere::default());
        assert_eq!(config.bin_count, 100);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");
        let config = SimulationConfig {
            band_nm: Band::from_nm_bounds(400.0, 700.0).unwrap(),
            seed: Some(42),
            angles_deg: vec![0.0, 45.0, 90.0],
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SimulationConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = SimulationConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ photons: ").unwrap();
        assert!(matches!(
            SimulationConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let inverted = SimulationConfig {
            band_nm: Band {
                lower_nm: 790.0,
                upper_nm: 380.0,
            },
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::Invalid(DomainError::InvalidBand { .. }))
        ));

        let steep = SimulationConfig {
            angles_deg: vec![10.0, 95.0],
            ..Default::default()
        };
        assert!(matches!(
            steep.validate(),
            Err(ConfigError::Invalid(DomainError::InvalidAngle(_)))
        ));

        let no_photons = SimulationConfig {
            photons: 0,
            ..Default::default()
        };
        assert!(matches!(
            no_photons.validate(),
            Err(ConfigError::Invalid(DomainError::EmptyRequest))
        ));

        let one_bin = SimulationConfig {
            bin_count: 1,
            ..Default::default()
        };
        assert!(matches!(
            one_bin.validate(),
            Err(ConfigError::InvalidValue {
                field: "bin_count",
                ..
            })
        ));

        let mut thin_air = SimulationConfig::default();
        thin_air.atmosphere.number_density = 0.0;
        assert!(matches!(
            thin_air.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
