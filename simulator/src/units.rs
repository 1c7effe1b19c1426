//! Type-safe physical units at the API edges
//!
//! Star temperatures and wavelengths are carried as `uom` quantities where
//! they cross module boundaries; the inner numeric loops work on plain `f64`
//! kelvin and nanometer values obtained through the extension traits below.

use uom::si::f64::{Length as UomLength, ThermodynamicTemperature};
use uom::si::length::{meter, nanometer};
use uom::si::thermodynamic_temperature::{degree_celsius, kelvin};

/// Type alias for temperature with convenient methods
pub type Temperature = ThermodynamicTemperature;

/// Type alias for length measurements
pub type Length = UomLength;

/// Wavelengths are lengths
pub type Wavelength = UomLength;

/// Extension trait for temperature conversions
pub trait TemperatureExt {
    /// Create temperature from Kelvin
    fn from_kelvin(kelvin: f64) -> Self;

    /// Get temperature in Kelvin
    fn as_kelvin(&self) -> f64;

    /// Create temperature from degrees Celsius
    fn from_celsius(celsius: f64) -> Self;

    /// Get temperature in degrees Celsius
    fn as_celsius(&self) -> f64;
}

/// Extension trait for the two length scales used here
pub trait LengthExt {
    /// Create length from nanometers (wavelengths)
    fn from_nanometers(nm: f64) -> Self;

    /// Get length in nanometers
    fn as_nanometers(&self) -> f64;

    /// Create length from meters (atmospheric path lengths)
    fn from_meters(m: f64) -> Self;

    /// Get length in meters
    fn as_meters(&self) -> f64;
}

impl TemperatureExt for Temperature {
    fn from_kelvin(value: f64) -> Self {
        Temperature::new::<kelvin>(value)
    }

    fn as_kelvin(&self) -> f64 {
        self.get::<kelvin>()
    }

    fn from_celsius(celsius: f64) -> Self {
        Temperature::new::<degree_celsius>(celsius)
    }

    fn as_celsius(&self) -> f64 {
        self.get::<degree_celsius>()
    }
}

impl LengthExt for Length {
    fn from_nanometers(nm: f64) -> Self {
        Length::new::<nanometer>(nm)
    }

    fn as_nanometers(&self) -> f64 {
        self.get::<nanometer>()
    }

    fn from_meters(m: f64) -> Self {
        Length::new::<meter>(m)
    }

    fn as_meters(&self) -> f64 {
        self.get::<meter>()
    }
}
