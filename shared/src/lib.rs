//! Shared components and utilities for the rayleigh-sky crates.
//!
//! Holds the pieces that are not tied to any physical model: command-line
//! sweep arguments and deterministic data-parallel helpers.

pub mod algo;
pub mod range_arg;

pub use range_arg::{RangeArg, RangeError};
