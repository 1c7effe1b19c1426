//! Algorithms shared across simulation crates
//!
//! Currently only the deterministic parallel helpers live here; numeric
//! primitives (quadrature, optimization, statistics) are in `photon-math`.

pub mod parallel;

pub use parallel::{generate_in_parallel, map_in_parallel_with_seeds};
