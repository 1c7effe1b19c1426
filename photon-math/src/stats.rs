//! Statistical functions for validating sampled distributions

use thiserror::Error;

/// Errors that can occur when binning samples or computing fit statistics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Cannot build a histogram from an empty sample")]
    EmptySample,
    #[error("Bin count must be positive")]
    ZeroBins,
    #[error("Sample contains a non-finite value at index {0}")]
    NonFiniteSample(usize),
    #[error("Observed and expected counts differ in length ({observed} vs {expected})")]
    MismatchedLengths { observed: usize, expected: usize },
    #[error(
        "Degenerate fit: {included_bins} bins passed the count threshold but {free_parameters} free parameters leave no degrees of freedom"
    )]
    DegenerateFit {
        included_bins: usize,
        free_parameters: usize,
    },
}

/// Equal-width histogram over the observed range of a sample.
///
/// Bin edges run from the smallest to the largest sample value. Every bin is
/// half-open `[left, right)` except the last, which also includes the
/// maximum so that every sample is counted exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<f64>,
}

impl Histogram {
    /// Bin `samples` into `bin_count` equal-width bins over `[min, max]`.
    ///
    /// A sample whose values are all identical gets a unit-width range
    /// centered on that value.
    pub fn new(samples: &[f64], bin_count: usize) -> Result<Self, StatsError> {
        if bin_count == 0 {
            return Err(StatsError::ZeroBins);
        }
        if samples.is_empty() {
            return Err(StatsError::EmptySample);
        }
        if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
            return Err(StatsError::NonFiniteSample(index));
        }

        let mut lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bin_count as f64;
        let edges: Vec<f64> = (0..=bin_count)
            .map(|i| if i == bin_count { hi } else { lo + i as f64 * width })
            .collect();

        let mut counts = vec![0.0; bin_count];
        for &value in samples {
            let index = (((value - lo) / width).floor() as usize).min(bin_count - 1);
            counts[index] += 1.0;
        }

        Ok(Self { edges, counts })
    }

    /// Number of bins
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// Bin edges, `bin_count + 1` values
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Observed counts per bin
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Common width of every bin
    pub fn bin_width(&self) -> f64 {
        (self.edges[self.edges.len() - 1] - self.edges[0]) / self.bin_count() as f64
    }

    /// Bin centers
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|e| 0.5 * (e[0] + e[1])).collect()
    }

    /// Total number of binned samples
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Center of the most populated bin (first one on ties)
    pub fn peak_center(&self) -> f64 {
        let mut best = 0;
        for (i, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = i;
            }
        }
        0.5 * (self.edges[best] + self.edges[best + 1])
    }
}

/// Chi-square goodness-of-fit summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquare {
    /// Raw chi-square sum over the included bins
    pub chi2: f64,
    /// Degrees of freedom (included bins minus free parameters)
    pub ndof: usize,
    /// `chi2 / ndof`
    pub reduced: f64,
    /// Number of bins that passed the minimum-count threshold
    pub included_bins: usize,
}

/// Reduced chi-square between observed and expected bin counts.
///
/// Only bins with `observed >= min_count` contribute; the others are dropped
/// from both the sum and the degrees of freedom. Each included bin adds
/// `(expected - observed)^2 / observed`.
///
/// # Arguments
/// * `observed` - Observed counts per bin
/// * `expected` - Expected counts per bin
/// * `min_count` - Minimum observed count for a bin to be included
/// * `free_parameters` - Number of parameters subtracted from the degrees of freedom
///
/// # Returns
/// * `Ok(ChiSquare)` - Chi-square sum, degrees of freedom and reduced value
/// * `Err(StatsError::DegenerateFit)` - If `included_bins <= free_parameters`
pub fn reduced_chi_square(
    observed: &[f64],
    expected: &[f64],
    min_count: f64,
    free_parameters: usize,
) -> Result<ChiSquare, StatsError> {
    if observed.len() != expected.len() {
        return Err(StatsError::MismatchedLengths {
            observed: observed.len(),
            expected: expected.len(),
        });
    }

    // A zero-count bin can never be included, whatever the threshold
    let threshold = min_count.max(f64::MIN_POSITIVE);

    let mut chi2 = 0.0;
    let mut included_bins = 0;
    for (&obs, &exp) in observed.iter().zip(expected) {
        if obs >= threshold {
            chi2 += (exp - obs).powi(2) / obs;
            included_bins += 1;
        }
    }

    if included_bins <= free_parameters {
        return Err(StatsError::DegenerateFit {
            included_bins,
            free_parameters,
        });
    }

    let ndof = included_bins - free_parameters;
    Ok(ChiSquare {
        chi2,
        ndof,
        reduced: chi2 / ndof as f64,
        included_bins,
    })
}
