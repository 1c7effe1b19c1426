//! Parallel processing utilities for independent Monte Carlo work items
//!
//! Each work item gets its own RNG seeded from a base seed plus the item
//! index, so results depend only on the seed and never on how rayon
//! schedules the work.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Seed for the work item at `index`
fn item_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add(index as u64)
}

/// Map `items` in parallel with a deterministic per-item RNG
///
/// Item `i` is processed with `StdRng::seed_from_u64(seed + i)` (wrapping).
/// The output preserves input order.
///
/// # Arguments
/// * `items` - Independent inputs to process
/// * `seed` - Base seed for random number generation
/// * `processor` - Closure applied to each item with its own RNG
///
/// # Returns
/// One output per input item, in input order
pub fn map_in_parallel_with_seeds<T, R, F>(items: &[T], seed: u64, processor: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T, &mut StdRng) -> R + Send + Sync,
{
    items
        .par_iter()
        .enumerate()
        .map(|(idx, item)| {
            let mut rng = StdRng::seed_from_u64(item_seed(seed, idx));
            processor(item, &mut rng)
        })
        .collect()
}

/// Run `count` independent seeded jobs in parallel
///
/// Job `i` receives its index and an RNG seeded with `seed + i` (wrapping).
/// Results are returned ordered by job index.
pub fn generate_in_parallel<R, F>(count: usize, seed: u64, job: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize, &mut StdRng) -> R + Send + Sync,
{
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let mut rng = StdRng::seed_from_u64(item_seed(seed, idx));
            job(idx, &mut rng)
        })
        .collect()
}
