//! Adaptive permutation null for the running-sum statistic.
//!
//! Null scores for a gene-set size `k` come from random size-`k` subsets of the ranked
//! universe. Draw `i` is generated by its own RNG seeded with `seed + i`, so the null
//! sequence is fixed by the seed alone, no matter how draws are spread over threads.
//! Draws are taken in batches; a pathway stops collecting once enough null scores are
//! more extreme than its own, and every pathway stops at the permutation ceiling.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use rayon::prelude::*;

use crate::enrichment::statistic::running_sum;
use crate::enrichment::utils::permutation_log2_error;

/// Stopping rule for the sequential permutation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationSchedule {
    /// Draws per batch; also the minimum number of draws per pathway.
    pub batch_size: usize,
    /// Hard ceiling on draws per pathway.
    pub max_permutations: usize,
    /// Exceedances after which a pathway's p-value is considered precise enough.
    pub target_exceedances: usize,
}

/// Tallies of null scores relative to one observed enrichment score.
///
/// The p-value counts nulls `<=` the score on the lower side and `>` on the upper side.
/// The stopping rule only counts nulls strictly beyond the score in its own direction
/// (`gt_es` for a non-negative score, `lt_es` for a negative one), so a null set equal to
/// the observed one never counts as an exceedance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullTally {
    pub draws: usize,
    /// Null scores `<=` the observed score.
    pub le_es: usize,
    /// Null scores `<` the observed score.
    pub lt_es: usize,
    /// Null scores `>` the observed score.
    pub gt_es: usize,
    /// Null scores `<= 0`.
    pub le_zero: usize,
    /// Null scores `> 0`.
    pub gt_zero: usize,
    pub le_zero_sum: f64,
    pub gt_zero_sum: f64,
}

impl NullTally {
    fn record(&mut self, observed: f64, null_scores: &[f64]) {
        for &null in null_scores {
            if null <= observed {
                self.le_es += 1;
                if null < observed {
                    self.lt_es += 1;
                }
            } else {
                self.gt_es += 1;
            }
            if null <= 0.0 {
                self.le_zero += 1;
                self.le_zero_sum += null;
            } else {
                self.gt_zero += 1;
                self.gt_zero_sum += null;
            }
        }
        self.draws += null_scores.len();
    }

    /// Null scores strictly more extreme than `observed`, in its own direction.
    pub fn n_more_extreme(&self, observed: f64) -> usize {
        if observed >= 0.0 { self.gt_es } else { self.lt_es }
    }

    /// Two-directional permutation p-value conditioned on the sign of the null score.
    pub fn p_value(&self) -> f64 {
        let lower = (1 + self.le_es) as f64 / (1 + self.le_zero) as f64;
        let upper = (1 + self.gt_es) as f64 / (1 + self.gt_zero) as f64;
        lower.min(upper).min(1.0)
    }

    /// `observed` scaled by the mean magnitude of the same-signed null scores.
    /// Zero when there is no same-signed null mass to normalize against.
    pub fn normalized(&self, observed: f64) -> f64 {
        let scale = if observed > 0.0 && self.gt_zero > 0 {
            self.gt_zero_sum / self.gt_zero as f64
        } else if observed < 0.0 && self.le_zero > 0 {
            (self.le_zero_sum / self.le_zero as f64).abs()
        } else {
            0.0
        };

        let nes = if scale > 0.0 { observed / scale } else { 0.0 };
        if nes.is_finite() { nes } else { 0.0 }
    }

    pub fn log2_error(&self, observed: f64) -> f64 {
        permutation_log2_error(self.n_more_extreme(observed), self.draws)
    }
}

/// Null score of one random gene set of `size` genes, generated from draw `draw`.
fn null_score(weights: &[f64], size: usize, seed: u64, draw: usize) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(draw as u64));
    let mut hits = index::sample(&mut rng, weights.len(), size).into_vec();
    hits.sort_unstable();
    running_sum(weights, &hits).es
}

/// Run the sequential permutation test for every observed score of one gene-set size.
///
/// # Arguments
///
/// * `weights` - Hit weights of the ranked universe, as returned by
///   [`hit_weights`](crate::enrichment::statistic::hit_weights)
/// * `size` - Gene-set size; at least 1 and smaller than `weights.len()`
/// * `observed` - Enrichment scores of the pathways sharing this size
/// * `schedule` - Batch size, permutation ceiling and exceedance target
/// * `seed` - Base seed; draw `i` uses `seed + i`
///
/// # Returns
///
/// One [`NullTally`] per entry of `observed`, in the same order. A tally only depends on
/// its own score, `size`, `weights`, `schedule` and `seed`.
///
/// # Example
///
/// ```rust
/// use single_annotation::enrichment::permutation::{null_tallies, PermutationSchedule};
/// use single_annotation::enrichment::statistic::{hit_weights, running_sum};
///
/// let weights = hit_weights(&[3.0, 2.0, 1.0, -1.0, -2.0, -3.0], 1.0);
/// let es = running_sum(&weights, &[0, 1]).es;
/// let schedule = PermutationSchedule {
///     batch_size: 100,
///     max_permutations: 1000,
///     target_exceedances: 10,
/// };
///
/// let tallies = null_tallies(&weights, 2, &[es], &schedule, 1234);
/// assert_eq!(tallies[0].gt_es, 0);
/// assert!(tallies[0].p_value() < 0.05);
/// ```
pub fn null_tallies(
    weights: &[f64],
    size: usize,
    observed: &[f64],
    schedule: &PermutationSchedule,
    seed: u64,
) -> Vec<NullTally> {
    let mut tallies = vec![NullTally::default(); observed.len()];
    let mut resolved = vec![false; observed.len()];
    let mut drawn = 0;

    while drawn < schedule.max_permutations {
        let batch = schedule.batch_size.min(schedule.max_permutations - drawn);
        let null_scores: Vec<f64> = (drawn..drawn + batch)
            .into_par_iter()
            .map(|draw| null_score(weights, size, seed, draw))
            .collect();
        drawn += batch;

        let mut pending = 0;
        for ((tally, done), &es) in tallies.iter_mut().zip(resolved.iter_mut()).zip(observed) {
            if *done {
                continue;
            }
            tally.record(es, &null_scores);
            *done = tally.n_more_extreme(es) >= schedule.target_exceedances;
            if !*done {
                pending += 1;
            }
        }

        if pending == 0 {
            break;
        }
        debug!(
            "size {}: {} of {} pathways unresolved after {} draws",
            size,
            pending,
            observed.len(),
            drawn
        );
    }

    tallies
}
