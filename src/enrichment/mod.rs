//! Preranked gene set enrichment of one cluster's ranked genes against a pathway catalog.
//!
//! For every pathway whose overlap with the ranked universe falls inside the size
//! bounds, [`enrich`] computes the weighted running-sum enrichment score, a
//! permutation p-value from an adaptive null (see [`permutation`]), the normalized
//! enrichment score and a multiple-testing adjusted p-value over that cluster's
//! pathways only.
//!
//! ## Quick Example
//!
//! ```rust
//! use single_annotation::catalog::PathwayCatalog;
//! use single_annotation::enrichment::{enrich, EnrichmentParams};
//! use single_annotation::ranking::RankedGeneList;
//!
//! let ranks = RankedGeneList::new(vec![
//!     ("A", 5.0), ("B", 4.0), ("C", 3.0), ("D", -2.0), ("E", -3.0),
//! ]).unwrap();
//! let catalog = PathwayCatalog::from_sets(vec![("Alpha", vec!["A", "B", "C"])]).unwrap();
//! let params = EnrichmentParams { min_size: 1, max_size: 10, ..Default::default() };
//!
//! let results = enrich(&ranks, &catalog, &params).unwrap();
//! assert!(results[0].nes > 0.0);
//! ```

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::PathwayCatalog;
use crate::error::{AnnotationError, Result};
use crate::ranking::RankedGeneList;
use crate::testing::correction::CorrectionMethod;

pub mod permutation;
pub mod statistic;
pub(crate) mod utils;

use permutation::{NullTally, PermutationSchedule, null_tallies};
use statistic::{RunningSum, hit_weights, running_sum};

pub const DEFAULT_MIN_SIZE: usize = 15;
pub const DEFAULT_MAX_SIZE: usize = 500;
pub const DEFAULT_SEED: u64 = 1234;

/// Parameters of one enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentParams {
    /// Smallest pathway overlap with the ranked genes that is tested.
    pub min_size: usize,
    /// Largest pathway overlap with the ranked genes that is tested.
    pub max_size: usize,
    pub seed: u64,
    /// Exponent applied to `|score|` when weighting hits.
    pub gsea_param: f64,
    /// Draws per permutation batch, and the minimum per pathway.
    pub min_permutations: usize,
    /// Ceiling on draws per pathway.
    pub max_permutations: usize,
    pub target_exceedances: usize,
    pub correction: CorrectionMethod,
}

impl Default for EnrichmentParams {
    fn default() -> Self {
        EnrichmentParams {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            seed: DEFAULT_SEED,
            gsea_param: 1.0,
            min_permutations: 1000,
            max_permutations: 10_000,
            target_exceedances: 10,
            correction: CorrectionMethod::BenjaminiHochberg,
        }
    }
}

impl EnrichmentParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_size < 1 {
            return Err(AnnotationError::InvalidParameters(
                "min_size must be at least 1".to_string(),
            ));
        }
        if self.max_size < self.min_size {
            return Err(AnnotationError::InvalidParameters(format!(
                "max_size ({}) must be >= min_size ({})",
                self.max_size, self.min_size
            )));
        }
        if self.min_permutations < 1 || self.max_permutations < self.min_permutations {
            return Err(AnnotationError::InvalidParameters(format!(
                "permutation bounds must satisfy 1 <= min_permutations ({}) <= max_permutations ({})",
                self.min_permutations, self.max_permutations
            )));
        }
        if self.target_exceedances < 1 {
            return Err(AnnotationError::InvalidParameters(
                "target_exceedances must be at least 1".to_string(),
            ));
        }
        if !self.gsea_param.is_finite() || self.gsea_param < 0.0 {
            return Err(AnnotationError::InvalidParameters(format!(
                "gsea_param must be a non-negative finite number, got {}",
                self.gsea_param
            )));
        }
        Ok(())
    }

    fn schedule(&self) -> PermutationSchedule {
        PermutationSchedule {
            batch_size: self.min_permutations,
            max_permutations: self.max_permutations,
            target_exceedances: self.target_exceedances,
        }
    }
}

/// Enrichment of one pathway in one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub pathway: String,
    /// Number of pathway genes present in the ranked list.
    pub size: usize,
    pub es: f64,
    /// Normalized enrichment score; positive when enriched at the top of the ranking.
    pub nes: f64,
    pub p_value: f64,
    /// P-value adjusted over the pathways tested for the same cluster.
    pub padj: f64,
    /// Estimated standard deviation of `log2(p_value)`.
    pub log2_err: f64,
    /// Pathway genes driving the score, in ranking order.
    pub leading_edge: Vec<String>,
}

/// A pathway that survived the size filter, as hit positions in the ranked list.
struct TestedPathway<'a> {
    name: &'a str,
    hits: Vec<usize>,
}

fn tested_pathways<'a>(
    ranks: &RankedGeneList,
    catalog: &'a PathwayCatalog,
    min_size: usize,
    max_size: usize,
) -> Vec<TestedPathway<'a>> {
    let positions: HashMap<&str, usize> = ranks
        .genes()
        .iter()
        .enumerate()
        .map(|(i, g)| (g.as_str(), i))
        .collect();

    catalog
        .iter()
        .filter_map(|pathway| {
            let mut hits: Vec<usize> = pathway
                .genes
                .iter()
                .filter_map(|g| positions.get(g.as_str()).copied())
                .collect();
            if hits.len() < min_size || hits.len() > max_size {
                return None;
            }
            hits.sort_unstable();
            Some(TestedPathway {
                name: pathway.name.as_str(),
                hits,
            })
        })
        .collect()
}

/// Test every size-eligible pathway of `catalog` against `ranks`.
///
/// # Arguments
///
/// * `ranks` - One cluster's ranked genes
/// * `catalog` - Pathways to test; genes absent from `ranks` are ignored
/// * `params` - Size bounds, seed, permutation schedule and correction method
///
/// # Returns
///
/// One [`EnrichmentResult`] per pathway whose overlap with `ranks` lies within
/// `[min_size, max_size]`, in pathway-name order, with `padj` adjusted over these results
/// only. Fails with [`AnnotationError::DegenerateInput`] when `ranks` is empty or no
/// pathway passes the size filter, and with [`AnnotationError::InvalidParameters`] when
/// `params` is inconsistent.
pub fn enrich(
    ranks: &RankedGeneList,
    catalog: &PathwayCatalog,
    params: &EnrichmentParams,
) -> Result<Vec<EnrichmentResult>> {
    params.validate()?;

    if ranks.is_empty() {
        return Err(AnnotationError::DegenerateInput(
            "ranked gene list is empty".to_string(),
        ));
    }

    let pathways = tested_pathways(ranks, catalog, params.min_size, params.max_size);
    if pathways.is_empty() {
        return Err(AnnotationError::DegenerateInput(format!(
            "no pathway has between {} and {} genes among the {} ranked genes",
            params.min_size,
            params.max_size,
            ranks.len()
        )));
    }

    let n = ranks.len();
    let weights = hit_weights(ranks.scores(), params.gsea_param);

    // A set covering the whole universe never leaves the diagonal.
    let observed: Vec<Option<RunningSum>> = pathways
        .iter()
        .map(|p| (p.hits.len() < n).then(|| running_sum(&weights, &p.hits)))
        .collect();

    let mut by_size: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, p) in pathways.iter().enumerate() {
        if observed[idx].is_some() {
            by_size.entry(p.hits.len()).or_default().push(idx);
        }
    }

    let schedule = params.schedule();
    let mut tallies: Vec<Option<NullTally>> = vec![None; pathways.len()];
    for (size, members) in &by_size {
        let scores: Vec<f64> = members
            .iter()
            .filter_map(|&idx| observed[idx].map(|s| s.es))
            .collect();
        let size_tallies = null_tallies(&weights, *size, &scores, &schedule, params.seed);
        for (&idx, tally) in members.iter().zip(size_tallies) {
            tallies[idx] = Some(tally);
        }
    }

    let mut results: Vec<EnrichmentResult> = pathways
        .iter()
        .zip(observed.iter().zip(tallies))
        .map(|(pathway, (sum, tally))| summarize(ranks, pathway, sum.as_ref(), tally.as_ref()))
        .collect();

    let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    let adjusted = params.correction.adjust(&p_values)?;
    for (result, padj) in results.iter_mut().zip(adjusted) {
        result.padj = padj;
    }

    debug!(
        "Tested {} of {} pathways against {} ranked genes ({} distinct sizes)",
        results.len(),
        catalog.len(),
        n,
        by_size.len()
    );

    Ok(results)
}

fn summarize(
    ranks: &RankedGeneList,
    pathway: &TestedPathway<'_>,
    sum: Option<&RunningSum>,
    tally: Option<&NullTally>,
) -> EnrichmentResult {
    let (es, nes, p_value, log2_err, leading_edge) = match (sum, tally) {
        (Some(sum), Some(tally)) => {
            let es = finite_or(sum.es, 0.0);
            let edge = sum
                .leading_edge(&pathway.hits)
                .iter()
                .map(|&pos| ranks.genes()[pos].clone())
                .collect();
            (
                es,
                tally.normalized(es),
                finite_or(tally.p_value(), 1.0),
                finite_or(tally.log2_error(es), 0.0),
                edge,
            )
        }
        _ => (0.0, 0.0, 1.0, 0.0, Vec::new()),
    };

    EnrichmentResult {
        pathway: pathway.name.to_string(),
        size: pathway.hits.len(),
        es,
        nes,
        p_value: p_value.clamp(0.0, 1.0),
        padj: 1.0,
        log2_err,
        leading_edge,
    }
}

#[inline]
fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
