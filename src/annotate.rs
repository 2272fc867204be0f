//! Running enrichment and label selection over every cluster of a dataset.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::PathwayCatalog;
use crate::enrichment::{
    DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE, DEFAULT_SEED, EnrichmentParams, enrich,
};
use crate::error::{AnnotationError, Result};
use crate::ranking::RankedGeneList;
use crate::selection::{ClusterLabel, UNIDENTIFIED, label_from_enrichment};
use crate::testing::correction::CorrectionMethod;

/// How the permutation seed is chosen for each cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Every cluster uses the configured seed, so all clusters see the same null draws.
    #[default]
    Shared,
    /// Cluster `c` uses `seed + c`.
    PerCluster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub seed: u64,
    pub seed_strategy: SeedStrategy,
    pub min_permutations: usize,
    pub max_permutations: usize,
    pub target_exceedances: usize,
    pub correction: CorrectionMethod,
    /// Process clusters on the rayon pool.
    pub parallel: bool,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        let engine = EnrichmentParams::default();
        AnnotationConfig {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            seed: DEFAULT_SEED,
            seed_strategy: SeedStrategy::Shared,
            min_permutations: engine.min_permutations,
            max_permutations: engine.max_permutations,
            target_exceedances: engine.target_exceedances,
            correction: engine.correction,
            parallel: true,
        }
    }
}

impl AnnotationConfig {
    /// Read a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnnotationError::InvalidParameters(format!(
                "cannot read config {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            AnnotationError::InvalidParameters(format!(
                "malformed config {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Engine parameters for one cluster.
    pub fn params_for(&self, cluster: usize) -> EnrichmentParams {
        let seed = match self.seed_strategy {
            SeedStrategy::Shared => self.seed,
            SeedStrategy::PerCluster => self.seed.wrapping_add(cluster as u64),
        };
        EnrichmentParams {
            min_size: self.min_size,
            max_size: self.max_size,
            seed,
            min_permutations: self.min_permutations,
            max_permutations: self.max_permutations,
            target_exceedances: self.target_exceedances,
            correction: self.correction,
            ..EnrichmentParams::default()
        }
    }

    fn validate(&self) -> Result<()> {
        self.params_for(0).validate()
    }
}

fn annotate_one(
    cluster: usize,
    ranks: &RankedGeneList,
    catalog: &PathwayCatalog,
    config: &AnnotationConfig,
) -> Result<ClusterLabel> {
    let outcome = enrich(ranks, catalog, &config.params_for(cluster));
    if let Err(e) = &outcome {
        if e.is_degenerate() {
            warn!("Cluster {} left unidentified: {}", cluster, e);
        }
    }
    label_from_enrichment(cluster, outcome)
}

/// Label every cluster of `ranks_by_cluster` against `catalog`.
///
/// Clusters are independent: each result depends only on that cluster's ranks, the
/// catalog and the config. Degenerate clusters are labelled unidentified; any other
/// error aborts the run. The returned labels are sorted by cluster id.
pub fn annotate_clusters(
    ranks_by_cluster: &BTreeMap<usize, RankedGeneList>,
    catalog: &PathwayCatalog,
    config: &AnnotationConfig,
) -> Result<Vec<ClusterLabel>> {
    config.validate()?;

    let labels: Vec<ClusterLabel> = if config.parallel {
        ranks_by_cluster
            .par_iter()
            .map(|(&cluster, ranks)| annotate_one(cluster, ranks, catalog, config))
            .collect::<Result<Vec<_>>>()?
    } else {
        ranks_by_cluster
            .iter()
            .map(|(&cluster, ranks)| annotate_one(cluster, ranks, catalog, config))
            .collect::<Result<Vec<_>>>()?
    };

    let identified = labels.iter().filter(|l| l.is_identified()).count();
    info!(
        "Annotated {} clusters ({} identified, {} unidentified)",
        labels.len(),
        identified,
        labels.len() - identified
    );

    Ok(labels)
}

/// Per-cell labels from per-cell cluster assignments.
pub fn annotate_cells(cell_clusters: &[usize], labels: &[ClusterLabel]) -> Vec<String> {
    let by_cluster: HashMap<usize, &str> = labels
        .iter()
        .map(|l| (l.cluster, l.label.as_str()))
        .collect();
    cell_clusters
        .iter()
        .map(|c| by_cluster.get(c).copied().unwrap_or(UNIDENTIFIED).to_string())
        .collect()
}
