//! Per-cluster ranked gene lists, the input of the enrichment test.
//!
//! A [`RankedGeneList`] can be assembled from any external differential-expression
//! result, or built directly from an expression matrix with [`rank_genes_groups`].

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{AnnotationError, Result};

mod builder;

pub use builder::{RankMethod, rank_genes_groups};

/// Gene identifiers with a finite ranking statistic, held in descending score order.
///
/// Ties are ordered by gene identifier so the ordering is total and reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedGeneList {
    genes: Vec<String>,
    scores: Vec<f64>,
}

impl RankedGeneList {
    /// Build from (gene, score) pairs, rejecting duplicate genes and non-finite scores.
    pub fn new<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries: Vec<(String, f64)> = Vec::new();
        for (gene, score) in pairs {
            let gene: String = gene.into();
            if !score.is_finite() {
                return Err(AnnotationError::InvalidRanks(format!(
                    "gene '{}' has non-finite score {}",
                    gene, score
                )));
            }
            if !seen.insert(gene.clone()) {
                return Err(AnnotationError::InvalidRanks(format!(
                    "gene '{}' appears more than once",
                    gene
                )));
            }
            entries.push((gene, score));
        }

        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let (genes, scores) = entries.into_iter().unzip();
        Ok(RankedGeneList { genes, scores })
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Genes, highest score first.
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    /// Scores aligned with [`genes`](Self::genes).
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn score(&self, gene: &str) -> Option<f64> {
        self.genes
            .iter()
            .position(|g| g == gene)
            .map(|idx| self.scores[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.genes
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }
}
