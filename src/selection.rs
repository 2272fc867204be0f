//! Picking one label per cluster from its enrichment results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentResult;
use crate::error::Result;

/// Adjusted p-value below which a positively enriched pathway is accepted.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Label given to clusters without a supported pathway.
pub const UNIDENTIFIED: &str = "unidentified";

/// The decision for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterLabel {
    pub cluster: usize,
    pub label: String,
    /// NES of the winning pathway; `None` when unidentified.
    pub nes: Option<f64>,
    /// Adjusted p-value of the winning pathway; `None` when unidentified.
    pub padj: Option<f64>,
}

impl ClusterLabel {
    pub fn unidentified(cluster: usize) -> Self {
        ClusterLabel {
            cluster,
            label: UNIDENTIFIED.to_string(),
            nes: None,
            padj: None,
        }
    }

    pub fn is_identified(&self) -> bool {
        self.nes.is_some()
    }
}

fn is_supported(result: &EnrichmentResult) -> bool {
    result.padj < SIGNIFICANCE_THRESHOLD && result.nes > 0.0
}

/// Lowest padj first, then highest NES.
fn preference(a: &EnrichmentResult, b: &EnrichmentResult) -> Ordering {
    a.padj
        .partial_cmp(&b.padj)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.nes.partial_cmp(&a.nes).unwrap_or(Ordering::Equal))
}

/// Select the best supported pathway among `results`.
///
/// Only results with `padj < 0.05` and `nes > 0` are candidates. Among candidates the
/// lowest padj wins, and equal padj falls back to the highest NES. Exact ties on both
/// keep the earlier result. NaN values never pass the filter.
pub fn select_label(cluster: usize, results: &[EnrichmentResult]) -> ClusterLabel {
    let mut candidates: Vec<&EnrichmentResult> =
        results.iter().filter(|r| is_supported(r)).collect();
    candidates.sort_by(|a, b| preference(a, b));

    match candidates.first() {
        Some(winner) => ClusterLabel {
            cluster,
            label: winner.pathway.clone(),
            nes: Some(winner.nes),
            padj: Some(winner.padj),
        },
        None => ClusterLabel::unidentified(cluster),
    }
}

/// Label a cluster from the outcome of `enrich`, treating degenerate input as
/// "no eligible pathway".
pub fn label_from_enrichment(
    cluster: usize,
    outcome: Result<Vec<EnrichmentResult>>,
) -> Result<ClusterLabel> {
    match outcome {
        Ok(results) => Ok(select_label(cluster, &results)),
        Err(e) if e.is_degenerate() => Ok(ClusterLabel::unidentified(cluster)),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotationError;

    fn result(pathway: &str, nes: f64, padj: f64) -> EnrichmentResult {
        EnrichmentResult {
            pathway: pathway.to_string(),
            size: 20,
            es: nes / 2.0,
            nes,
            p_value: padj,
            padj,
            log2_err: 0.1,
            leading_edge: Vec::new(),
        }
    }

    #[test]
    fn test_lower_padj_wins_regardless_of_nes() {
        let results = vec![result("Weak", 1.2, 0.001), result("Strong", 3.5, 0.01)];
        let label = select_label(0, &results);
        assert_eq!(label.label, "Weak");
        assert_eq!(label.padj, Some(0.001));
    }

    #[test]
    fn test_equal_padj_prefers_higher_nes() {
        let results = vec![result("B", 1.5, 0.01), result("A", 2.5, 0.01)];
        assert_eq!(select_label(3, &results).label, "A");
    }

    #[test]
    fn test_exact_ties_keep_input_order() {
        let results = vec![result("First", 2.0, 0.01), result("Second", 2.0, 0.01)];
        assert_eq!(select_label(0, &results).label, "First");
    }

    #[test]
    fn test_negative_or_insignificant_results_are_ignored() {
        let results = vec![
            result("Depleted", -3.0, 0.0001),
            result("Borderline", 2.0, 0.05),
            result("Flat", 0.0, 0.001),
        ];
        let label = select_label(7, &results);
        assert_eq!(label, ClusterLabel::unidentified(7));
        assert!(!label.is_identified());
    }

    #[test]
    fn test_nan_never_wins() {
        let results = vec![result("Nan", f64::NAN, 0.001), result("NanP", 2.0, f64::NAN)];
        assert_eq!(select_label(0, &results).label, UNIDENTIFIED);
        assert_eq!(select_label(0, &[]).label, UNIDENTIFIED);
    }

    #[test]
    fn test_degenerate_outcome_becomes_unidentified() {
        let outcome = Err(AnnotationError::DegenerateInput("empty".to_string()));
        let label = label_from_enrichment(2, outcome).unwrap();
        assert_eq!(label, ClusterLabel::unidentified(2));

        let fatal = Err(AnnotationError::InvalidParameters("bad".to_string()));
        assert!(label_from_enrichment(2, fatal).is_err());
    }
}
