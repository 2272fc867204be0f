//! One-vs-rest ranking of genes per cluster from a cells x genes expression matrix.

use std::collections::BTreeMap;

use log::info;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use single_utilities::traits::FloatOpsTS;

use crate::error::{AnnotationError, Result};
use crate::ranking::RankedGeneList;
use crate::testing::effect::{DEFAULT_PSEUDO_COUNT, mean_contrast_from_sums};
use crate::testing::inference::nonparametric::mann_whitney;
use crate::testing::inference::parametric::fast_t_test_from_sums;
use crate::testing::utils::{
    GroupStatistics, accumulate_group_statistics, column_entries, extract_unique_groups,
};
use crate::testing::{Alternative, TTestType};

/// Statistic used to score each gene of a cluster against all other cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMethod {
    /// Signed t statistic.
    TTest(TTestType),
    /// Signed, tie-corrected z-score of the Mann-Whitney U statistic.
    MannWhitney,
    /// log2 fold change of the cluster mean over the mean of the remaining cells, or the
    /// difference of the means when either is negative (scaled data).
    LogFoldChange,
}

impl Default for RankMethod {
    fn default() -> Self {
        RankMethod::TTest(TTestType::Welch)
    }
}

/// Rank every gene for every cluster in `cell_clusters`.
///
/// `matrix` holds cells as rows and genes as columns, and `gene_names[j]` names column
/// `j`. Scores are positive for genes higher in the cluster than in the remaining cells.
/// NaN statistics become 0 and infinite ones are clamped to the largest finite magnitude
/// of that cluster, so every returned list is valid input for enrichment.
pub fn rank_genes_groups<T, S>(
    matrix: &CsrMatrix<T>,
    gene_names: &[S],
    cell_clusters: &[usize],
    method: RankMethod,
) -> Result<BTreeMap<usize, RankedGeneList>>
where
    T: FloatOpsTS,
    S: AsRef<str> + Sync,
{
    if gene_names.len() != matrix.ncols() {
        return Err(AnnotationError::InvalidParameters(format!(
            "{} gene names for a matrix with {} columns",
            gene_names.len(),
            matrix.ncols()
        )));
    }
    if cell_clusters.len() != matrix.nrows() {
        return Err(AnnotationError::InvalidParameters(format!(
            "{} cluster assignments for a matrix with {} rows",
            cell_clusters.len(),
            matrix.nrows()
        )));
    }

    let clusters = extract_unique_groups(cell_clusters);
    if clusters.len() < 2 {
        return Err(AnnotationError::InvalidParameters(
            "need at least two clusters to rank genes one-vs-rest".to_string(),
        ));
    }

    let group_of: BTreeMap<usize, usize> = clusters
        .iter()
        .enumerate()
        .map(|(idx, &c)| (c, idx))
        .collect();
    let row_groups: Vec<usize> = cell_clusters.iter().map(|c| group_of[c]).collect();
    let stats = accumulate_group_statistics(matrix, &row_groups, clusters.len())?;

    let columns = match method {
        RankMethod::MannWhitney => Some(column_entries(matrix)),
        _ => None,
    };

    let ranked = clusters
        .par_iter()
        .enumerate()
        .map(|(group, &cluster)| -> Result<(usize, RankedGeneList)> {
            let mut scores = match (&columns, method) {
                (Some(columns), _) => rank_sum_scores(columns, &row_groups, group),
                (None, RankMethod::TTest(test_type)) => t_scores(&stats, group, test_type),
                (None, _) => fold_change_scores(&stats, group)?,
            };
            sanitize_scores(&mut scores);
            let list = RankedGeneList::new(
                gene_names
                    .iter()
                    .map(|g| g.as_ref().to_string())
                    .zip(scores),
            )?;
            Ok((cluster, list))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    info!(
        "Ranked {} genes for {} clusters over {} cells ({:?})",
        matrix.ncols(),
        clusters.len(),
        matrix.nrows(),
        method
    );

    Ok(ranked)
}

fn t_scores(stats: &GroupStatistics, group: usize, test_type: TTestType) -> Vec<f64> {
    let n_in = stats.counts[group] as f64;
    let n_rest = (stats.total_count() - stats.counts[group]) as f64;
    (0..stats.sums[group].len())
        .map(|gene| {
            let (rest_sum, rest_sq) = stats.rest(group, gene);
            fast_t_test_from_sums(
                stats.sums[group][gene],
                stats.sum_squares[group][gene],
                n_in,
                rest_sum,
                rest_sq,
                n_rest,
                test_type,
            )
            .statistic
        })
        .collect()
}

fn fold_change_scores(stats: &GroupStatistics, group: usize) -> Result<Vec<f64>> {
    let n_in = stats.counts[group];
    let n_rest = stats.total_count() - n_in;
    (0..stats.sums[group].len())
        .map(|gene| {
            let (rest_sum, _) = stats.rest(group, gene);
            mean_contrast_from_sums(
                stats.sums[group][gene],
                n_in,
                rest_sum,
                n_rest,
                DEFAULT_PSEUDO_COUNT,
            )
            .map_err(AnnotationError::from)
        })
        .collect()
}

fn rank_sum_scores(columns: &[Vec<(usize, f64)>], row_groups: &[usize], group: usize) -> Vec<f64> {
    let n_in = row_groups.iter().filter(|&&g| g == group).count();
    let n_rest = row_groups.len() - n_in;
    columns
        .iter()
        .map(|entries| {
            // implicit zeros first, stored entries override
            let mut inside = vec![0.0; n_in];
            let mut outside = vec![0.0; n_rest];
            let (mut i, mut o) = (0, 0);
            for &(row, value) in entries {
                if row_groups[row] == group {
                    inside[i] = value;
                    i += 1;
                } else {
                    outside[o] = value;
                    o += 1;
                }
            }
            mann_whitney(&inside, &outside, Alternative::TwoSided)
                .extra("z_score")
                .unwrap_or(0.0)
        })
        .collect()
}

fn sanitize_scores(scores: &mut [f64]) {
    let largest = scores
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0f64, |acc, s| acc.max(s.abs()));
    let bound = if largest > 0.0 { largest } else { 1.0 };
    for s in scores.iter_mut() {
        if s.is_nan() {
            *s = 0.0;
        } else if s.is_infinite() {
            *s = bound.copysign(*s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    /// 6 cells x 3 genes; "Up" is high in cluster 0, "Down" high in cluster 1.
    fn matrix() -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(6, 3);
        let rows = [
            [5.0, 0.0, 1.0],
            [6.0, 0.5, 2.0],
            [4.0, 0.0, 1.5],
            [0.5, 3.0, 1.0],
            [0.0, 4.0, 2.0],
            [1.0, 5.0, 1.5],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    coo.push(r, c, v);
                }
            }
        }
        CsrMatrix::from(&coo)
    }

    const GENES: [&str; 3] = ["Up", "Down", "Flat"];
    const CLUSTERS: [usize; 6] = [0, 0, 0, 1, 1, 1];

    #[test]
    fn test_methods_agree_on_direction() {
        for method in [
            RankMethod::TTest(TTestType::Welch),
            RankMethod::TTest(TTestType::Student),
            RankMethod::MannWhitney,
            RankMethod::LogFoldChange,
        ] {
            let ranks = rank_genes_groups(&matrix(), &GENES, &CLUSTERS, method).unwrap();
            assert_eq!(ranks.len(), 2);
            assert_eq!(ranks[&0].genes()[0], "Up", "{:?}", method);
            assert_eq!(ranks[&1].genes()[0], "Down", "{:?}", method);
            assert!(ranks[&0].score("Down").unwrap() < 0.0);
        }
    }

    #[test]
    fn test_zero_variance_gene_stays_finite() {
        let mut coo = CooMatrix::new(4, 2);
        coo.push(0, 0, 1.0);
        coo.push(1, 0, 1.0);
        coo.push(0, 1, 2.0);
        coo.push(2, 1, 1.0);
        let m = CsrMatrix::from(&coo);
        let ranks = rank_genes_groups(
            &m,
            &["Const", "Other"],
            &[3, 3, 8, 8],
            RankMethod::TTest(TTestType::Welch),
        )
        .unwrap();
        assert!(ranks[&3].scores().iter().all(|s| s.is_finite()));
        assert_eq!(ranks[&3].genes()[0], "Const");
        assert!(ranks.contains_key(&8));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let err = rank_genes_groups(&matrix(), &["Up"], &CLUSTERS, RankMethod::MannWhitney)
            .unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidParameters(_)));
        let err = rank_genes_groups(&matrix(), &GENES, &[0; 6], RankMethod::MannWhitney)
            .unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidParameters(_)));
    }

    #[test]
    fn test_fold_change_on_scaled_matrix() {
        // 4 cells x 2 genes, cluster 1 centered below zero
        let mut coo = CooMatrix::new(4, 2);
        coo.push(0, 0, 1.0);
        coo.push(1, 0, 1.0);
        coo.push(2, 0, -1.0);
        coo.push(3, 0, -1.0);
        coo.push(0, 1, 0.5);
        coo.push(2, 1, 0.5);
        let m = CsrMatrix::from(&coo);

        let ranks =
            rank_genes_groups(&m, &["Scaled", "Even"], &[0, 0, 1, 1], RankMethod::LogFoldChange)
                .unwrap();
        assert_eq!(ranks[&0].genes()[0], "Scaled");
        assert!((ranks[&0].score("Scaled").unwrap() - 2.0).abs() < 1e-12);
        assert!((ranks[&1].score("Scaled").unwrap() + 2.0).abs() < 1e-12);
        assert!(ranks[&0].score("Even").unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_sanitize_scores() {
        let mut scores = vec![f64::NAN, f64::INFINITY, -2.0, f64::NEG_INFINITY, 1.0];
        sanitize_scores(&mut scores);
        assert_eq!(scores, vec![0.0, 2.0, -2.0, -2.0, 1.0]);
    }
}
