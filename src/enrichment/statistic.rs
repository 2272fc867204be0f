//! Weighted Kolmogorov-Smirnov running sum over a descending ranked list.

/// Extremes of the running sum for one gene set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningSum {
    /// Signed enrichment score: the extreme deviation with the largest magnitude, or 0
    /// when the positive and negative extremes cancel exactly.
    pub es: f64,
    /// Number of leading hits up to the positive peak, when the score is positive.
    pub peak: usize,
    /// Position of the first hit after the negative trough, when the score is negative.
    pub trough: usize,
}

impl RunningSum {
    /// Hit positions (indices into `hits`) that form the leading edge.
    pub fn leading_edge<'a>(&self, hits: &'a [usize]) -> &'a [usize] {
        if self.es > 0.0 {
            &hits[..self.peak]
        } else if self.es < 0.0 {
            &hits[self.trough..]
        } else {
            &[]
        }
    }
}

/// Running-sum statistic for the gene set occupying positions `hits` of a ranked list.
///
/// A hit raises the sum by its share of the total hit weight, a miss lowers it by
/// `1 / (n - k)`. Only hit positions are visited: the sum peaks right after a hit and
/// bottoms out right before one. If every hit weight is zero the hits share the
/// increment equally.
///
/// # Arguments
///
/// * `weights` - Per-gene hit weights in ranking order (already `|score|^p`)
/// * `hits` - Positions of the set's genes; non-empty, strictly increasing and shorter
///   than `weights`
///
/// # Returns
///
/// The signed enrichment score with the peak and trough positions that delimit the
/// leading edge.
///
/// # Example
///
/// ```rust
/// use single_annotation::enrichment::statistic::{hit_weights, running_sum};
///
/// let weights = hit_weights(&[5.0, 4.0, 3.0, -2.0, -3.0], 1.0);
/// let sum = running_sum(&weights, &[0, 1, 2]);
/// assert!((sum.es - 1.0).abs() < 1e-12);
/// assert_eq!(sum.leading_edge(&[0, 1, 2]), &[0, 1, 2]);
/// ```
pub fn running_sum(weights: &[f64], hits: &[usize]) -> RunningSum {
    let n = weights.len();
    let k = hits.len();
    debug_assert!(k > 0 && k < n);

    let total: f64 = hits.iter().map(|&h| weights[h]).sum();
    let uniform = total <= 0.0 || !total.is_finite();
    let miss_step = 1.0 / (n - k) as f64;

    let mut cumulative = 0.0;
    let mut max_top = f64::NEG_INFINITY;
    let mut min_bottom = f64::INFINITY;
    let mut peak = 0;
    let mut trough = 0;

    for (i, &pos) in hits.iter().enumerate() {
        let misses_before = (pos - i) as f64;
        let bottom = cumulative - misses_before * miss_step;
        cumulative += if uniform {
            1.0 / k as f64
        } else {
            weights[pos] / total
        };
        let top = cumulative - misses_before * miss_step;

        if top > max_top {
            max_top = top;
            peak = i + 1;
        }
        if bottom < min_bottom {
            min_bottom = bottom;
            trough = i;
        }
    }

    // The walk also ends at zero after the trailing misses.
    let max_top = max_top.max(0.0);
    let min_bottom = min_bottom.min(0.0);

    let es = if max_top == -min_bottom {
        0.0
    } else if max_top > -min_bottom {
        max_top
    } else {
        min_bottom
    };

    RunningSum { es, peak, trough }
}

/// Hit weights `|score|^gsea_param`; `gsea_param = 0` gives the unweighted statistic.
pub fn hit_weights(scores: &[f64], gsea_param: f64) -> Vec<f64> {
    scores
        .iter()
        .map(|s| {
            if gsea_param == 0.0 {
                1.0
            } else {
                s.abs().powf(gsea_param)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Explicit walk over every position, for comparison.
    fn naive_es(weights: &[f64], hits: &[usize]) -> f64 {
        let n = weights.len();
        let k = hits.len();
        let total: f64 = hits.iter().map(|&h| weights[h]).sum();
        let mut running = 0.0f64;
        let mut max = 0.0f64;
        let mut min = 0.0f64;
        for (i, w) in weights.iter().enumerate() {
            if hits.contains(&i) {
                running += w / total;
            } else {
                running -= 1.0 / (n - k) as f64;
            }
            max = max.max(running);
            min = min.min(running);
        }
        if max > -min { max } else { min }
    }

    #[test]
    fn test_top_hits_give_maximal_score() {
        let weights = hit_weights(&[5.0, 4.0, 3.0, -2.0, -3.0], 1.0);
        let sum = running_sum(&weights, &[0, 1, 2]);
        assert_relative_eq!(sum.es, 1.0, epsilon = 1e-12);
        assert_eq!(sum.leading_edge(&[0, 1, 2]), &[0, 1, 2]);
    }

    #[test]
    fn test_bottom_hits_give_negative_score() {
        let weights = hit_weights(&[5.0, 4.0, 3.0, -2.0, -3.0], 1.0);
        let sum = running_sum(&weights, &[3, 4]);
        assert_relative_eq!(sum.es, -1.0, epsilon = 1e-12);
        assert_eq!(sum.leading_edge(&[3, 4]), &[3, 4]);
    }

    #[test]
    fn test_matches_naive_walk() {
        let scores = [3.2, 2.5, 2.5, 1.1, 0.4, 0.0, -0.3, -1.7, -2.2, -4.0];
        let weights = hit_weights(&scores, 1.0);
        for hits in [vec![0, 4, 9], vec![1, 2, 3], vec![5, 7, 8], vec![0, 9], vec![6]] {
            let fast = running_sum(&weights, &hits).es;
            assert_relative_eq!(fast, naive_es(&weights, &hits), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_weights_use_uniform_increment() {
        let weights = hit_weights(&[0.0; 6], 1.0);
        let sum = running_sum(&weights, &[0, 1, 2]);
        assert_relative_eq!(sum.es, 1.0, epsilon = 1e-12);
        assert!(sum.es.is_finite());
    }

    #[test]
    fn test_symmetric_extremes_cancel() {
        // hit in the middle of an even walk: +1/2 peak vs -1/2 trough
        let weights = vec![1.0; 3];
        let sum = running_sum(&weights, &[1]);
        assert_relative_eq!(sum.es, 0.0);
        assert!(sum.leading_edge(&[1]).is_empty());
    }

    #[test]
    fn test_unweighted_param() {
        assert_eq!(hit_weights(&[5.0, -2.0], 0.0), vec![1.0, 1.0]);
        assert_eq!(hit_weights(&[5.0, -2.0], 1.0), vec![5.0, 2.0]);
    }
}
