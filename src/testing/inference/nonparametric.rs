use crate::testing::{Alternative, TestResult};
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

/// Mann-Whitney U test with tie-corrected normal approximation.
///
/// The returned statistic is `U` for `x`; the signed z-score (positive when `x` tends
/// to be larger than `y`) is stored under the `"z_score"` metadata key.
pub fn mann_whitney(x: &[f64], y: &[f64], alternative: Alternative) -> TestResult {
    let nx = x.len();
    let ny = y.len();

    if nx == 0 || ny == 0 {
        return TestResult::new(f64::NAN, 1.0).with_extra("z_score", 0.0);
    }

    // Combine samples and assign group labels (0 for x, 1 for y)
    let mut combined: Vec<(f64, usize)> = Vec::with_capacity(nx + ny);
    combined.extend(x.iter().map(|&v| (v, 0)));
    combined.extend(y.iter().map(|&v| (v, 1)));
    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    // Average ranks over ties, collecting the tie correction term as we go
    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < combined.len() {
        let mut j = i + 1;
        while j < combined.len() && combined[j].0 == combined[i].0 {
            j += 1;
        }
        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        let tied = (j - i) as f64;
        tie_term += tied * tied * tied - tied;
        rank_sum_x += combined[i..j].iter().filter(|(_, g)| *g == 0).count() as f64 * rank;
        i = j;
    }

    let n = (nx + ny) as f64;
    let nxy = (nx * ny) as f64;
    let u_x = rank_sum_x - (nx * (nx + 1)) as f64 / 2.0;

    let mean_u = nxy / 2.0;
    let var_u = nxy / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)).max(1.0));

    if var_u <= 0.0 {
        return TestResult::new(u_x, 1.0).with_extra("z_score", 0.0);
    }
    let sd_u = var_u.sqrt();

    // Continuity correction towards the mean
    let diff = u_x - mean_u;
    let z = if diff.abs() <= 0.5 {
        0.0
    } else {
        (diff - 0.5 * diff.signum()) / sd_u
    };

    let p_value = Normal::new(0.0, 1.0)
        .map(|normal| match alternative {
            Alternative::TwoSided => (2.0 * normal.sf(z.abs())).min(1.0),
            Alternative::Greater => normal.sf(z),
            Alternative::Less => normal.cdf(z),
        })
        .unwrap_or(1.0);

    TestResult::new(u_x, p_value)
        .with_extra("std_err", sd_u)
        .with_extra("z_score", z)
        .with_extra("mean_u", mean_u)
        .with_extra("var_u", var_u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_separated_samples() {
        let result = mann_whitney(&[4.0, 5.0, 6.0, 7.0], &[1.0, 2.0, 3.0], Alternative::TwoSided);
        assert_relative_eq!(result.statistic, 12.0);
        assert!(result.extra("z_score").unwrap() > 0.0);
        // |z| = (6 - 0.5) / sqrt(8) = 1.9445
        assert_relative_eq!(result.p_value, 0.05183, epsilon = 1e-4);
    }

    #[test]
    fn test_direction_of_z() {
        let up = mann_whitney(&[1.0, 2.0], &[5.0, 6.0, 7.0], Alternative::TwoSided);
        assert!(up.extra("z_score").unwrap() < 0.0);
        let greater = mann_whitney(&[1.0, 2.0], &[5.0, 6.0, 7.0], Alternative::Greater);
        assert!(greater.p_value > 0.5);
    }

    #[test]
    fn test_all_tied() {
        let result = mann_whitney(&[0.0, 0.0], &[0.0, 0.0, 0.0], Alternative::TwoSided);
        assert_relative_eq!(result.p_value, 1.0);
        assert_relative_eq!(result.extra("z_score").unwrap(), 0.0);
    }

    #[test]
    fn test_empty_sample() {
        let result = mann_whitney(&[], &[1.0], Alternative::TwoSided);
        assert!(result.statistic.is_nan());
        assert_relative_eq!(result.p_value, 1.0);
    }
}
