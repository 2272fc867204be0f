/// Pseudo-count added to both means before taking the fold change ratio.
pub const DEFAULT_PSEUDO_COUNT: f64 = 1e-9;

/// Log2 fold change of group 1 over group 2 from their means.
pub fn log2_fold_change(mean1: f64, mean2: f64, pseudo_count: f64) -> anyhow::Result<f64> {
    if pseudo_count <= 0.0 {
        return Err(anyhow::anyhow!(
            "Pseudo count must be positive, got {}",
            pseudo_count
        ));
    }
    if mean1 < 0.0 || mean2 < 0.0 {
        return Err(anyhow::anyhow!(
            "Fold change requires non-negative means, got {} and {}",
            mean1,
            mean2
        ));
    }
    Ok(((mean1 + pseudo_count) / (mean2 + pseudo_count)).log2())
}

/// Contrast of group 1 over group 2 from group sums and sizes.
///
/// Returns the log2 fold change of the means when both are non-negative (counts or
/// log-normalized data), and the plain difference of means otherwise, as happens on
/// scaled or centered data where a ratio has no meaning.
pub fn mean_contrast_from_sums(
    sum1: f64,
    n1: usize,
    sum2: f64,
    n2: usize,
    pseudo_count: f64,
) -> anyhow::Result<f64> {
    if n1 == 0 || n2 == 0 {
        return Err(anyhow::anyhow!("Group sizes cannot be zero"));
    }
    let mean1 = sum1 / n1 as f64;
    let mean2 = sum2 / n2 as f64;
    if mean1 < 0.0 || mean2 < 0.0 {
        return Ok(mean1 - mean2);
    }
    log2_fold_change(mean1, mean2, pseudo_count)
}
