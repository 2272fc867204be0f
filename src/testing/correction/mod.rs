//! Multiple testing correction, applied over the pathways tested for one cluster.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Correction applied to the raw enrichment p-values of a single cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    /// Benjamini-Hochberg false discovery rate.
    #[default]
    BenjaminiHochberg,
    /// Benjamini-Yekutieli false discovery rate under arbitrary dependence.
    BenjaminiYekutieli,
    /// Bonferroni family-wise error rate.
    Bonferroni,
    /// Holm step-down family-wise error rate.
    Holm,
}

impl CorrectionMethod {
    pub fn adjust(&self, p_values: &[f64]) -> Result<Vec<f64>> {
        match self {
            CorrectionMethod::BenjaminiHochberg => benjamini_hochberg_correction(p_values),
            CorrectionMethod::BenjaminiYekutieli => benjamini_yekutieli_correction(p_values),
            CorrectionMethod::Bonferroni => bonferroni_correction(p_values),
            CorrectionMethod::Holm => holm_bonferroni_correction(p_values),
        }
    }
}

fn validate(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

/// Indices of `p_values` in ascending p-value order.
fn ascending_order(p_values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p_values.len()).collect();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Step-up adjustment shared by BH and BY: `p * n * factor / rank`, made monotone
/// from the largest p-value down.
fn step_up(p_values: &[f64], factor: f64) -> Vec<f64> {
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted = vec![0.0; n];
    let mut current_min: f64 = 1.0;
    for (i, &orig_idx) in order.iter().enumerate().rev() {
        let rank = (i + 1) as f64;
        let adjustment = (p_values[orig_idx] * n as f64 * factor / rank).min(1.0);
        current_min = current_min.min(adjustment);
        adjusted[orig_idx] = current_min;
    }
    adjusted
}

/// Bonferroni: multiply each p-value by the number of tests, capped at 1.
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Benjamini-Hochberg step-up procedure controlling the false discovery rate.
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    Ok(step_up(p_values, 1.0))
}

/// Benjamini-Yekutieli: BH scaled by the harmonic number of the test count.
pub fn benjamini_yekutieli_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let c_n: f64 = (1..=p_values.len()).map(|i| 1.0 / i as f64).sum();
    Ok(step_up(p_values, c_n))
}

/// Holm step-down: `p_(i) * (n - i)`, made monotone from the smallest p-value up.
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted = vec![0.0; n];
    let mut current_max: f64 = 0.0;
    for (i, &orig_idx) in order.iter().enumerate() {
        let adjustment = (p_values[orig_idx] * (n - i) as f64).min(1.0);
        current_max = current_max.max(adjustment);
        adjusted[orig_idx] = current_max;
    }
    Ok(adjusted)
}
