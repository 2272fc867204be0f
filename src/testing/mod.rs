//! Two-sample tests, effect sizes and multiple testing correction.
//!
//! These back the one-vs-rest rank builder and the p-value adjustment of the
//! enrichment engine.

pub mod correction;
pub mod effect;
pub mod inference;
pub mod utils;

/// Variance assumption of the two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TTestType {
    /// Pooled variance.
    Student,
    /// Separate variances, Welch-Satterthwaite degrees of freedom.
    Welch,
}

/// Alternative hypothesis, stated for the first sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    Less,
    Greater,
}

/// Outcome of one two-sample test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
    /// Test-specific values such as degrees of freedom, standard error or a z-score.
    extras: Vec<(&'static str, f64)>,
}

impl TestResult {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        TestResult {
            statistic,
            p_value,
            extras: Vec::new(),
        }
    }

    /// Attach a named value, replacing an earlier one with the same name.
    pub fn with_extra(mut self, key: &'static str, value: f64) -> Self {
        self.extras.retain(|(k, _)| *k != key);
        self.extras.push((key, value));
        self
    }

    pub fn extra(&self, key: &str) -> Option<f64> {
        self.extras.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}
